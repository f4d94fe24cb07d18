use crate::errors::{SketchError, SketchResult};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Accumulated translate/scale/rotate state read by every constructor.
///
/// Scale is in percent, rotations in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformMatrix {
    pub position: DVec3,
    pub scale: DVec3,
    pub rotation: f64,
    pub rotation3d: DVec3,
}

impl Default for TransformMatrix {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            scale: DVec3::splat(100.0),
            rotation: 0.0,
            rotation3d: DVec3::ZERO,
        }
    }
}

impl TransformMatrix {
    pub fn translation(&self) -> DVec3 {
        self.position
    }
}

/// The current matrix plus the matrices saved by `push`.
#[derive(Clone, Debug, Default)]
pub struct TransformStack {
    current: TransformMatrix,
    saved: Vec<TransformMatrix>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &TransformMatrix {
        &self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restores the last pushed matrix. An empty stack leaves the current matrix untouched.
    pub fn pop(&mut self) -> SketchResult<()> {
        match self.saved.pop() {
            Some(matrix) => {
                self.current = matrix;
                Ok(())
            }
            None => Err(SketchError::state(
                "pop_matrix: missing matching push_matrix",
            )),
        }
    }

    /// Clears the saved matrices and restores the identity matrix.
    pub fn reset(&mut self) {
        self.saved.clear();
        self.current = TransformMatrix::default();
    }

    pub fn translate(&mut self, offset: DVec3) {
        self.current.position += offset;
    }

    /// Multiplies the current scale by `factors` (1.0 keeps an axis).
    pub fn scale(&mut self, factors: DVec3) {
        self.current.scale *= factors;
    }

    /// Adds to the 2D rotation.
    pub fn rotate(&mut self, degrees: f64) {
        self.current.rotation += degrees;
    }

    /// Adds component-wise to the 3D rotation.
    pub fn rotate3d(&mut self, degrees: DVec3) {
        self.current.rotation3d += degrees;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translations_accumulate() {
        let mut stack = TransformStack::new();
        stack.translate(DVec3::new(10.0, 0.0, 0.0));
        stack.translate(DVec3::new(20.0, 0.0, 0.0));
        assert_eq!(stack.current().translation(), DVec3::new(30.0, 0.0, 0.0));
    }

    #[test]
    fn push_pop_restores() {
        let mut stack = TransformStack::new();
        stack.push();
        stack.translate(DVec3::new(5.0, 0.0, 0.0));
        stack.rotate(45.0);
        stack.pop().unwrap();
        assert_eq!(*stack.current(), TransformMatrix::default());
    }

    #[test]
    fn pop_on_empty_stack_fails_and_keeps_matrix() {
        let mut stack = TransformStack::new();
        stack.translate(DVec3::new(1.0, 2.0, 0.0));
        let before = *stack.current();
        assert!(matches!(stack.pop(), Err(SketchError::State(_))));
        assert_eq!(*stack.current(), before);
    }

    #[test]
    fn scale_is_multiplicative_and_reset_is_identity() {
        let mut stack = TransformStack::new();
        stack.scale(DVec3::new(2.0, 2.0, 1.0));
        stack.scale(DVec3::new(0.5, 1.0, 1.0));
        assert_eq!(stack.current().scale, DVec3::new(100.0, 200.0, 100.0));
        stack.push();
        stack.reset();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current().scale, DVec3::splat(100.0));
    }
}
