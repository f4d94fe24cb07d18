use crate::types::{BeginMode, DrawMode};
use kurbo::{Point, Vec2};

/// Everything recorded between `begin` and `finish`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recording {
    /// `None` when `finish` ran without a matching `begin`.
    pub mode: Option<DrawMode>,
    pub vertices: Vec<Point>,
    pub in_tangents: Vec<Vec2>,
    pub out_tangents: Vec<Vec2>,
    /// The inactive flag in effect for this build.
    pub inactive: bool,
}

impl Recording {
    /// Tangent buffers for a freeform path: both buffers when both were given, the
    /// in-tangents for both sides when only they were given, none otherwise.
    pub fn freeform_tangents(&self) -> Option<(Vec<Vec2>, Vec<Vec2>)> {
        match (self.in_tangents.is_empty(), self.out_tangents.is_empty()) {
            (false, false) => Some((self.in_tangents.clone(), self.out_tangents.clone())),
            (false, true) => Some((self.in_tangents.clone(), self.in_tangents.clone())),
            _ => None,
        }
    }
}

/// Idle → Recording → Idle buffer behind `begin_shape` / `end_shape` and
/// `begin_mask` / `end_mask`.
#[derive(Clone, Debug, Default)]
pub struct VertexRecorder {
    mode: Option<DrawMode>,
    vertices: Vec<Point>,
    in_tangents: Vec<Vec2>,
    out_tangents: Vec<Vec2>,
    inactive: bool,
}

impl VertexRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a recording, discarding anything still buffered. Returns the number of
    /// discarded vertices.
    ///
    /// `BeginMode::Inactive` records a freeform path with the inactive flag raised.
    pub fn begin(&mut self, mode: BeginMode) -> usize {
        let discarded = self.vertices.len();
        self.clear_buffers();
        match mode {
            BeginMode::Draw(mode) => {
                self.mode = Some(mode);
                self.inactive = false;
            }
            BeginMode::Inactive => {
                self.mode = Some(DrawMode::Freeform);
                self.inactive = true;
            }
        }
        discarded
    }

    /// Returns `false` (and records nothing) when idle.
    pub fn vertex(&mut self, point: Point) -> bool {
        if self.mode.is_none() {
            return false;
        }
        self.vertices.push(point);
        true
    }

    pub fn in_tangent(&mut self, tangent: Vec2) -> bool {
        if self.mode.is_none() {
            return false;
        }
        self.in_tangents.push(tangent);
        true
    }

    pub fn out_tangent(&mut self, tangent: Vec2) -> bool {
        if self.mode.is_none() {
            return false;
        }
        self.out_tangents.push(tangent);
        true
    }

    /// Hands out the buffers and returns to idle with the inactive flag cleared.
    pub fn finish(&mut self) -> Recording {
        let recording = Recording {
            mode: self.mode.take(),
            vertices: std::mem::take(&mut self.vertices),
            in_tangents: std::mem::take(&mut self.in_tangents),
            out_tangents: std::mem::take(&mut self.out_tangents),
            inactive: self.inactive,
        };
        self.inactive = false;
        recording
    }

    pub fn is_recording(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<DrawMode> {
        self.mode
    }

    pub fn is_inactive(&self) -> bool {
        self.inactive
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn clear_buffers(&mut self) {
        self.vertices.clear();
        self.in_tangents.clear();
        self.out_tangents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_only_while_recording() {
        let mut rec = VertexRecorder::new();
        assert!(!rec.vertex(Point::new(1.0, 1.0)));
        rec.begin(BeginMode::Draw(DrawMode::Lines));
        assert!(rec.vertex(Point::new(0.0, 0.0)));
        assert!(rec.vertex(Point::new(1.0, 0.0)));
        let out = rec.finish();
        assert_eq!(out.mode, Some(DrawMode::Lines));
        assert_eq!(out.vertices.len(), 2);
        assert!(rec.is_empty());
        assert!(!rec.is_recording());
    }

    #[test]
    fn reentrant_begin_discards() {
        let mut rec = VertexRecorder::new();
        rec.begin(BeginMode::default());
        rec.vertex(Point::new(0.0, 0.0));
        rec.in_tangent(Vec2::new(1.0, 0.0));
        assert_eq!(rec.begin(BeginMode::default()), 1);
        let out = rec.finish();
        assert!(out.vertices.is_empty());
        assert!(out.in_tangents.is_empty());
    }

    #[test]
    fn inactive_flag_lives_until_finish() {
        let mut rec = VertexRecorder::new();
        rec.begin(BeginMode::Inactive);
        assert!(rec.is_inactive());
        assert!(rec.is_recording());
        assert!(rec.vertex(Point::new(1.0, 1.0)));
        let out = rec.finish();
        assert!(out.inactive);
        assert_eq!(out.mode, Some(DrawMode::Freeform));
        assert_eq!(out.vertices.len(), 1);
        assert!(!rec.is_inactive());

        rec.begin(BeginMode::Inactive);
        rec.begin(BeginMode::default());
        assert!(!rec.is_inactive());
    }

    #[test]
    fn in_tangents_stand_in_for_missing_out_tangents() {
        let recording = Recording {
            mode: Some(DrawMode::Freeform),
            in_tangents: vec![Vec2::new(1.0, 2.0)],
            ..Default::default()
        };
        let (inn, out) = recording.freeform_tangents().unwrap();
        assert_eq!(inn, out);

        let only_out = Recording {
            out_tangents: vec![Vec2::new(1.0, 2.0)],
            ..Default::default()
        };
        assert!(only_out.freeform_tangents().is_none());
    }
}
