//! # Types Module
//!
//! Shared data types used across the crate.
//!
//! ## Responsibilities
//! - **Color**: RGBA color representation, tweenable for keyframes.
//! - **Modes**: Blend, mask, line-cap, anchor and drawing modes set globally on a session.
//! - **PathShape**: Vertex/tangent path value written into path properties.
//!
//! ## Key Types
//! - `Color`: Float-based RGBA color (0.0 - 1.0).
//! - `AnchorMode`: 3×3 bounding-box grid selector (1 = top-left … 9 = bottom-right).
//! - `DrawMode` / `BeginMode`: `begin_shape` modes, with the inactive build split out.

use keyframe::CanTween;
use kurbo::{BezPath, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Represents a RGBA color in float format (0.0 - 1.0).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.r as f64, self.g as f64, self.b as f64, self.a as f64]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl CanTween for Color {
    fn ease(from: Self, to: Self, time: impl keyframe::num_traits::Float) -> Self {
        let t = time.to_f64().unwrap_or(0.0) as f32;
        Self {
            r: from.r + (to.r - from.r) * t,
            g: from.g + (to.g - from.g) * t,
            b: from.b + (to.b - from.b) * t,
            a: from.a + (to.a - from.a) * t,
        }
    }
}

/// Layer compositing mode applied to every layer built after it is set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Dissolve,
    Add,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    HardLight,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    LinearBurn,
    LinearDodge,
    Difference,
    Exclusion,
    Subtract,
    Divide,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Parses a script-facing blend mode name (`"multiply"`, `"color-dodge"`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        let mode = match name {
            "normal" => BlendMode::Normal,
            "dissolve" => BlendMode::Dissolve,
            "add" | "plus" => BlendMode::Add,
            "multiply" => BlendMode::Multiply,
            "screen" => BlendMode::Screen,
            "overlay" => BlendMode::Overlay,
            "soft_light" | "soft-light" => BlendMode::SoftLight,
            "hard_light" | "hard-light" => BlendMode::HardLight,
            "darken" => BlendMode::Darken,
            "lighten" => BlendMode::Lighten,
            "color_dodge" | "color-dodge" => BlendMode::ColorDodge,
            "color_burn" | "color-burn" => BlendMode::ColorBurn,
            "linear_burn" | "linear-burn" => BlendMode::LinearBurn,
            "linear_dodge" | "linear-dodge" => BlendMode::LinearDodge,
            "difference" => BlendMode::Difference,
            "exclusion" => BlendMode::Exclusion,
            "subtract" => BlendMode::Subtract,
            "divide" => BlendMode::Divide,
            "hue" => BlendMode::Hue,
            "saturation" => BlendMode::Saturation,
            "color" => BlendMode::Color,
            "luminosity" => BlendMode::Luminosity,
            _ => return None,
        };
        Some(mode)
    }
}

/// How a mask combines with the masks above it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    None,
    #[default]
    Add,
    Subtract,
    Intersect,
    Lighten,
    Darken,
    Difference,
}

impl MaskMode {
    pub fn parse(name: &str) -> Option<Self> {
        let mode = match name {
            "none" => MaskMode::None,
            "add" => MaskMode::Add,
            "subtract" => MaskMode::Subtract,
            "intersect" => MaskMode::Intersect,
            "lighten" => MaskMode::Lighten,
            "darken" => MaskMode::Darken,
            "difference" => MaskMode::Difference,
            _ => return None,
        };
        Some(mode)
    }
}

/// Stroke end cap.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Projecting,
}

impl LineCap {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "butt" => Some(LineCap::Butt),
            "round" => Some(LineCap::Round),
            "projecting" | "square" => Some(LineCap::Projecting),
            _ => None,
        }
    }

    /// Numeric code stored in the stroke's `linecap` property.
    pub fn code(self) -> f64 {
        match self {
            LineCap::Butt => 1.0,
            LineCap::Round => 2.0,
            LineCap::Projecting => 3.0,
        }
    }
}

/// Anchor point target on a layer's bounding box.
///
/// ```text
/// 1-------2-------3
/// 4-------5-------6
/// 7-------8-------9
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorMode(u8);

impl AnchorMode {
    pub const TOP_LEFT: AnchorMode = AnchorMode(1);
    pub const TOP: AnchorMode = AnchorMode(2);
    pub const TOP_RIGHT: AnchorMode = AnchorMode(3);
    pub const LEFT: AnchorMode = AnchorMode(4);
    pub const CENTER: AnchorMode = AnchorMode(5);
    pub const RIGHT: AnchorMode = AnchorMode(6);
    pub const BOTTOM_LEFT: AnchorMode = AnchorMode(7);
    pub const BOTTOM: AnchorMode = AnchorMode(8);
    pub const BOTTOM_RIGHT: AnchorMode = AnchorMode(9);

    /// Returns `None` outside `1..=9`.
    pub fn from_index(index: i64) -> Option<Self> {
        (1..=9).contains(&index).then(|| AnchorMode(index as u8))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Fractions of the bounding box width and height the anchor sits at.
    pub fn fractions(self) -> (f64, f64) {
        let i = self.0 - 1;
        ((i % 3) as f64 / 2.0, (i / 3) as f64 / 2.0)
    }
}

impl Default for AnchorMode {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Topology used by `end_shape` to turn the recorded vertices into paths.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// One multi-vertex path.
    #[default]
    Freeform,
    /// Consecutive vertex pairs.
    Lines,
    /// Consecutive groups of four vertices.
    Quads,
    /// Consecutive groups of three vertices.
    Triangles,
}

impl DrawMode {
    /// Script-facing codes: 0 freeform, 1 lines, 2 quads, 3 triangles.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DrawMode::Freeform),
            1 => Some(DrawMode::Lines),
            2 => Some(DrawMode::Quads),
            3 => Some(DrawMode::Triangles),
            _ => None,
        }
    }

    /// Vertices per sub-shape; `None` for freeform.
    pub fn group_size(self) -> Option<usize> {
        match self {
            DrawMode::Freeform => None,
            DrawMode::Lines => Some(2),
            DrawMode::Quads => Some(4),
            DrawMode::Triangles => Some(3),
        }
    }
}

/// Argument of `begin_shape`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BeginMode {
    /// Start recording vertices for the given topology.
    Draw(DrawMode),
    /// Record a freeform path whose layer is created disabled.
    Inactive,
}

impl Default for BeginMode {
    fn default() -> Self {
        BeginMode::Draw(DrawMode::Freeform)
    }
}

/// A vector path: vertices plus tangents relative to each vertex.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathShape {
    pub vertices: Vec<Point>,
    #[serde(default)]
    pub in_tangents: Vec<Vec2>,
    #[serde(default)]
    pub out_tangents: Vec<Vec2>,
    #[serde(default)]
    pub closed: bool,
}

impl PathShape {
    pub fn new(vertices: Vec<Point>, closed: bool) -> Self {
        Self {
            vertices,
            in_tangents: Vec::new(),
            out_tangents: Vec::new(),
            closed,
        }
    }

    pub fn with_tangents(mut self, in_tangents: Vec<Vec2>, out_tangents: Vec<Vec2>) -> Self {
        self.in_tangents = in_tangents;
        self.out_tangents = out_tangents;
        self
    }

    /// Returns a copy with every vertex offset by `delta`. Tangents are relative and stay put.
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            vertices: self.vertices.iter().map(|p| *p + delta).collect(),
            ..self.clone()
        }
    }

    fn tangent(list: &[Vec2], i: usize) -> Vec2 {
        list.get(i).copied().unwrap_or(Vec2::ZERO)
    }

    /// Builds the cubic path through the vertices; segments without tangents are straight.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.vertices.first() else {
            return path;
        };
        path.move_to(*first);

        let n = self.vertices.len();
        let segments = if self.closed { n } else { n.saturating_sub(1) };
        for i in 0..segments {
            let j = (i + 1) % n;
            let p0 = self.vertices[i];
            let p1 = self.vertices[j];
            let out = Self::tangent(&self.out_tangents, i);
            let inn = Self::tangent(&self.in_tangents, j);
            if out == Vec2::ZERO && inn == Vec2::ZERO {
                path.line_to(p1);
            } else {
                path.curve_to(p0 + out, p1 + inn, p1);
            }
        }
        if self.closed {
            path.close_path();
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape;

    #[test]
    fn anchor_fractions_follow_grid() {
        assert_eq!(AnchorMode::TOP_LEFT.fractions(), (0.0, 0.0));
        assert_eq!(AnchorMode::CENTER.fractions(), (0.5, 0.5));
        assert_eq!(AnchorMode::TOP_RIGHT.fractions(), (1.0, 0.0));
        assert_eq!(AnchorMode::BOTTOM_LEFT.fractions(), (0.0, 1.0));
        assert_eq!(AnchorMode::BOTTOM_RIGHT.fractions(), (1.0, 1.0));
        assert!(AnchorMode::from_index(0).is_none());
        assert!(AnchorMode::from_index(10).is_none());
    }

    #[test]
    fn straight_path_bounds() {
        let path = PathShape::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 20.0),
            ],
            true,
        );
        let bounds = path.to_bez_path().bounding_box();
        assert_eq!(bounds.x0, 0.0);
        assert_eq!(bounds.x1, 10.0);
        assert_eq!(bounds.y1, 20.0);
    }

    #[test]
    fn translate_keeps_tangents() {
        let path = PathShape::new(vec![Point::new(1.0, 1.0)], false)
            .with_tangents(vec![Vec2::new(2.0, 0.0)], vec![Vec2::new(-2.0, 0.0)]);
        let moved = path.translated(Vec2::new(5.0, 5.0));
        assert_eq!(moved.vertices[0], Point::new(6.0, 6.0));
        assert_eq!(moved.in_tangents, path.in_tangents);
    }

    #[test]
    fn blend_mode_names() {
        assert_eq!(BlendMode::parse("color-dodge"), Some(BlendMode::ColorDodge));
        assert_eq!(BlendMode::parse("plus"), Some(BlendMode::Add));
        assert_eq!(BlendMode::parse("bogus"), None);
    }
}
