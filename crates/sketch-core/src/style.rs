//! # Style Module
//!
//! Fill/stroke state consumed by the shape constructors.
//!
//! ## Responsibilities
//! - **StyleStack**: the live style plus the history of snapshots pushed by every
//!   style setter, replayed one per group by grouped builds.
//! - **Color parsing**: 1–4 component colors with 0–1 / 0–255 range detection,
//!   HSB conversion and hex strings.

use crate::types::Color;
use serde::{Deserialize, Serialize};

/// Immutable copy of the full style taken when a style setter runs.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleSnapshot {
    pub fill_enabled: bool,
    pub fill_color: Color,
    pub stroke_enabled: bool,
    pub stroke_color: Color,
    pub stroke_weight: f64,
}

impl Default for StyleSnapshot {
    fn default() -> Self {
        Self {
            fill_enabled: true,
            fill_color: Color::WHITE,
            stroke_enabled: true,
            stroke_color: Color::WHITE,
            stroke_weight: 1.0,
        }
    }
}

/// The current style and the snapshots pushed since the last reset.
#[derive(Clone, Debug, Default)]
pub struct StyleStack {
    current: StyleSnapshot,
    history: Vec<StyleSnapshot>,
}

impl StyleStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self) {
        self.history.push(self.current);
    }

    pub fn set_fill(&mut self, color: Color) {
        self.current.fill_enabled = true;
        self.current.fill_color = color;
        self.push();
    }

    pub fn set_stroke(&mut self, color: Color) {
        self.current.stroke_enabled = true;
        self.current.stroke_color = color;
        self.push();
    }

    pub fn set_no_fill(&mut self) {
        self.current.fill_enabled = false;
        self.push();
    }

    pub fn set_no_stroke(&mut self) {
        self.current.stroke_enabled = false;
        self.push();
    }

    pub fn set_stroke_weight(&mut self, weight: f64) {
        self.current.stroke_weight = weight;
        self.push();
    }

    /// The live style used by single-shape constructors.
    pub fn current(&self) -> &StyleSnapshot {
        &self.current
    }

    /// Snapshot `index`, else the last pushed one, else the live style.
    pub fn snapshot_at(&self, index: usize) -> StyleSnapshot {
        self.history
            .get(index)
            .or_else(|| self.history.last())
            .copied()
            .unwrap_or(self.current)
    }

    /// Clears the snapshot history. The live style is kept.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Back to the session defaults: history cleared, live style white fill and stroke.
    pub fn restore_defaults(&mut self) {
        self.current = StyleSnapshot::default();
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// A parsed color. Two and four component forms also carry an opacity (0–100).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParsedColor {
    pub color: Color,
    pub opacity: Option<f64>,
}

/// Parses a 1 (gray), 2 (gray, alpha), 3 (rgb) or 4 (rgb, alpha) component color.
///
/// Channels are clamped to 0–255 and alpha to 0–100. If any color channel exceeds 1
/// the channels are read as 0–255 and alpha as 0–100, otherwise both are unit values.
/// Returns `None` for any other component count.
pub fn parse_color(components: &[f64]) -> Option<ParsedColor> {
    let channel = |i: usize| components.get(i).copied().unwrap_or(0.0).clamp(0.0, 255.0);
    let alpha = |i: usize| components.get(i).copied().unwrap_or(0.0).clamp(0.0, 100.0);

    let (rgb, opacity) = match components.len() {
        1 => ([channel(0); 3], None),
        2 => ([channel(0); 3], Some(alpha(1))),
        3 => ([channel(0), channel(1), channel(2)], None),
        4 => ([channel(0), channel(1), channel(2)], Some(alpha(3))),
        _ => return None,
    };

    let wide = rgb.iter().any(|c| *c > 1.0);
    let (rgb, opacity) = if wide {
        (rgb.map(|c| c / 255.0), opacity)
    } else {
        (rgb, opacity.map(|a| a * 100.0))
    };

    Some(ParsedColor {
        color: Color::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32, 1.0),
        opacity,
    })
}

/// HSB(A) → RGB. Hue above 1 is read as degrees, saturation/brightness/alpha above 1
/// as percentages.
pub fn to_rgba(hue: f64, saturation: f64, brightness: f64, alpha: Option<f64>) -> ParsedColor {
    let unit = |v: f64, range: f64| if v > 1.0 { v / range } else { v };
    let h = unit(hue, 360.0) * 6.0;
    let s = unit(saturation, 100.0);
    let v = unit(brightness, 100.0);

    let (r, g, b) = if s == 0.0 {
        (v, v, v)
    } else {
        let sector = h.floor();
        let tint1 = v * (1.0 - s);
        let tint2 = v * (1.0 - s * (h - sector));
        let tint3 = v * (1.0 - s * (1.0 + sector - h));
        match sector as i64 {
            1 => (tint2, v, tint1),
            2 => (tint1, v, tint3),
            3 => (tint1, tint2, v),
            4 => (tint3, tint1, v),
            5 => (v, tint1, tint2),
            _ => (v, tint3, tint1),
        }
    };

    let parsed = match alpha {
        Some(a) => parse_color(&[r, g, b, unit(a, 100.0)]),
        None => parse_color(&[r, g, b]),
    };
    parsed.unwrap_or(ParsedColor {
        color: Color::WHITE,
        opacity: None,
    })
}

/// Parses `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_string(),
        _ => return None,
    };
    let byte = |i: usize| {
        expanded
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| v as f32 / 255.0)
    };
    let a = if expanded.len() == 8 { byte(6)? } else { 1.0 };
    Some(Color::new(byte(0)?, byte(2)?, byte(4)?, a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color {
        Color::new(1.0, 0.0, 0.0, 1.0)
    }

    fn blue() -> Color {
        Color::new(0.0, 0.0, 1.0, 1.0)
    }

    #[test]
    fn setters_push_whole_style() {
        let mut stack = StyleStack::new();
        stack.set_fill(red());
        stack.set_stroke_weight(4.0);
        assert_eq!(stack.len(), 2);
        let second = stack.snapshot_at(1);
        assert_eq!(second.fill_color, red());
        assert_eq!(second.stroke_weight, 4.0);
        assert!(stack.snapshot_at(0).stroke_weight == 1.0);
    }

    #[test]
    fn snapshot_overrun_reuses_last() {
        let mut stack = StyleStack::new();
        assert_eq!(stack.snapshot_at(3), StyleSnapshot::default());
        stack.set_fill(red());
        stack.set_fill(blue());
        assert_eq!(stack.snapshot_at(0).fill_color, red());
        assert_eq!(stack.snapshot_at(1).fill_color, blue());
        assert_eq!(stack.snapshot_at(2).fill_color, blue());
    }

    #[test]
    fn reset_keeps_live_style() {
        let mut stack = StyleStack::new();
        stack.set_no_fill();
        stack.reset();
        stack.reset();
        assert!(stack.is_empty());
        assert!(!stack.current().fill_enabled);
        stack.restore_defaults();
        assert!(stack.current().fill_enabled);
    }

    #[test]
    fn color_range_detection() {
        let wide = parse_color(&[255.0, 0.0, 0.0]).unwrap();
        assert_eq!(wide.color, red());
        assert_eq!(wide.opacity, None);

        let unit = parse_color(&[0.5]).unwrap();
        assert_eq!(unit.color, Color::new(0.5, 0.5, 0.5, 1.0));

        let clamped = parse_color(&[400.0, -3.0, 0.0, 250.0]).unwrap();
        assert_eq!(clamped.color, red());
        assert_eq!(clamped.opacity, Some(100.0));
    }

    #[test]
    fn alpha_forms_set_opacity() {
        assert_eq!(parse_color(&[1.0, 0.5]).unwrap().opacity, Some(50.0));
        assert_eq!(parse_color(&[128.0, 40.0]).unwrap().opacity, Some(40.0));
        assert!(parse_color(&[]).is_none());
        assert!(parse_color(&[1.0, 1.0, 1.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn hsb_primaries() {
        assert_eq!(to_rgba(0.0, 100.0, 100.0, None).color, red());
        let green = to_rgba(120.0, 100.0, 100.0, None).color;
        assert!((green.g - 1.0).abs() < 1e-6 && green.r.abs() < 1e-6);
        let gray = to_rgba(200.0, 0.0, 50.0, Some(50.0));
        assert_eq!(gray.color, Color::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(gray.opacity, Some(50.0));
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#ff0000"), Some(red()));
        assert_eq!(parse_hex_color("#00f"), Some(blue()));
        assert_eq!(parse_hex_color("#12"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }
}
