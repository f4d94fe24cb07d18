use crate::types::{Color, PathShape};
use keyframe::{AnimationSequence, CanTween, EasingFunction, Keyframe};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Supported easing functions for keyframes.
///
/// The easing of a keyframe governs the interpolation from that keyframe to the next.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Keep the value until the next keyframe.
    Hold,
}

impl EasingFunction for EasingType {
    fn y(&self, x: f64) -> f64 {
        match self {
            EasingType::Linear => keyframe::functions::Linear.y(x),
            EasingType::EaseIn => keyframe::functions::EaseIn.y(x),
            EasingType::EaseOut => keyframe::functions::EaseOut.y(x),
            EasingType::EaseInOut => keyframe::functions::EaseInOut.y(x),
            EasingType::Hold => {
                if x < 1.0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }
}

impl EasingType {
    /// Parses a script-facing easing name; unknown names fall back to linear.
    pub fn parse(name: &str) -> Self {
        match name {
            "ease_in" | "easein" => EasingType::EaseIn,
            "ease_out" | "easeout" => EasingType::EaseOut,
            "ease_in_out" | "easeinout" | "bezier" => EasingType::EaseInOut,
            "hold" => EasingType::Hold,
            _ => EasingType::Linear,
        }
    }
}

/// The value held by an animatable property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum PropertyValue {
    Scalar(f64),
    /// 2 or 3 components (position, scale, size, anchor point ...).
    Vector(Vec<f64>),
    Color(Color),
    Path(PathShape),
}

impl Default for PropertyValue {
    fn default() -> Self {
        PropertyValue::Scalar(0.0)
    }
}

impl PropertyValue {
    pub fn vec2(x: f64, y: f64) -> Self {
        PropertyValue::Vector(vec![x, y])
    }

    pub fn vec3(x: f64, y: f64, z: f64) -> Self {
        PropertyValue::Vector(vec![x, y, z])
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Scalar(_) => "scalar",
            PropertyValue::Vector(_) => "vector",
            PropertyValue::Color(_) => "color",
            PropertyValue::Path(_) => "path",
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PropertyValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            PropertyValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathShape> {
        match self {
            PropertyValue::Path(p) => Some(p),
            _ => None,
        }
    }

    /// Component `i` of a vector value (missing components read as 0).
    pub fn component(&self, i: usize) -> f64 {
        self.as_vector()
            .and_then(|v| v.get(i).copied())
            .unwrap_or(0.0)
    }

    /// Whether `other` can be written where `self` is stored.
    pub fn same_kind(&self, other: &PropertyValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl CanTween for PropertyValue {
    fn ease(from: Self, to: Self, time: impl keyframe::num_traits::Float) -> Self {
        let t = time.to_f64().unwrap_or(0.0);
        match (from, to) {
            (PropertyValue::Scalar(a), PropertyValue::Scalar(b)) => {
                PropertyValue::Scalar(lerp(a, b, t))
            }
            (PropertyValue::Vector(a), PropertyValue::Vector(b)) => {
                let len = a.len().min(b.len());
                PropertyValue::Vector((0..len).map(|i| lerp(a[i], b[i], t)).collect())
            }
            (PropertyValue::Color(a), PropertyValue::Color(b)) => {
                PropertyValue::Color(Color::ease(a, b, t))
            }
            (PropertyValue::Path(a), PropertyValue::Path(b))
                if a.vertices.len() == b.vertices.len() =>
            {
                let vertices = a
                    .vertices
                    .iter()
                    .zip(&b.vertices)
                    .map(|(p, q)| Point::new(lerp(p.x, q.x, t), lerp(p.y, q.y, t)))
                    .collect();
                PropertyValue::Path(PathShape { vertices, ..a })
            }
            // Mismatched shapes hold the starting value.
            (from, _) => from,
        }
    }
}

/// A keyframe recorded on a property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyKeyframe {
    /// Absolute composition time in seconds.
    pub time: f64,
    pub value: PropertyValue,
    #[serde(default)]
    pub easing: EasingType,
}

/// Inserts a keyframe keeping `keys` sorted by time; a keyframe at the same time is replaced.
pub fn insert_keyframe(keys: &mut Vec<PropertyKeyframe>, key: PropertyKeyframe) {
    match keys.iter().position(|k| k.time >= key.time) {
        Some(i) if (keys[i].time - key.time).abs() < f64::EPSILON => keys[i] = key,
        Some(i) => keys.insert(i, key),
        None => keys.push(key),
    }
}

/// Evaluates sorted keyframes at `time`. Before the first and after the last keyframe the
/// value is held.
pub fn evaluate(keys: &[PropertyKeyframe], time: f64) -> Option<PropertyValue> {
    let first = keys.first()?;
    let last = keys.last()?;
    if time <= first.time {
        return Some(first.value.clone());
    }
    if time >= last.time {
        return Some(last.value.clone());
    }

    let frames: Vec<Keyframe<PropertyValue>> = keys
        .iter()
        .map(|k| Keyframe::new(k.value.clone(), k.time, k.easing))
        .collect();
    let mut sequence = AnimationSequence::from(frames);
    sequence.advance_to(time);
    Some(sequence.now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(time: f64, value: f64) -> PropertyKeyframe {
        PropertyKeyframe {
            time,
            value: PropertyValue::Scalar(value),
            easing: EasingType::Linear,
        }
    }

    #[test]
    fn insert_keeps_order_and_replaces_same_time() {
        let mut keys = Vec::new();
        insert_keyframe(&mut keys, key(2.0, 20.0));
        insert_keyframe(&mut keys, key(0.0, 0.0));
        insert_keyframe(&mut keys, key(1.0, 10.0));
        insert_keyframe(&mut keys, key(1.0, 15.0));
        let times: Vec<f64> = keys.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(keys[1].value, PropertyValue::Scalar(15.0));
    }

    #[test]
    fn evaluate_holds_outside_range() {
        let keys = vec![key(1.0, 10.0), key(2.0, 20.0)];
        assert_eq!(evaluate(&keys, 0.0), Some(PropertyValue::Scalar(10.0)));
        assert_eq!(evaluate(&keys, 5.0), Some(PropertyValue::Scalar(20.0)));
        assert_eq!(evaluate(&[], 5.0), None);
    }

    #[test]
    fn evaluate_interpolates_vectors() {
        let keys = vec![
            PropertyKeyframe {
                time: 0.0,
                value: PropertyValue::vec2(0.0, 0.0),
                easing: EasingType::Linear,
            },
            PropertyKeyframe {
                time: 2.0,
                value: PropertyValue::vec2(10.0, 20.0),
                easing: EasingType::Linear,
            },
        ];
        let mid = evaluate(&keys, 1.0).unwrap();
        assert!((mid.component(0) - 5.0).abs() < 1e-6);
        assert!((mid.component(1) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_kinds_hold() {
        let eased = PropertyValue::ease(
            PropertyValue::Scalar(1.0),
            PropertyValue::vec2(2.0, 2.0),
            0.5_f64,
        );
        assert_eq!(eased, PropertyValue::Scalar(1.0));
    }
}
