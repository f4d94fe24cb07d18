//! # Scripting Utilities
//!
//! Conversions between Rhai values and session types.
//!
//! ## Responsibilities
//! - **Numbers**: `num`/`nums` accept both script integers and floats.
//! - **Geometry**: `points`/`vectors` read `[[x, y], ...]` arrays.
//! - **Values**: `to_dynamic`/`from_dynamic` map `PropertyValue` to and from
//!   numbers, arrays and path maps.
//! - **Colors**: `color_components` accepts numbers or a hex string.

use crate::animation::PropertyValue;
use crate::errors::SketchError;
use crate::style::parse_hex_color;
use crate::types::PathShape;
use kurbo::{Point, Vec2};
use rhai::{Array, Dynamic, EvalAltResult, Map};

pub type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

/// Surfaces a session error inside the script.
pub fn script_err(e: SketchError) -> Box<EvalAltResult> {
    e.to_string().into()
}

pub fn num(value: &Dynamic) -> ScriptResult<f64> {
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f64);
    }
    Err(format!("expected a number, got {}", value.type_name()).into())
}

pub fn nums(values: &[Dynamic]) -> ScriptResult<Vec<f64>> {
    values.iter().map(num).collect()
}

fn pair(value: &Dynamic) -> ScriptResult<(f64, f64)> {
    let items = value
        .clone()
        .into_array()
        .map_err(|t| format!("expected an [x, y] array, got {}", t))?;
    match items.as_slice() {
        [x, y, ..] => Ok((num(x)?, num(y)?)),
        _ => Err("expected an [x, y] array with two numbers".into()),
    }
}

pub fn points(values: &Array) -> ScriptResult<Vec<Point>> {
    values
        .iter()
        .map(|v| pair(v).map(|(x, y)| Point::new(x, y)))
        .collect()
}

pub fn vectors(values: &Array) -> ScriptResult<Vec<Vec2>> {
    values
        .iter()
        .map(|v| pair(v).map(|(x, y)| Vec2::new(x, y)))
        .collect()
}

fn pairs<T: Copy>(items: &[T], f: impl Fn(T) -> (f64, f64)) -> Dynamic {
    let array: Array = items
        .iter()
        .map(|&item| {
            let (x, y) = f(item);
            Dynamic::from_array(vec![Dynamic::from_float(x), Dynamic::from_float(y)])
        })
        .collect();
    Dynamic::from_array(array)
}

/// Scalars become numbers, vectors and colors arrays, paths maps.
pub fn to_dynamic(value: &PropertyValue) -> Dynamic {
    match value {
        PropertyValue::Scalar(v) => Dynamic::from_float(*v),
        PropertyValue::Vector(v) => {
            Dynamic::from_array(v.iter().map(|c| Dynamic::from_float(*c)).collect())
        }
        PropertyValue::Color(c) => Dynamic::from_array(
            c.to_array()
                .iter()
                .map(|c| Dynamic::from_float(*c))
                .collect(),
        ),
        PropertyValue::Path(path) => {
            let mut map = Map::new();
            map.insert("vertices".into(), pairs(&path.vertices, |p| (p.x, p.y)));
            map.insert("in_tangents".into(), pairs(&path.in_tangents, |v| (v.x, v.y)));
            map.insert("out_tangents".into(), pairs(&path.out_tangents, |v| (v.x, v.y)));
            map.insert("closed".into(), Dynamic::from_bool(path.closed));
            Dynamic::from_map(map)
        }
    }
}

/// Inverse of `to_dynamic`; colors are written as vectors.
pub fn from_dynamic(value: Dynamic) -> ScriptResult<PropertyValue> {
    if value.is_array() {
        let items = value.into_array().map_err(|t| t.to_string())?;
        return Ok(PropertyValue::Vector(nums(&items)?));
    }
    if value.is_map() {
        let map = value.cast::<Map>();
        let list = |key: &str| -> ScriptResult<Array> {
            match map.get(key) {
                Some(v) => v.clone().into_array().map_err(|t| t.to_string().into()),
                None => Ok(Array::new()),
            }
        };
        let closed = map
            .get("closed")
            .and_then(|v| v.as_bool().ok())
            .unwrap_or(false);
        let path = PathShape::new(points(&list("vertices")?)?, closed).with_tangents(
            vectors(&list("in_tangents")?)?,
            vectors(&list("out_tangents")?)?,
        );
        return Ok(PropertyValue::Path(path));
    }
    Ok(PropertyValue::Scalar(num(&value)?))
}

/// Numeric components, or the unit channels of a `#RGB`/`#RRGGBB`/`#RRGGBBAA`
/// string. Alpha is only passed on when the string carries one below full.
pub fn color_components(values: &[Dynamic]) -> ScriptResult<Vec<f64>> {
    if let [single] = values {
        if single.is_string() {
            let text = single.clone().into_string().map_err(|t| t.to_string())?;
            let color = parse_hex_color(&text)
                .ok_or_else(|| format!("'{}' is not a hex color", text))?;
            let mut channels: Vec<f64> = color.to_array().to_vec();
            if color.a >= 1.0 {
                channels.truncate(3);
            }
            return Ok(channels);
        }
    }
    nums(values)
}
