//! # Properties API
//!
//! Exposes constructor results to Rhai scripts.
//!
//! ## Types
//! - **Properties** (`ShapeHandle`): `shape["position"]`, `has`, `names`,
//!   `enabled`, `set_enabled`
//! - **Property** (`PropertyHandle`): `value`, `value_at`, `set_value`,
//!   `add_keyframe`, `num_keys`, expressions
//!
//! ## Example
//! ```rhai
//! let r = b.rect(0, 0, 100, 50);
//! let position = r["position"];
//! position.add_keyframe(0.0, [0, 0]);
//! position.add_keyframe(1.0, [200, 0], "ease_out");
//! ```

use crate::animation::EasingType;
use crate::properties::{PropertyHandle, ShapeHandle};
use rhai::{Array, Dynamic, Engine};

use super::super::utils::{from_dynamic, num, script_err, to_dynamic, ScriptResult};

/// Register property-related Rhai functions.
pub fn register(engine: &mut Engine) {
    engine.register_type_with_name::<ShapeHandle>("Properties");
    engine.register_type_with_name::<PropertyHandle>("Property");

    engine.register_indexer_get(
        |shape: &mut ShapeHandle, name: &str| -> ScriptResult<PropertyHandle> {
            shape.require(name).cloned().map_err(script_err)
        },
    );
    engine.register_fn("has", |shape: &mut ShapeHandle, name: &str| {
        shape.contains(name)
    });
    engine.register_fn("names", |shape: &mut ShapeHandle| -> Array {
        shape.names().into_iter().map(Dynamic::from).collect()
    });
    engine.register_fn("len", |shape: &mut ShapeHandle| shape.len() as i64);
    engine.register_fn("enabled", |shape: &mut ShapeHandle| -> ScriptResult<bool> {
        shape.layer().enabled().map_err(script_err)
    });
    engine.register_fn(
        "set_enabled",
        |shape: &mut ShapeHandle, enabled: bool| -> ScriptResult<()> {
            shape.layer().set_enabled(enabled).map_err(script_err)
        },
    );

    engine.register_get("name", |prop: &mut PropertyHandle| prop.name.clone());
    engine.register_fn("value", |prop: &mut PropertyHandle| -> ScriptResult<Dynamic> {
        prop.value().map(|v| to_dynamic(&v)).map_err(script_err)
    });
    engine.register_fn(
        "value_at",
        |prop: &mut PropertyHandle, time: Dynamic| -> ScriptResult<Dynamic> {
            let time = num(&time)?;
            prop.value_at(time).map(|v| to_dynamic(&v)).map_err(script_err)
        },
    );
    engine.register_fn(
        "set_value",
        |prop: &mut PropertyHandle, value: Dynamic| -> ScriptResult<()> {
            let value = from_dynamic(value)?;
            prop.set_value(value).map_err(script_err)
        },
    );
    engine.register_fn(
        "add_keyframe",
        |prop: &mut PropertyHandle, time: Dynamic, value: Dynamic| -> ScriptResult<i64> {
            let time = num(&time)?;
            let value = from_dynamic(value)?;
            prop.add_keyframe(time, value)
                .map(|n| n as i64)
                .map_err(script_err)
        },
    );
    engine.register_fn(
        "add_keyframe",
        |prop: &mut PropertyHandle,
         time: Dynamic,
         value: Dynamic,
         easing: &str|
         -> ScriptResult<i64> {
            let time = num(&time)?;
            let value = from_dynamic(value)?;
            prop.add_keyframe_eased(time, value, EasingType::parse(easing))
                .map(|n| n as i64)
                .map_err(script_err)
        },
    );
    engine.register_fn("num_keys", |prop: &mut PropertyHandle| -> ScriptResult<i64> {
        prop.num_keys().map(|n| n as i64).map_err(script_err)
    });
    engine.register_fn(
        "set_expression",
        |prop: &mut PropertyHandle, expression: &str| -> ScriptResult<()> {
            prop.set_expression(expression).map_err(script_err)
        },
    );
    engine.register_fn(
        "clear_expression",
        |prop: &mut PropertyHandle| -> ScriptResult<()> {
            prop.clear_expression().map_err(script_err)
        },
    );
    engine.register_fn(
        "expression",
        |prop: &mut PropertyHandle| -> ScriptResult<Dynamic> {
            Ok(prop
                .expression()
                .map_err(script_err)?
                .map(Dynamic::from)
                .unwrap_or(Dynamic::UNIT))
        },
    );
}
