//! # Transform API
//!
//! Matrix stack functions for Rhai scripts.
//!
//! ## Functions
//! - `push_matrix()`, `pop_matrix()`, `reset_matrix()`
//! - `translate(x, y)`, `translate(x, y, z)`
//! - `scale(s)`, `scale(sx, sy)`, `scale(sx, sy, sz)`
//! - `rotate(deg)`; `rotate([x, y, z])` rotates about each axis

use rhai::{Array, Dynamic, Engine};

use super::super::types::SketchHandle;
use super::super::utils::{num, nums, script_err, ScriptResult};

fn translate(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<()> {
    let args = nums(args)?;
    b.lock()?.translate_args(&args).map_err(script_err)
}

fn scale(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<()> {
    let args = nums(args)?;
    b.lock()?.scale_args(&args).map_err(script_err)
}

/// Register transform-related Rhai functions.
pub fn register(engine: &mut Engine) {
    engine.register_fn("push_matrix", |b: &mut SketchHandle| -> ScriptResult<()> {
        b.lock()?.push_matrix();
        Ok(())
    });
    engine.register_fn("pop_matrix", |b: &mut SketchHandle| -> ScriptResult<()> {
        b.lock()?.pop_matrix().map_err(script_err)
    });
    engine.register_fn("reset_matrix", |b: &mut SketchHandle| -> ScriptResult<()> {
        b.lock()?.reset_matrix();
        Ok(())
    });

    engine.register_fn("translate", |b: &mut SketchHandle, x: Dynamic, y: Dynamic| {
        translate(b, &[x, y])
    });
    engine.register_fn(
        "translate",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, z: Dynamic| translate(b, &[x, y, z]),
    );

    engine.register_fn("scale", |b: &mut SketchHandle, s: Dynamic| scale(b, &[s]));
    engine.register_fn("scale", |b: &mut SketchHandle, x: Dynamic, y: Dynamic| {
        scale(b, &[x, y])
    });
    engine.register_fn(
        "scale",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, z: Dynamic| scale(b, &[x, y, z]),
    );

    engine.register_fn(
        "rotate",
        |b: &mut SketchHandle, degrees: Dynamic| -> ScriptResult<()> {
            if degrees.is_array() {
                let axes = nums(&degrees.cast::<Array>())?;
                let [x, y, z] = axes[..] else {
                    return Err("rotate takes [x, y, z] degrees".into());
                };
                return b.lock()?.rotate3d(x, y, z).map_err(script_err);
            }
            let degrees = num(&degrees)?;
            b.lock()?.rotate(degrees).map_err(script_err)
        },
    );
}
