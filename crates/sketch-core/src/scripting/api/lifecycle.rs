//! # Lifecycle API
//!
//! The `Sketch` handle and session-level queries for Rhai scripts.
//!
//! ## Responsibilities
//! - **Constants**: the `sketch::` static module (`LINES`, `CLOSE`, `TOP_LEFT`, ...)
//! - **Composition**: `width`, `height`, `frame_count`, `frame_time`
//! - **Layer utilities**: `bounds`, `anchor`, `parent`, `duplicate`

use crate::properties::ShapeHandle;
use crate::types::AnchorMode;
use rhai::{Dynamic, Engine, Map, Module};

use super::super::types::SketchHandle;
use super::super::utils::{script_err, ScriptResult};

/// Drawing mode code that flags the next build as inactive.
pub const INACTIVE: i64 = -1;

/// Constants exposed as `sketch::NAME`.
pub fn constants_module() -> Module {
    let mut module = Module::new();
    module.set_var("LINES", 1_i64);
    module.set_var("QUADS", 2_i64);
    module.set_var("TRIANGLES", 3_i64);
    module.set_var("INACTIVE", INACTIVE);
    module.set_var("CLOSE", true);
    let anchors = [
        ("TOP_LEFT", AnchorMode::TOP_LEFT),
        ("TOP", AnchorMode::TOP),
        ("TOP_RIGHT", AnchorMode::TOP_RIGHT),
        ("LEFT", AnchorMode::LEFT),
        ("CENTER", AnchorMode::CENTER),
        ("RIGHT", AnchorMode::RIGHT),
        ("BOTTOM_LEFT", AnchorMode::BOTTOM_LEFT),
        ("BOTTOM", AnchorMode::BOTTOM),
        ("BOTTOM_RIGHT", AnchorMode::BOTTOM_RIGHT),
    ];
    for (name, mode) in anchors {
        module.set_var(name, mode.index() as i64);
    }
    module
}

pub(crate) fn anchor_mode(index: i64) -> ScriptResult<AnchorMode> {
    AnchorMode::from_index(index).ok_or_else(|| format!("anchor mode must be 1 to 9, got {}", index).into())
}

/// Register lifecycle-related Rhai functions.
pub fn register(engine: &mut Engine) {
    engine.register_type_with_name::<SketchHandle>("Sketch");

    engine.register_get("width", |b: &mut SketchHandle| -> ScriptResult<f64> {
        Ok(b.lock()?.width())
    });
    engine.register_get("height", |b: &mut SketchHandle| -> ScriptResult<f64> {
        Ok(b.lock()?.height())
    });
    engine.register_get("frame_count", |b: &mut SketchHandle| -> ScriptResult<i64> {
        Ok(b.lock()?.frame_count() as i64)
    });
    engine.register_get("frame_time", |b: &mut SketchHandle| -> ScriptResult<f64> {
        Ok(b.lock()?.frame_time())
    });

    engine.register_fn(
        "bounds",
        |b: &mut SketchHandle, shape: ShapeHandle| -> ScriptResult<Map> {
            let rect = b.lock()?.bounds(shape.layer()).map_err(script_err)?;
            let mut map = Map::new();
            map.insert("left".into(), Dynamic::from_float(rect.x0));
            map.insert("top".into(), Dynamic::from_float(rect.y0));
            map.insert("width".into(), Dynamic::from_float(rect.width()));
            map.insert("height".into(), Dynamic::from_float(rect.height()));
            Ok(map)
        },
    );

    engine.register_fn(
        "anchor",
        |b: &mut SketchHandle, shape: ShapeHandle, mode: i64| -> ScriptResult<()> {
            let mode = anchor_mode(mode)?;
            b.lock()?.anchor(shape.layer(), mode).map_err(script_err)
        },
    );

    engine.register_fn(
        "parent",
        |b: &mut SketchHandle, parent: ShapeHandle, child: ShapeHandle| -> ScriptResult<()> {
            b.lock()?
                .parent(parent.layer(), child.layer())
                .map_err(script_err)
        },
    );

    engine.register_fn(
        "duplicate",
        |b: &mut SketchHandle, shape: ShapeHandle| -> ScriptResult<ShapeHandle> {
            b.lock()?.duplicate(&shape).map_err(script_err)
        },
    );
}
