//! # Drawing API
//!
//! Shape constructors and the begin/vertex/end protocol for Rhai scripts.
//!
//! ## Responsibilities
//! - **Primitives**: `rect`, `ellipse`, `polygon`, `line`, `shape`, `solid`, `null_layer`
//!   registered once per call form; numbers may be integers or floats
//! - **Recording**: `begin_shape`, `vertex`, `itangent`, `otangent`, `end_shape`, `last_shape`
//! - **Masks**: `mask`, `begin_mask`, `end_mask`

use crate::masks::MaskForm;
use crate::properties::ShapeHandle;
use crate::shapes::ShapeForm;
use crate::types::{BeginMode, DrawMode, MaskMode};
use rhai::{Array, Dynamic, Engine};

use super::super::types::SketchHandle;
use super::super::utils::{num, nums, points, script_err, vectors, ScriptResult};
use super::lifecycle::INACTIVE;

fn rect(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<ShapeHandle> {
    let args = nums(args)?;
    b.lock()?.rect_args(&args).map_err(script_err)
}

fn ellipse(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<ShapeHandle> {
    let args = nums(args)?;
    b.lock()?.ellipse_args(&args).map_err(script_err)
}

fn polygon(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<ShapeHandle> {
    let args = nums(args)?;
    b.lock()?.polygon_args(&args).map_err(script_err)
}

/// A leading string argument is the layer name.
fn solid(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<ShapeHandle> {
    let (name, rest) = match args.split_first() {
        Some((first, rest)) if first.is_string() => {
            let name = first.clone().into_string().map_err(|t| t.to_string())?;
            (Some(name), rest)
        }
        _ => (None, args),
    };
    let rest = nums(rest)?;
    b.lock()?.solid_args(name, &rest).map_err(script_err)
}

fn shape(b: &SketchHandle, form: ShapeForm) -> ScriptResult<ShapeHandle> {
    b.lock()?.shape(form).map_err(script_err)
}

fn mask(b: &SketchHandle, target: &ShapeHandle, form: MaskForm) -> ScriptResult<ShapeHandle> {
    b.lock()?.mask(target.layer(), form).map_err(script_err)
}

fn optional(shape: Option<ShapeHandle>) -> Dynamic {
    shape.map(Dynamic::from).unwrap_or(Dynamic::UNIT)
}

/// Register drawing-related Rhai functions.
pub fn register(engine: &mut Engine) {
    // 1. Primitives
    engine.register_fn("rect", |b: &mut SketchHandle, x: Dynamic, y: Dynamic| {
        rect(b, &[x, y])
    });
    engine.register_fn(
        "rect",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, z: Dynamic| rect(b, &[x, y, z]),
    );
    engine.register_fn(
        "rect",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, c: Dynamic, d: Dynamic| {
            rect(b, &[x, y, c, d])
        },
    );
    engine.register_fn(
        "rect",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, c: Dynamic, d: Dynamic, e: Dynamic| {
            rect(b, &[x, y, c, d, e])
        },
    );
    engine.register_fn(
        "rect",
        |b: &mut SketchHandle,
         x: Dynamic,
         y: Dynamic,
         z: Dynamic,
         w: Dynamic,
         h: Dynamic,
         round: Dynamic| { rect(b, &[x, y, z, w, h, round]) },
    );

    engine.register_fn("ellipse", |b: &mut SketchHandle, x: Dynamic, y: Dynamic| {
        ellipse(b, &[x, y])
    });
    engine.register_fn(
        "ellipse",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, z: Dynamic| ellipse(b, &[x, y, z]),
    );
    engine.register_fn(
        "ellipse",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, w: Dynamic, h: Dynamic| {
            ellipse(b, &[x, y, w, h])
        },
    );
    engine.register_fn(
        "ellipse",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, z: Dynamic, w: Dynamic, h: Dynamic| {
            ellipse(b, &[x, y, z, w, h])
        },
    );

    engine.register_fn("polygon", |b: &mut SketchHandle, x: Dynamic, y: Dynamic| {
        polygon(b, &[x, y])
    });
    engine.register_fn(
        "polygon",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, z: Dynamic| polygon(b, &[x, y, z]),
    );
    engine.register_fn(
        "polygon",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, r: Dynamic, n: Dynamic| {
            polygon(b, &[x, y, r, n])
        },
    );
    engine.register_fn(
        "polygon",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic, z: Dynamic, r: Dynamic, n: Dynamic| {
            polygon(b, &[x, y, z, r, n])
        },
    );

    engine.register_fn(
        "line",
        |b: &mut SketchHandle,
         x1: Dynamic,
         y1: Dynamic,
         x2: Dynamic,
         y2: Dynamic|
         -> ScriptResult<ShapeHandle> {
            let args = nums(&[x1, y1, x2, y2])?;
            b.lock()?.line_args(&args).map_err(script_err)
        },
    );

    engine.register_fn("shape", |b: &mut SketchHandle, vertices: Array| -> ScriptResult<ShapeHandle> {
        shape(b, ShapeForm::Vertices(points(&vertices)?))
    });
    engine.register_fn(
        "shape",
        |b: &mut SketchHandle, vertices: Array, closed: bool| -> ScriptResult<ShapeHandle> {
            shape(b, ShapeForm::VerticesClosed(points(&vertices)?, closed))
        },
    );
    engine.register_fn(
        "shape",
        |b: &mut SketchHandle, vertices: Array, inn: Array, out: Array| -> ScriptResult<ShapeHandle> {
            shape(
                b,
                ShapeForm::InOut {
                    vertices: points(&vertices)?,
                    in_tangents: vectors(&inn)?,
                    out_tangents: vectors(&out)?,
                },
            )
        },
    );
    engine.register_fn(
        "shape",
        |b: &mut SketchHandle,
         vertices: Array,
         inn: Array,
         out: Array,
         closed: bool|
         -> ScriptResult<ShapeHandle> {
            shape(
                b,
                ShapeForm::InOutClosed {
                    vertices: points(&vertices)?,
                    in_tangents: vectors(&inn)?,
                    out_tangents: vectors(&out)?,
                    closed,
                },
            )
        },
    );

    engine.register_fn("solid", |b: &mut SketchHandle| solid(b, &[]));
    engine.register_fn("solid", |b: &mut SketchHandle, a: Dynamic| solid(b, &[a]));
    engine.register_fn(
        "solid",
        |b: &mut SketchHandle, a: Dynamic, c: Dynamic, d: Dynamic, e: Dynamic| {
            solid(b, &[a, c, d, e])
        },
    );
    engine.register_fn(
        "solid",
        |b: &mut SketchHandle, a: Dynamic, c: Dynamic, d: Dynamic, e: Dynamic, f: Dynamic| {
            solid(b, &[a, c, d, e, f])
        },
    );
    engine.register_fn(
        "solid",
        |b: &mut SketchHandle,
         a: Dynamic,
         c: Dynamic,
         d: Dynamic,
         e: Dynamic,
         f: Dynamic,
         g: Dynamic| { solid(b, &[a, c, d, e, f, g]) },
    );

    engine.register_fn(
        "null_layer",
        |b: &mut SketchHandle| -> ScriptResult<ShapeHandle> {
            b.lock()?.null_layer(None).map_err(script_err)
        },
    );
    engine.register_fn(
        "null_layer",
        |b: &mut SketchHandle, duration: Dynamic| -> ScriptResult<ShapeHandle> {
            let duration = num(&duration)?;
            b.lock()?.null_layer(Some(duration)).map_err(script_err)
        },
    );

    // 2. Recording
    engine.register_fn("begin_shape", |b: &mut SketchHandle| -> ScriptResult<()> {
        b.lock()?.begin_shape(BeginMode::default());
        Ok(())
    });
    engine.register_fn(
        "begin_shape",
        |b: &mut SketchHandle, mode: i64| -> ScriptResult<()> {
            let mode = if mode == INACTIVE {
                BeginMode::Inactive
            } else {
                let draw = DrawMode::from_code(mode)
                    .ok_or_else(|| format!("unknown drawing mode {}", mode))?;
                BeginMode::Draw(draw)
            };
            b.lock()?.begin_shape(mode);
            Ok(())
        },
    );

    engine.register_fn(
        "vertex",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
            let (x, y) = (num(&x)?, num(&y)?);
            b.lock()?.vertex(x, y);
            Ok(())
        },
    );
    engine.register_fn(
        "itangent",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
            let (x, y) = (num(&x)?, num(&y)?);
            b.lock()?.itangent(x, y);
            Ok(())
        },
    );
    engine.register_fn(
        "otangent",
        |b: &mut SketchHandle, x: Dynamic, y: Dynamic| -> ScriptResult<()> {
            let (x, y) = (num(&x)?, num(&y)?);
            b.lock()?.otangent(x, y);
            Ok(())
        },
    );

    engine.register_fn("end_shape", |b: &mut SketchHandle| -> ScriptResult<Dynamic> {
        let shape = b.lock()?.end_shape(false).map_err(script_err)?;
        Ok(optional(shape))
    });
    engine.register_fn(
        "end_shape",
        |b: &mut SketchHandle, closed: bool| -> ScriptResult<Dynamic> {
            let shape = b.lock()?.end_shape(closed).map_err(script_err)?;
            Ok(optional(shape))
        },
    );

    engine.register_fn("last_shape", |b: &mut SketchHandle| -> ScriptResult<Array> {
        Ok(b.lock()?
            .last_shape()
            .iter()
            .cloned()
            .map(Dynamic::from)
            .collect())
    });

    // 3. Masks
    engine.register_fn(
        "mask",
        |b: &mut SketchHandle, target: ShapeHandle, vertices: Array| -> ScriptResult<ShapeHandle> {
            mask(b, &target, MaskForm::Vertices(points(&vertices)?))
        },
    );
    engine.register_fn(
        "mask",
        |b: &mut SketchHandle,
         target: ShapeHandle,
         vertices: Array,
         third: Dynamic|
         -> ScriptResult<ShapeHandle> {
            let vertices = points(&vertices)?;
            let form = if third.is_array() {
                let tangents = third.into_array().map_err(|t| t.to_string())?;
                MaskForm::Tangents(vertices, vectors(&tangents)?)
            } else {
                let closed = third
                    .as_bool()
                    .map_err(|t| format!("mask: expected tangents or a closed flag, got {}", t))?;
                MaskForm::VerticesClosed(vertices, closed)
            };
            mask(b, &target, form)
        },
    );
    engine.register_fn(
        "mask",
        |b: &mut SketchHandle,
         target: ShapeHandle,
         vertices: Array,
         inn: Array,
         out: Array|
         -> ScriptResult<ShapeHandle> {
            let form = MaskForm::InOut {
                vertices: points(&vertices)?,
                in_tangents: vectors(&inn)?,
                out_tangents: vectors(&out)?,
            };
            mask(b, &target, form)
        },
    );
    engine.register_fn(
        "mask",
        |b: &mut SketchHandle,
         target: ShapeHandle,
         vertices: Array,
         inn: Array,
         out: Array,
         closed: bool|
         -> ScriptResult<ShapeHandle> {
            let form = MaskForm::InOutClosed {
                vertices: points(&vertices)?,
                in_tangents: vectors(&inn)?,
                out_tangents: vectors(&out)?,
                closed,
            };
            mask(b, &target, form)
        },
    );

    engine.register_fn("begin_mask", |b: &mut SketchHandle| -> ScriptResult<()> {
        b.lock()?.begin_mask(None);
        Ok(())
    });
    engine.register_fn(
        "begin_mask",
        |b: &mut SketchHandle, mode: &str| -> ScriptResult<()> {
            let mode = MaskMode::parse(mode).ok_or_else(|| format!("unknown mask mode '{}'", mode))?;
            b.lock()?.begin_mask(Some(mode));
            Ok(())
        },
    );

    engine.register_fn(
        "end_mask",
        |b: &mut SketchHandle, target: ShapeHandle| -> ScriptResult<Dynamic> {
            let mask = b.lock()?.end_mask(target.layer(), false).map_err(script_err)?;
            Ok(optional(mask))
        },
    );
    engine.register_fn(
        "end_mask",
        |b: &mut SketchHandle, target: ShapeHandle, closed: bool| -> ScriptResult<Dynamic> {
            let mask = b.lock()?.end_mask(target.layer(), closed).map_err(script_err)?;
            Ok(optional(mask))
        },
    );
}
