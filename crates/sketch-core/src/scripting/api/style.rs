//! # Style API
//!
//! Fill, stroke and global mode setters for Rhai scripts.
//!
//! ## Responsibilities
//! - **Paint**: `fill`, `stroke` (1–4 numbers or a hex string), `no_fill`, `no_stroke`,
//!   `stroke_weight`, `background`
//! - **Color**: `color` and `to_rgba` return `[r, g, b]` unit channels
//! - **Modes**: `opacity`, `blend_mode`, `mask_mode`, `cap_mode`, `anchor_mode`, `set_3d_mode`

use crate::style::{self, ParsedColor};
use crate::types::{BlendMode, LineCap, MaskMode};
use rhai::{Array, Dynamic, Engine};

use super::super::types::SketchHandle;
use super::super::utils::{color_components, num, nums, ScriptResult};
use super::lifecycle::anchor_mode;

fn fill(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<()> {
    let components = color_components(args)?;
    b.lock()?.fill_components(&components);
    Ok(())
}

fn stroke(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<()> {
    let components = color_components(args)?;
    b.lock()?.stroke_components(&components);
    Ok(())
}

fn background(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<()> {
    let components = color_components(args)?;
    b.lock()?.background(&components);
    Ok(())
}

fn color(b: &SketchHandle, args: &[Dynamic]) -> ScriptResult<Array> {
    let components = nums(args)?;
    let color = b
        .lock()?
        .color(&components)
        .ok_or_else(|| format!("color takes 1 to 4 components, got {}", components.len()))?;
    Ok(channels(&ParsedColor {
        color,
        opacity: None,
    }))
}

fn channels(parsed: &ParsedColor) -> Array {
    let c = parsed.color;
    vec![
        Dynamic::from_float(c.r as f64),
        Dynamic::from_float(c.g as f64),
        Dynamic::from_float(c.b as f64),
    ]
}

fn to_rgba(b: &SketchHandle, h: &Dynamic, s: &Dynamic, v: &Dynamic, a: Option<&Dynamic>) -> ScriptResult<Array> {
    let alpha = a.map(num).transpose()?;
    let parsed = style::to_rgba(num(h)?, num(s)?, num(v)?, alpha);
    if let Some(opacity) = parsed.opacity {
        b.lock()?.opacity(opacity);
    }
    Ok(channels(&parsed))
}

/// Register style-related Rhai functions.
pub fn register(engine: &mut Engine) {
    engine.register_fn("fill", |b: &mut SketchHandle, a: Dynamic| fill(b, &[a]));
    engine.register_fn("fill", |b: &mut SketchHandle, a: Dynamic, c: Dynamic| {
        fill(b, &[a, c])
    });
    engine.register_fn(
        "fill",
        |b: &mut SketchHandle, r: Dynamic, g: Dynamic, bl: Dynamic| fill(b, &[r, g, bl]),
    );
    engine.register_fn(
        "fill",
        |b: &mut SketchHandle, r: Dynamic, g: Dynamic, bl: Dynamic, a: Dynamic| {
            fill(b, &[r, g, bl, a])
        },
    );

    engine.register_fn("stroke", |b: &mut SketchHandle, a: Dynamic| stroke(b, &[a]));
    engine.register_fn("stroke", |b: &mut SketchHandle, a: Dynamic, c: Dynamic| {
        stroke(b, &[a, c])
    });
    engine.register_fn(
        "stroke",
        |b: &mut SketchHandle, r: Dynamic, g: Dynamic, bl: Dynamic| stroke(b, &[r, g, bl]),
    );
    engine.register_fn(
        "stroke",
        |b: &mut SketchHandle, r: Dynamic, g: Dynamic, bl: Dynamic, a: Dynamic| {
            stroke(b, &[r, g, bl, a])
        },
    );

    engine.register_fn("background", |b: &mut SketchHandle, a: Dynamic| {
        background(b, &[a])
    });
    engine.register_fn(
        "background",
        |b: &mut SketchHandle, r: Dynamic, g: Dynamic, bl: Dynamic| background(b, &[r, g, bl]),
    );

    engine.register_fn("no_fill", |b: &mut SketchHandle| -> ScriptResult<()> {
        b.lock()?.no_fill();
        Ok(())
    });
    engine.register_fn("no_stroke", |b: &mut SketchHandle| -> ScriptResult<()> {
        b.lock()?.no_stroke();
        Ok(())
    });
    engine.register_fn(
        "stroke_weight",
        |b: &mut SketchHandle, weight: Dynamic| -> ScriptResult<()> {
            let weight = num(&weight)?;
            b.lock()?.stroke_weight(weight);
            Ok(())
        },
    );

    engine.register_fn("color", |b: &mut SketchHandle, a: Dynamic| color(b, &[a]));
    engine.register_fn("color", |b: &mut SketchHandle, a: Dynamic, c: Dynamic| {
        color(b, &[a, c])
    });
    engine.register_fn(
        "color",
        |b: &mut SketchHandle, r: Dynamic, g: Dynamic, bl: Dynamic| color(b, &[r, g, bl]),
    );
    engine.register_fn(
        "color",
        |b: &mut SketchHandle, r: Dynamic, g: Dynamic, bl: Dynamic, a: Dynamic| {
            color(b, &[r, g, bl, a])
        },
    );
    engine.register_fn(
        "to_rgba",
        |b: &mut SketchHandle, h: Dynamic, s: Dynamic, v: Dynamic| to_rgba(b, &h, &s, &v, None),
    );
    engine.register_fn(
        "to_rgba",
        |b: &mut SketchHandle, h: Dynamic, s: Dynamic, v: Dynamic, a: Dynamic| {
            to_rgba(b, &h, &s, &v, Some(&a))
        },
    );

    // Global modes
    engine.register_fn(
        "opacity",
        |b: &mut SketchHandle, opacity: Dynamic| -> ScriptResult<()> {
            let opacity = num(&opacity)?;
            b.lock()?.opacity(opacity);
            Ok(())
        },
    );
    engine.register_fn(
        "blend_mode",
        |b: &mut SketchHandle, mode: &str| -> ScriptResult<()> {
            let mode = BlendMode::parse(mode).ok_or_else(|| format!("unknown blend mode '{}'", mode))?;
            b.lock()?.blend_mode(mode);
            Ok(())
        },
    );
    engine.register_fn(
        "mask_mode",
        |b: &mut SketchHandle, mode: &str| -> ScriptResult<()> {
            let mode = MaskMode::parse(mode).ok_or_else(|| format!("unknown mask mode '{}'", mode))?;
            b.lock()?.mask_mode(mode);
            Ok(())
        },
    );
    engine.register_fn(
        "cap_mode",
        |b: &mut SketchHandle, cap: &str| -> ScriptResult<()> {
            let cap = LineCap::parse(cap).ok_or_else(|| format!("unknown line cap '{}'", cap))?;
            b.lock()?.cap_mode(cap);
            Ok(())
        },
    );
    engine.register_fn(
        "anchor_mode",
        |b: &mut SketchHandle, mode: i64| -> ScriptResult<()> {
            let mode = anchor_mode(mode)?;
            b.lock()?.anchor_mode(mode);
            Ok(())
        },
    );
    engine.register_fn(
        "set_3d_mode",
        |b: &mut SketchHandle, on: bool| -> ScriptResult<()> {
            b.lock()?.set_3d_mode(on);
            Ok(())
        },
    );
}
