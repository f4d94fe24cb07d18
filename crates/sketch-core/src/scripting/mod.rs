//! # Scripting Module
//!
//! Rhai scripting API bindings for the sketch session.
//!
//! ## Responsibilities
//! - **Engine Setup**: Registers all types and functions with Rhai.
//! - **Shape Creation**: `rect`, `ellipse`, `polygon`, `line`, `shape`, `solid`, `null_layer`.
//! - **Drawing State**: fill/stroke, global modes, the matrix stack.
//! - **Runner**: `run_script` drives a script's `setup(b)` and `draw(b)` functions.
//!
//! ## Pattern
//! All bindings follow: `engine.register_fn("name", |b: &mut SketchHandle, ...| { ... })`
//!
//! ## Module Structure
//! - `types`: `SketchHandle`
//! - `utils`: number, point, color and property value conversions
//! - `api/`: Sub-modules for lifecycle, drawing, style, transform, properties

mod api;
pub mod types;
pub mod utils;

pub use api::lifecycle::INACTIVE;
pub use types::SketchHandle;

use crate::errors::{SketchError, SketchResult};
use crate::host::SharedHost;
use crate::session::{Session, SessionConfig};
use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Registers the sketch API into the provided Rhai `Engine`.
///
/// This exposes the `Sketch`, `Properties` and `Property` types and the
/// `sketch::` constants module.
pub fn register_rhai_api(engine: &mut Engine) {
    engine.register_static_module("sketch", api::lifecycle::constants_module().into());
    engine.set_max_expr_depths(0, 0);

    // Register all API functions
    api::register_all(engine);
}

fn defines(ast: &AST, name: &str) -> bool {
    ast.iter_functions()
        .any(|f| f.name == name && f.params.len() == 1)
}

fn script_error(e: impl std::fmt::Display) -> SketchError {
    SketchError::Script(e.to_string())
}

/// Compiles and runs `script` against a new session on `host`.
///
/// Top-level statements run first. A `setup(b)` function then runs once and a
/// `draw(b)` function once per frame, with the transform stack reset before
/// each frame. The session lock is released while script code runs.
#[instrument(skip(engine, script, host), fields(name = %config.name))]
pub fn run_script(
    engine: &Engine,
    script: &str,
    host: SharedHost,
    config: SessionConfig,
) -> SketchResult<SketchHandle> {
    let started = Instant::now();
    let handle = SketchHandle::new(Session::new(host, config)?);

    let result = drive(engine, script, &handle);
    if let Err(e) = &result {
        error!("{}", e);
    }
    result?;

    info!(seconds = started.elapsed().as_secs_f64(), "Done");
    Ok(handle)
}

fn drive(engine: &Engine, script: &str, handle: &SketchHandle) -> SketchResult<()> {
    let ast = engine.compile(script).map_err(script_error)?;
    let mut scope = Scope::new();
    engine
        .run_ast_with_scope(&mut scope, &ast)
        .map_err(script_error)?;

    let options = || CallFnOptions::new().eval_ast(false).rewind_scope(true);

    if defines(&ast, "setup") {
        info!("Running setup...");
        let _: Dynamic = engine
            .call_fn_with_options(options(), &mut scope, &ast, "setup", (handle.clone(),))
            .map_err(script_error)?;
    }

    if defines(&ast, "draw") {
        info!("Running draw...");
        let total = handle.lock().map_err(script_error)?.config().total_frames();
        for frame in 1..=total {
            handle.lock().map_err(script_error)?.start_frame(frame);
            let _: Dynamic = engine
                .call_fn_with_options(
                    options(),
                    &mut scope,
                    &ast,
                    "draw",
                    (handle.clone(),),
                )
                .map_err(script_error)?;
            debug!(frame, "frame done");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{share, MemoryHost};

    fn engine() -> Engine {
        let mut engine = Engine::new();
        register_rhai_api(&mut engine);
        engine
    }

    fn config() -> SessionConfig {
        SessionConfig::full("script", 200.0, 100.0, 1.0, 4.0)
    }

    #[test]
    fn setup_and_draw_run() {
        let script = r#"
            let count = 0;
            fn setup(b) {
                b.fill(255, 0, 0);
                b.rect(10, 10, 20, 20);
            }
            fn draw(b) {
                b.translate(5, 0);
                b.ellipse(0, 0, 10, 10);
            }
        "#;
        let handle = run_script(&engine(), script, share(MemoryHost::default()), config()).unwrap();
        let session = handle.lock().unwrap();
        assert_eq!(session.frame_count(), 4);
        assert_eq!(session.summary().unwrap().layers.len(), 5);
    }

    #[test]
    fn constants_and_recording() {
        let script = r#"
            fn setup(b) {
                b.begin_shape(sketch::LINES);
                b.vertex(0, 0);
                b.vertex(10, 0);
                b.vertex(0, 10);
                b.vertex(10, 10);
                b.end_shape();
                if b.last_shape().len() != 2 { throw "expected two groups"; }
            }
        "#;
        run_script(&engine(), script, share(MemoryHost::default()), config()).unwrap();
    }

    #[test]
    fn property_handles_are_scriptable() {
        let script = r#"
            fn setup(b) {
                let r = b.rect(0, 0, 40, 20);
                let position = r["position"];
                position.add_keyframe(0, [0, 0]);
                position.add_keyframe(1, [100, 0], "ease_out");
                if position.num_keys() != 2 { throw "keys"; }
                if !r.has("size") { throw "size"; }
            }
        "#;
        run_script(&engine(), script, share(MemoryHost::default()), config()).unwrap();
    }

    #[test]
    fn session_errors_abort_the_run() {
        let script = "fn setup(b) { b.pop_matrix(); }";
        let err = run_script(&engine(), script, share(MemoryHost::default()), config()).unwrap_err();
        assert!(matches!(err, SketchError::Script(ref m) if m.contains("pop_matrix")));
    }

    #[test]
    fn compile_errors_are_script_errors() {
        let err = run_script(&engine(), "fn setup(b) {", share(MemoryHost::default()), config())
            .unwrap_err();
        assert!(matches!(err, SketchError::Script(_)));
    }
}
