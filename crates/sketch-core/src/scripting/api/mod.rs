//! # API Module
//!
//! Aggregates all Rhai API sub-modules and provides a single registration point.
//!
//! ## Sub-modules
//! - **lifecycle**: `Sketch` type, composition getters, layer utilities
//! - **drawing**: primitive constructors, `begin_shape`/`end_shape`, masks
//! - **style**: fill, stroke, color and global modes
//! - **transform**: matrix stack
//! - **properties**: `Properties` and `Property` handles

pub mod drawing;
pub mod lifecycle;
pub mod properties;
pub mod style;
pub mod transform;

use rhai::Engine;

/// Register all API functions with the Rhai engine.
pub fn register_all(engine: &mut Engine) {
    lifecycle::register(engine);
    drawing::register(engine);
    style::register(engine);
    transform::register(engine);
    properties::register(engine);
}
