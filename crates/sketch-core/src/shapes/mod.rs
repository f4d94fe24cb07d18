//! # Shapes Module
//!
//! Constructors that turn drawing state into host layers.
//!
//! ## Responsibilities
//! - **Primitives**: `rect`, `ellipse`, `polygon`, `line`, `shape`, `solid` and
//!   `null_layer`, each with its call forms as a typed enum.
//! - **Grouped builds**: `end_shape` partitions recorded vertices into lines,
//!   quads or triangles inside one layer.
//!
//! Every constructor reads the style, transform and global modes at call time,
//! repositions the anchor per the anchor mode and returns a `ShapeHandle`.

pub(crate) mod builder;
mod grouped;
mod primitives;

pub use primitives::{EllipseForm, PolygonForm, RectForm, ShapeForm, SolidForm};
