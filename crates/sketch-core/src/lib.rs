//! # Sketch Engine
//!
//! `sketch-core` is a Processing-style drawing layer over an animatable composition store.
//!
//! A [`Session`] carries the drawing state (style, transform stack, vertex recorder and
//! global modes) and turns constructor calls such as `rect`, `ellipse` or
//! `begin_shape`/`vertex`/`end_shape` into layers, shape groups and animatable
//! properties inside a [`HostStore`]. Every constructor returns a [`ShapeHandle`]: the
//! named properties of what it built, ready to be keyframed.
//!
//! ## Core Features
//!
//! *   **Drawing State**: fill/stroke stacks, `push_matrix`/`pop_matrix`, 2D and 3D modes.
//! *   **Shapes**: rectangles, ellipses, polygons, lines, free-form paths and grouped
//!     `LINES`/`QUADS`/`TRIANGLES` builds.
//! *   **Layers**: solids, nulls, masks, parenting, duplication and anchor repositioning.
//! *   **Host Store**: [`MemoryHost`] keeps the composition in memory with keyframe evaluation.
//! *   **Scripting**: Rhai bindings drive a session from `setup(b)`/`draw(b)` scripts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sketch_core::{RectForm, Session, SessionConfig};
//!
//! let mut session = Session::in_memory(SessionConfig::sized("demo", 640.0, 360.0))?;
//! session.fill_components(&[255.0, 0.0, 0.0]);
//! session.translate(20.0, 0.0, 0.0);
//! let rect = session.rect(RectForm::Sized { x: 0.0, y: 0.0, w: 100.0, h: 50.0 })?;
//! rect.require("position")?.add_keyframe(1.0, sketch_core::PropertyValue::vec2(300.0, 0.0))?;
//! # Ok::<(), sketch_core::SketchError>(())
//! ```

/// Anchor point placement from content bounds.
pub mod anchor;

/// Property values, easing and keyframe evaluation.
pub mod animation;

pub mod errors;

/// The composition store abstraction and its in-memory implementation.
pub mod host;

/// Layer masks.
pub mod masks;

/// Handles returned by constructors.
pub mod properties;

/// Vertex recording for `begin_shape`/`end_shape`.
pub mod recorder;

/// Rhai scripting API bindings.
pub mod scripting;

/// The drawing session and the `go` runner.
pub mod session;

/// Shape and layer constructors.
pub mod shapes;

/// Fill/stroke state and color parsing.
pub mod style;

/// The transform matrix stack.
pub mod transform;

/// Shared data structures used across the engine.
pub mod types;

pub use animation::{EasingType, PropertyKeyframe, PropertyValue};
pub use errors::{SketchError, SketchResult};
pub use host::{lock_host, share, HostError, HostStore, MemoryHost, SharedHost};
pub use masks::MaskForm;
pub use properties::{LayerHandle, PropertyHandle, ShapeHandle};
pub use session::{go, CompositionSummary, Session, SessionConfig, Sketch};
pub use shapes::{EllipseForm, PolygonForm, RectForm, ShapeForm, SolidForm};
pub use types::{AnchorMode, BeginMode, BlendMode, Color, DrawMode, LineCap, MaskMode, PathShape};
