//! # Host Module
//!
//! The composition store the drawing session writes into.
//!
//! ## Responsibilities
//! - **Contract**: `HostStore` is the minimal surface a session needs from a
//!   composition host: layers, vector groups and their contents, masks,
//!   animatable properties with keyframes and expressions.
//! - **Sharing**: sessions and the handles they return hold a `SharedHost`,
//!   so property handles stay live after the constructor that made them returns.
//!
//! `MemoryHost` is the in-process implementation used by the CLI and the tests.

mod memory;

pub use memory::MemoryHost;

use crate::animation::{EasingType, PropertyKeyframe, PropertyValue};
use crate::types::{BlendMode, Color, MaskMode};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Index of a layer in the host.
pub type LayerId = usize;
/// Index of an animatable property in the host.
pub type PropertyId = usize;
/// Index of a vector group inside a shape layer.
pub type GroupId = usize;

/// Named properties created by `add_content` / `add_mask`.
pub type PropertyMap = BTreeMap<String, PropertyId>;

/// A host shared between a session and every handle it returns.
pub type SharedHost = Arc<Mutex<dyn HostStore + Send>>;

/// Errors raised by a host store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Host error: layer {0} does not exist")]
    UnknownLayer(LayerId),
    #[error("Host error: property {0} does not exist")]
    UnknownProperty(PropertyId),
    #[error("Host error: layer {layer} has no group {group}")]
    UnknownGroup { layer: LayerId, group: GroupId },
    #[error("Host error: layer {layer} has no attribute '{name}'")]
    UnknownAttribute { layer: LayerId, name: String },
    #[error("Host error: property '{name}' holds a {expected} value, got {found}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Host error: property '{0}' is time-varying; set a keyframe instead")]
    TimeVarying(String),
    #[error("Host error: property '{name}' has no keyframe {index}")]
    KeyframeIndex { name: String, index: usize },
    #[error("Host error: cannot parent layer {child} to {parent}")]
    InvalidParent { child: LayerId, parent: LayerId },
    #[error("Host error: content kind not allowed here: {0}")]
    InvalidContent(String),
    #[error("Host error: host lock poisoned")]
    Poisoned,
}

pub type HostResult<T> = Result<T, HostError>;

/// Composition settings published by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositionInfo {
    pub name: String,
    pub width: f64,
    pub height: f64,
    /// Seconds.
    pub duration: f64,
    pub frame_rate: f64,
    /// Current time in seconds.
    pub time: f64,
    #[serde(default)]
    pub background: Color,
}

impl Default for CompositionInfo {
    fn default() -> Self {
        Self {
            name: "untitled".to_string(),
            width: 1920.0,
            height: 1080.0,
            duration: 10.0,
            frame_rate: 24.0,
            time: 0.0,
            background: Color::BLACK,
        }
    }
}

/// What `create_layer` builds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum LayerKind {
    /// Empty vector layer that groups and contents are added to.
    Shape,
    /// Flat colored rectangle.
    Solid { width: f64, height: f64, color: Color },
    /// Invisible 100×100 transform carrier.
    Null,
}

/// Geometry and paint sub-objects of a vector group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// `size`, `position`, `round`.
    Rect,
    /// `size`, `position`.
    Ellipse,
    /// `points`, `position`, `radius`, `roundness`, `rotation`.
    Polygon,
    /// `path`.
    Path,
    /// `color`, `opacity`.
    Fill,
    /// `color`, `weight`, `linecap`, `linejoin`, `miterlimit`, `opacity`.
    Stroke,
}

impl ContentKind {
    pub fn is_geometry(self) -> bool {
        !matches!(self, ContentKind::Fill | ContentKind::Stroke)
    }
}

/// Snapshot of a layer's non-animatable state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub enabled: bool,
    pub three_d: bool,
    pub blend_mode: BlendMode,
    pub parent: Option<LayerId>,
    /// Seconds the layer lasts from time 0.
    pub duration: f64,
    pub groups: usize,
    pub masks: usize,
}

/// The composition store a session builds into.
///
/// Property values are typed by `PropertyValue`; writing a value of another kind
/// fails with `HostError::KindMismatch`. Vector writes shorter than the stored
/// vector keep the remaining stored components.
pub trait HostStore {
    // Composition
    fn composition(&self) -> CompositionInfo;
    fn set_composition(&mut self, info: CompositionInfo);
    fn set_time(&mut self, time: f64);

    // Layers
    fn create_layer(&mut self, kind: LayerKind, name: &str) -> HostResult<LayerId>;
    fn layer_info(&self, layer: LayerId) -> HostResult<LayerInfo>;
    /// Live layers, in creation order.
    fn layer_ids(&self) -> Vec<LayerId>;
    fn layer_count(&self) -> usize;
    fn set_layer_enabled(&mut self, layer: LayerId, enabled: bool) -> HostResult<()>;
    fn set_three_d(&mut self, layer: LayerId, three_d: bool) -> HostResult<()>;
    fn set_blend_mode(&mut self, layer: LayerId, mode: BlendMode) -> HostResult<()>;
    fn set_layer_duration(&mut self, layer: LayerId, seconds: f64) -> HostResult<()>;
    /// Sets or clears the parent reference. Transforms are not compensated.
    fn set_parent(&mut self, layer: LayerId, parent: Option<LayerId>) -> HostResult<()>;
    /// Deep copy of a layer: contents, masks, property values, keyframes and expressions.
    fn duplicate_layer(&mut self, layer: LayerId) -> HostResult<LayerId>;
    fn remove_layer(&mut self, layer: LayerId) -> HostResult<()>;
    /// Standard transform attribute of a layer (`anchorpoint`, `position`, `scale`,
    /// `orientation`, `rotation`, `xrotation`, `yrotation`, `zrotation`, `opacity`).
    fn layer_property(&self, layer: LayerId, name: &str) -> HostResult<PropertyId>;
    /// Bounding box of the layer content in layer space.
    fn source_rect(&self, layer: LayerId, time: f64) -> HostResult<Rect>;

    // Vector content
    fn add_group(&mut self, layer: LayerId, parent: Option<GroupId>) -> HostResult<GroupId>;
    /// Group transform attribute (`anchorpoint`, `position`, `scale`, `rotation`, `opacity`).
    fn group_property(&self, layer: LayerId, group: GroupId, name: &str)
        -> HostResult<PropertyId>;
    fn add_content(
        &mut self,
        layer: LayerId,
        group: GroupId,
        kind: ContentKind,
    ) -> HostResult<PropertyMap>;

    // Masks
    /// Adds a mask; returns `path`, `feather`, `opacity` and `expansion`.
    fn add_mask(&mut self, layer: LayerId, mode: MaskMode) -> HostResult<PropertyMap>;
    /// Vertices of every mask whose mode is not `None`, evaluated at `time`.
    fn mask_vertices(&self, layer: LayerId, time: f64) -> HostResult<Vec<Point>>;

    // Properties
    /// Static value, or the keyframed value at the current composition time.
    fn value(&self, prop: PropertyId) -> HostResult<PropertyValue>;
    fn value_at(&self, prop: PropertyId, time: f64) -> HostResult<PropertyValue>;
    /// Fails with `HostError::TimeVarying` when the property has keyframes.
    fn set_value(&mut self, prop: PropertyId, value: PropertyValue) -> HostResult<()>;
    /// Adds a keyframe, or replaces the one at `time`. Returns the key count.
    fn add_keyframe(
        &mut self,
        prop: PropertyId,
        time: f64,
        value: PropertyValue,
        easing: EasingType,
    ) -> HostResult<usize>;
    fn keyframes(&self, prop: PropertyId) -> HostResult<Vec<PropertyKeyframe>>;
    fn set_keyframe_value(
        &mut self,
        prop: PropertyId,
        index: usize,
        value: PropertyValue,
    ) -> HostResult<()>;
    fn expression(&self, prop: PropertyId) -> HostResult<Option<String>>;
    fn set_expression(&mut self, prop: PropertyId, expression: Option<String>) -> HostResult<()>;

    /// Keyed write with linear easing.
    fn set_value_at_time(
        &mut self,
        prop: PropertyId,
        time: f64,
        value: PropertyValue,
    ) -> HostResult<usize> {
        self.add_keyframe(prop, time, value, EasingType::Linear)
    }

    fn is_time_varying(&self, prop: PropertyId) -> HostResult<bool> {
        Ok(!self.keyframes(prop)?.is_empty())
    }
}

/// Locks a shared host, mapping a poisoned lock to `HostError::Poisoned`.
pub fn lock_host(host: &SharedHost) -> HostResult<MutexGuard<'_, dyn HostStore + Send + 'static>> {
    host.lock().map_err(|_| HostError::Poisoned)
}

/// Wraps a host for sharing.
pub fn share<H: HostStore + Send + 'static>(host: H) -> SharedHost {
    Arc::new(Mutex::new(host))
}
