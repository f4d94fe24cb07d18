//! # Properties Module
//!
//! Handles returned by every constructor.
//!
//! ## Key Types
//! - `PropertyHandle`: one animatable property with get/set/keyframe/expression access.
//! - `LayerHandle`: the layer a constructor built.
//! - `ShapeHandle`: the named bag of property handles plus the layer ("Properties").
//!
//! Handles alias host storage: writes through a handle are visible to every other
//! handle on the same property. The session keeps no reference to what it returns.

use crate::animation::{EasingType, PropertyKeyframe, PropertyValue};
use crate::errors::{SketchError, SketchResult};
use crate::host::{lock_host, LayerId, LayerInfo, PropertyId, SharedHost};
use kurbo::Rect;
use std::collections::BTreeMap;
use std::fmt;

/// Capability over one animatable property.
#[derive(Clone)]
pub struct PropertyHandle {
    pub host: SharedHost,
    pub layer: LayerId,
    pub id: PropertyId,
    pub name: String,
}

impl fmt::Debug for PropertyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyHandle")
            .field("layer", &self.layer)
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl PropertyHandle {
    pub fn new(host: SharedHost, layer: LayerId, id: PropertyId, name: impl Into<String>) -> Self {
        Self {
            host,
            layer,
            id,
            name: name.into(),
        }
    }

    /// Value at the current composition time.
    pub fn value(&self) -> SketchResult<PropertyValue> {
        Ok(lock_host(&self.host)?.value(self.id)?)
    }

    pub fn value_at(&self, time: f64) -> SketchResult<PropertyValue> {
        Ok(lock_host(&self.host)?.value_at(self.id, time)?)
    }

    /// Static write; fails on a keyframed property.
    pub fn set_value(&self, value: PropertyValue) -> SketchResult<()> {
        Ok(lock_host(&self.host)?.set_value(self.id, value)?)
    }

    /// Linear keyframe at `time`. Returns the key count.
    pub fn add_keyframe(&self, time: f64, value: PropertyValue) -> SketchResult<usize> {
        self.add_keyframe_eased(time, value, EasingType::Linear)
    }

    pub fn add_keyframe_eased(
        &self,
        time: f64,
        value: PropertyValue,
        easing: EasingType,
    ) -> SketchResult<usize> {
        Ok(lock_host(&self.host)?.add_keyframe(self.id, time, value, easing)?)
    }

    pub fn keyframes(&self) -> SketchResult<Vec<PropertyKeyframe>> {
        Ok(lock_host(&self.host)?.keyframes(self.id)?)
    }

    pub fn num_keys(&self) -> SketchResult<usize> {
        Ok(self.keyframes()?.len())
    }

    pub fn is_time_varying(&self) -> SketchResult<bool> {
        Ok(lock_host(&self.host)?.is_time_varying(self.id)?)
    }

    pub fn set_expression(&self, expression: impl Into<String>) -> SketchResult<()> {
        Ok(lock_host(&self.host)?.set_expression(self.id, Some(expression.into()))?)
    }

    pub fn clear_expression(&self) -> SketchResult<()> {
        Ok(lock_host(&self.host)?.set_expression(self.id, None)?)
    }

    pub fn expression(&self) -> SketchResult<Option<String>> {
        Ok(lock_host(&self.host)?.expression(self.id)?)
    }
}

/// Handle to a layer in the host.
#[derive(Clone)]
pub struct LayerHandle {
    pub host: SharedHost,
    pub id: LayerId,
}

impl fmt::Debug for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerHandle").field("id", &self.id).finish()
    }
}

impl LayerHandle {
    pub fn new(host: SharedHost, id: LayerId) -> Self {
        Self { host, id }
    }

    pub fn info(&self) -> SketchResult<LayerInfo> {
        Ok(lock_host(&self.host)?.layer_info(self.id)?)
    }

    pub fn enabled(&self) -> SketchResult<bool> {
        Ok(self.info()?.enabled)
    }

    pub fn set_enabled(&self, enabled: bool) -> SketchResult<()> {
        Ok(lock_host(&self.host)?.set_layer_enabled(self.id, enabled)?)
    }

    /// Content bounds in layer space at the current composition time.
    pub fn bounds(&self) -> SketchResult<Rect> {
        let host = lock_host(&self.host)?;
        let time = host.composition().time;
        Ok(host.source_rect(self.id, time)?)
    }

    /// Sets or clears the parent layer.
    pub fn set_parent(&self, parent: Option<&LayerHandle>) -> SketchResult<()> {
        Ok(lock_host(&self.host)?.set_parent(self.id, parent.map(|p| p.id))?)
    }

    /// Transform attribute of this layer.
    pub fn property(&self, name: &str) -> SketchResult<PropertyHandle> {
        let id = lock_host(&self.host)?.layer_property(self.id, name)?;
        Ok(PropertyHandle::new(self.host.clone(), self.id, id, name))
    }
}

/// The named bag of property handles a constructor returns ("Properties").
#[derive(Clone, Debug)]
pub struct ShapeHandle {
    layer: LayerHandle,
    props: BTreeMap<String, PropertyHandle>,
}

impl ShapeHandle {
    pub fn new(layer: LayerHandle) -> Self {
        Self {
            layer,
            props: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, id: PropertyId) {
        let name = name.into();
        let handle = PropertyHandle::new(self.layer.host.clone(), self.layer.id, id, name.clone());
        self.props.insert(name, handle);
    }

    pub fn layer(&self) -> &LayerHandle {
        &self.layer
    }

    pub fn get(&self, name: &str) -> Option<&PropertyHandle> {
        self.props.get(name)
    }

    /// Like `get`, failing with an argument error for unknown attributes.
    pub fn require(&self, name: &str) -> SketchResult<&PropertyHandle> {
        self.props.get(name).ok_or_else(|| {
            SketchError::argument(format!(
                "no attribute '{}' on this shape (has: {})",
                name,
                self.names().join(", ")
            ))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    /// Attribute names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.props.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyHandle)> {
        self.props.iter()
    }

    /// Current value of every attribute.
    pub fn values(&self) -> SketchResult<BTreeMap<String, PropertyValue>> {
        self.props
            .iter()
            .map(|(name, prop)| Ok((name.clone(), prop.value()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{share, HostStore, LayerKind, MemoryHost};

    fn layer() -> LayerHandle {
        let mut host = MemoryHost::default();
        let id = host.create_layer(LayerKind::Shape, "shape").unwrap();
        LayerHandle::new(share(host), id)
    }

    #[test]
    fn handles_alias_host_storage() {
        let layer = layer();
        let a = layer.property("opacity").unwrap();
        let b = layer.property("opacity").unwrap();
        a.set_value(PropertyValue::Scalar(25.0)).unwrap();
        assert_eq!(b.value().unwrap(), PropertyValue::Scalar(25.0));
    }

    #[test]
    fn keyframes_and_expressions() {
        let layer = layer();
        let pos = layer.property("position").unwrap();
        assert!(!pos.is_time_varying().unwrap());
        pos.add_keyframe(0.0, PropertyValue::vec2(0.0, 0.0)).unwrap();
        pos.add_keyframe(1.0, PropertyValue::vec2(100.0, 0.0)).unwrap();
        assert_eq!(pos.num_keys().unwrap(), 2);
        assert!(pos.set_value(PropertyValue::vec2(1.0, 1.0)).is_err());

        pos.set_expression("wiggle(2, 10)").unwrap();
        assert_eq!(pos.expression().unwrap().as_deref(), Some("wiggle(2, 10)"));
        pos.clear_expression().unwrap();
        assert_eq!(pos.expression().unwrap(), None);
    }

    #[test]
    fn require_reports_unknown_attribute() {
        let layer = layer();
        let mut shape = ShapeHandle::new(layer.clone());
        let id = lock_host(&layer.host)
            .unwrap()
            .layer_property(layer.id, "scale")
            .unwrap();
        shape.insert("scale", id);
        assert!(shape.require("scale").is_ok());
        assert!(matches!(
            shape.require("size"),
            Err(SketchError::Argument(_))
        ));
        assert_eq!(shape.names(), vec!["scale".to_string()]);
    }
}
