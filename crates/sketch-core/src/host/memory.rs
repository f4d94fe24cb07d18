use super::{
    CompositionInfo, ContentKind, GroupId, HostError, HostResult, HostStore, LayerId, LayerInfo,
    LayerKind, PropertyId, PropertyMap,
};
use crate::animation::{self, EasingType, PropertyKeyframe, PropertyValue};
use crate::types::{BlendMode, Color, MaskMode, PathShape};
use kurbo::{Affine, BezPath, Ellipse, Point, Rect, Shape, Size, Vec2};
use std::collections::BTreeMap;

/// Tolerance used when flattening rect/ellipse outlines for bounds.
const PATH_TOLERANCE: f64 = 0.1;
const MAX_POLYGON_POINTS: f64 = 100.0;

#[derive(Clone, Debug)]
struct PropertySlot {
    name: String,
    value: PropertyValue,
    keys: Vec<PropertyKeyframe>,
    expression: Option<String>,
}

#[derive(Clone, Debug)]
struct Content {
    kind: ContentKind,
    props: PropertyMap,
}

#[derive(Clone, Debug)]
struct Group {
    parent: Option<GroupId>,
    transform: PropertyMap,
    contents: Vec<Content>,
}

#[derive(Clone, Debug)]
struct Mask {
    mode: MaskMode,
    props: PropertyMap,
}

#[derive(Clone, Debug)]
struct LayerSlot {
    name: String,
    kind: LayerKind,
    enabled: bool,
    three_d: bool,
    blend_mode: BlendMode,
    parent: Option<LayerId>,
    duration: f64,
    transform: PropertyMap,
    groups: Vec<Group>,
    masks: Vec<Mask>,
    /// Creation sequence number; slots are reused so ids do not order layers.
    order: u64,
}

/// In-memory composition.
///
/// Layers and properties live in two arenas with reusable slots.
#[derive(Clone, Debug)]
pub struct MemoryHost {
    comp: CompositionInfo,
    layers: Vec<Option<LayerSlot>>,
    free_layers: Vec<LayerId>,
    properties: Vec<Option<PropertySlot>>,
    free_properties: Vec<PropertyId>,
    next_order: u64,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(CompositionInfo::default())
    }
}

fn lookup(map: &PropertyMap, name: &str) -> Option<PropertyId> {
    map.get(name).copied()
}

/// Coerces `incoming` to the kind stored in `stored`.
fn conform(name: &str, stored: &PropertyValue, incoming: PropertyValue) -> HostResult<PropertyValue> {
    match (stored, incoming) {
        (PropertyValue::Vector(old), PropertyValue::Vector(mut new)) => {
            if new.len() < old.len() {
                new.extend_from_slice(&old[new.len()..]);
            }
            new.truncate(old.len());
            Ok(PropertyValue::Vector(new))
        }
        (PropertyValue::Color(_), PropertyValue::Vector(v)) if v.len() >= 3 => {
            Ok(PropertyValue::Color(Color::new(
                v[0] as f32,
                v[1] as f32,
                v[2] as f32,
                v.get(3).copied().unwrap_or(1.0) as f32,
            )))
        }
        (stored, incoming) if stored.same_kind(&incoming) => Ok(incoming),
        (stored, incoming) => Err(HostError::KindMismatch {
            name: name.to_string(),
            expected: stored.kind(),
            found: incoming.kind(),
        }),
    }
}

impl MemoryHost {
    pub fn new(comp: CompositionInfo) -> Self {
        Self {
            comp,
            layers: Vec::new(),
            free_layers: Vec::new(),
            properties: Vec::new(),
            free_properties: Vec::new(),
            next_order: 0,
        }
    }

    fn alloc_property(&mut self, name: &str, value: PropertyValue) -> PropertyId {
        let slot = PropertySlot {
            name: name.to_string(),
            value,
            keys: Vec::new(),
            expression: None,
        };
        if let Some(id) = self.free_properties.pop() {
            self.properties[id] = Some(slot);
            id
        } else {
            self.properties.push(Some(slot));
            self.properties.len() - 1
        }
    }

    fn alloc_properties(&mut self, defaults: Vec<(&str, PropertyValue)>) -> PropertyMap {
        defaults
            .into_iter()
            .map(|(name, value)| (name.to_string(), self.alloc_property(name, value)))
            .collect()
    }

    fn prop(&self, id: PropertyId) -> HostResult<&PropertySlot> {
        self.properties
            .get(id)
            .and_then(|p| p.as_ref())
            .ok_or(HostError::UnknownProperty(id))
    }

    fn prop_mut(&mut self, id: PropertyId) -> HostResult<&mut PropertySlot> {
        self.properties
            .get_mut(id)
            .and_then(|p| p.as_mut())
            .ok_or(HostError::UnknownProperty(id))
    }

    fn layer(&self, id: LayerId) -> HostResult<&LayerSlot> {
        self.layers
            .get(id)
            .and_then(|l| l.as_ref())
            .ok_or(HostError::UnknownLayer(id))
    }

    fn layer_mut(&mut self, id: LayerId) -> HostResult<&mut LayerSlot> {
        self.layers
            .get_mut(id)
            .and_then(|l| l.as_mut())
            .ok_or(HostError::UnknownLayer(id))
    }

    fn eval(&self, id: PropertyId, time: f64) -> HostResult<PropertyValue> {
        let slot = self.prop(id)?;
        Ok(animation::evaluate(&slot.keys, time).unwrap_or_else(|| slot.value.clone()))
    }

    fn eval_named(&self, map: &PropertyMap, name: &str, time: f64) -> HostResult<PropertyValue> {
        match lookup(map, name) {
            Some(id) => self.eval(id, time),
            None => Ok(PropertyValue::default()),
        }
    }

    fn layer_transform_defaults(&mut self, kind: &LayerKind) -> PropertyMap {
        let anchor = match kind {
            LayerKind::Shape => PropertyValue::vec3(0.0, 0.0, 0.0),
            LayerKind::Solid { width, height, .. } => {
                PropertyValue::vec3(width / 2.0, height / 2.0, 0.0)
            }
            LayerKind::Null => PropertyValue::vec3(50.0, 50.0, 0.0),
        };
        let (cx, cy) = (self.comp.width / 2.0, self.comp.height / 2.0);
        let mut map = self.alloc_properties(vec![
            ("anchorpoint", anchor),
            ("position", PropertyValue::vec3(cx, cy, 0.0)),
            ("scale", PropertyValue::vec3(100.0, 100.0, 100.0)),
            ("orientation", PropertyValue::vec3(0.0, 0.0, 0.0)),
            ("rotation", PropertyValue::Scalar(0.0)),
            ("xrotation", PropertyValue::Scalar(0.0)),
            ("yrotation", PropertyValue::Scalar(0.0)),
            ("opacity", PropertyValue::Scalar(100.0)),
        ]);
        // Z rotation and 2D rotation are the same property.
        if let Some(rotation) = lookup(&map, "rotation") {
            map.insert("zrotation".to_string(), rotation);
        }
        map
    }

    fn content_defaults(kind: ContentKind) -> Vec<(&'static str, PropertyValue)> {
        match kind {
            ContentKind::Rect => vec![
                ("size", PropertyValue::vec2(100.0, 100.0)),
                ("position", PropertyValue::vec2(0.0, 0.0)),
                ("round", PropertyValue::Scalar(0.0)),
            ],
            ContentKind::Ellipse => vec![
                ("size", PropertyValue::vec2(100.0, 100.0)),
                ("position", PropertyValue::vec2(0.0, 0.0)),
            ],
            ContentKind::Polygon => vec![
                ("points", PropertyValue::Scalar(5.0)),
                ("position", PropertyValue::vec2(0.0, 0.0)),
                ("radius", PropertyValue::Scalar(50.0)),
                ("roundness", PropertyValue::Scalar(0.0)),
                ("rotation", PropertyValue::Scalar(0.0)),
            ],
            ContentKind::Path => vec![("path", PropertyValue::Path(PathShape::default()))],
            ContentKind::Fill => vec![
                ("color", PropertyValue::Color(Color::WHITE)),
                ("opacity", PropertyValue::Scalar(100.0)),
            ],
            ContentKind::Stroke => vec![
                ("color", PropertyValue::Color(Color::WHITE)),
                ("weight", PropertyValue::Scalar(2.0)),
                ("linecap", PropertyValue::Scalar(1.0)),
                ("linejoin", PropertyValue::Scalar(1.0)),
                ("miterlimit", PropertyValue::Scalar(4.0)),
                ("opacity", PropertyValue::Scalar(100.0)),
            ],
        }
    }

    /// Every distinct property id owned by a layer.
    fn owned_properties(slot: &LayerSlot) -> Vec<PropertyId> {
        let mut ids: Vec<PropertyId> = slot
            .transform
            .values()
            .chain(slot.groups.iter().flat_map(|g| {
                g.transform
                    .values()
                    .chain(g.contents.iter().flat_map(|c| c.props.values()))
            }))
            .chain(slot.masks.iter().flat_map(|m| m.props.values()))
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Copies the properties of `map`, reusing copies already made (aliases stay aliases).
    fn copy_properties(
        &mut self,
        map: &PropertyMap,
        copies: &mut BTreeMap<PropertyId, PropertyId>,
    ) -> HostResult<PropertyMap> {
        let mut out = PropertyMap::new();
        for (name, &old) in map {
            let new = match copies.get(&old) {
                Some(&new) => new,
                None => {
                    let slot = self.prop(old)?.clone();
                    let new = self.alloc_property(&slot.name, slot.value.clone());
                    let target = self.prop_mut(new)?;
                    target.keys = slot.keys;
                    target.expression = slot.expression;
                    copies.insert(old, new);
                    new
                }
            };
            out.insert(name.clone(), new);
        }
        Ok(out)
    }

    /// Content outline in group space.
    fn content_path(&self, content: &Content, time: f64) -> HostResult<Option<BezPath>> {
        let center = |s: &Self| -> HostResult<Point> {
            let p = s.eval_named(&content.props, "position", time)?;
            Ok(Point::new(p.component(0), p.component(1)))
        };
        let path = match content.kind {
            ContentKind::Rect | ContentKind::Ellipse => {
                let size = self.eval_named(&content.props, "size", time)?;
                let rect = Rect::from_center_size(
                    center(self)?,
                    Size::new(size.component(0), size.component(1)),
                );
                if content.kind == ContentKind::Rect {
                    rect.to_path(PATH_TOLERANCE)
                } else {
                    Ellipse::from_rect(rect).to_path(PATH_TOLERANCE)
                }
            }
            ContentKind::Polygon => {
                let points = self
                    .eval_named(&content.props, "points", time)?
                    .as_scalar()
                    .unwrap_or(5.0)
                    .round()
                    .max(3.0)
                    .min(MAX_POLYGON_POINTS) as usize;
                let radius = self
                    .eval_named(&content.props, "radius", time)?
                    .as_scalar()
                    .unwrap_or(0.0);
                let rotation = self
                    .eval_named(&content.props, "rotation", time)?
                    .as_scalar()
                    .unwrap_or(0.0);
                let origin = center(self)?;
                let vertices = (0..points)
                    .map(|i| {
                        let angle = (-90.0 + rotation + i as f64 * 360.0 / points as f64)
                            .to_radians();
                        origin + Vec2::new(angle.cos(), angle.sin()) * radius
                    })
                    .collect();
                PathShape::new(vertices, true).to_bez_path()
            }
            ContentKind::Path => match self.eval_named(&content.props, "path", time)? {
                PropertyValue::Path(path) if !path.vertices.is_empty() => path.to_bez_path(),
                _ => return Ok(None),
            },
            ContentKind::Fill | ContentKind::Stroke => return Ok(None),
        };
        Ok(Some(path))
    }

    /// Group space → layer space, through every enclosing group.
    fn group_affine(
        &self,
        layer: LayerId,
        slot: &LayerSlot,
        group: GroupId,
        time: f64,
    ) -> HostResult<Affine> {
        let mut affine = Affine::IDENTITY;
        let mut current = Some(group);
        while let Some(index) = current {
            let g = slot
                .groups
                .get(index)
                .ok_or(HostError::UnknownGroup { layer, group: index })?;
            let anchor = self.eval_named(&g.transform, "anchorpoint", time)?;
            let position = self.eval_named(&g.transform, "position", time)?;
            let scale = self.eval_named(&g.transform, "scale", time)?;
            let rotation = self
                .eval_named(&g.transform, "rotation", time)?
                .as_scalar()
                .unwrap_or(0.0);
            let local = Affine::translate((position.component(0), position.component(1)))
                * Affine::rotate(rotation.to_radians())
                * Affine::scale_non_uniform(scale.component(0) / 100.0, scale.component(1) / 100.0)
                * Affine::translate((-anchor.component(0), -anchor.component(1)));
            affine = local * affine;
            current = g.parent;
        }
        Ok(affine)
    }
}

impl HostStore for MemoryHost {
    fn composition(&self) -> CompositionInfo {
        self.comp.clone()
    }

    fn set_composition(&mut self, info: CompositionInfo) {
        self.comp = info;
    }

    fn set_time(&mut self, time: f64) {
        self.comp.time = time;
    }

    fn create_layer(&mut self, kind: LayerKind, name: &str) -> HostResult<LayerId> {
        let transform = self.layer_transform_defaults(&kind);
        let slot = LayerSlot {
            name: name.to_string(),
            kind,
            enabled: true,
            three_d: false,
            blend_mode: BlendMode::Normal,
            parent: None,
            duration: self.comp.duration,
            transform,
            groups: Vec::new(),
            masks: Vec::new(),
            order: self.next_order,
        };
        self.next_order += 1;

        if let Some(id) = self.free_layers.pop() {
            self.layers[id] = Some(slot);
            Ok(id)
        } else {
            self.layers.push(Some(slot));
            Ok(self.layers.len() - 1)
        }
    }

    fn layer_info(&self, layer: LayerId) -> HostResult<LayerInfo> {
        let slot = self.layer(layer)?;
        Ok(LayerInfo {
            id: layer,
            name: slot.name.clone(),
            kind: slot.kind.clone(),
            enabled: slot.enabled,
            three_d: slot.three_d,
            blend_mode: slot.blend_mode,
            parent: slot.parent,
            duration: slot.duration,
            groups: slot.groups.len(),
            masks: slot.masks.len(),
        })
    }

    fn layer_ids(&self) -> Vec<LayerId> {
        let mut live: Vec<(u64, LayerId)> = self
            .layers
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|s| (s.order, id)))
            .collect();
        live.sort_unstable();
        live.into_iter().map(|(_, id)| id).collect()
    }

    fn layer_count(&self) -> usize {
        self.layers.iter().filter(|l| l.is_some()).count()
    }

    fn set_layer_enabled(&mut self, layer: LayerId, enabled: bool) -> HostResult<()> {
        self.layer_mut(layer)?.enabled = enabled;
        Ok(())
    }

    fn set_three_d(&mut self, layer: LayerId, three_d: bool) -> HostResult<()> {
        self.layer_mut(layer)?.three_d = three_d;
        Ok(())
    }

    fn set_blend_mode(&mut self, layer: LayerId, mode: BlendMode) -> HostResult<()> {
        self.layer_mut(layer)?.blend_mode = mode;
        Ok(())
    }

    fn set_layer_duration(&mut self, layer: LayerId, seconds: f64) -> HostResult<()> {
        self.layer_mut(layer)?.duration = seconds;
        Ok(())
    }

    fn set_parent(&mut self, layer: LayerId, parent: Option<LayerId>) -> HostResult<()> {
        self.layer(layer)?;
        if let Some(p) = parent {
            // Walk up from the new parent; reaching `layer` would close a cycle.
            let mut current = Some(p);
            while let Some(id) = current {
                if id == layer {
                    return Err(HostError::InvalidParent {
                        child: layer,
                        parent: p,
                    });
                }
                current = self.layer(id)?.parent;
            }
        }
        self.layer_mut(layer)?.parent = parent;
        Ok(())
    }

    fn duplicate_layer(&mut self, layer: LayerId) -> HostResult<LayerId> {
        let mut copy = self.layer(layer)?.clone();
        let mut copies = BTreeMap::new();

        copy.transform = self.copy_properties(&copy.transform, &mut copies)?;
        for group in copy.groups.iter_mut() {
            group.transform = self.copy_properties(&group.transform, &mut copies)?;
            for content in group.contents.iter_mut() {
                content.props = self.copy_properties(&content.props, &mut copies)?;
            }
        }
        for mask in copy.masks.iter_mut() {
            mask.props = self.copy_properties(&mask.props, &mut copies)?;
        }
        copy.name = format!("{} copy", copy.name);
        copy.order = self.next_order;
        self.next_order += 1;

        if let Some(id) = self.free_layers.pop() {
            self.layers[id] = Some(copy);
            Ok(id)
        } else {
            self.layers.push(Some(copy));
            Ok(self.layers.len() - 1)
        }
    }

    fn remove_layer(&mut self, layer: LayerId) -> HostResult<()> {
        let slot = self.layer(layer)?;
        for id in Self::owned_properties(slot) {
            if let Some(entry) = self.properties.get_mut(id) {
                *entry = None;
                self.free_properties.push(id);
            }
        }
        self.layers[layer] = None;
        self.free_layers.push(layer);

        for other in self.layers.iter_mut().flatten() {
            if other.parent == Some(layer) {
                other.parent = None;
            }
        }
        Ok(())
    }

    fn layer_property(&self, layer: LayerId, name: &str) -> HostResult<PropertyId> {
        lookup(&self.layer(layer)?.transform, name).ok_or_else(|| HostError::UnknownAttribute {
            layer,
            name: name.to_string(),
        })
    }

    fn source_rect(&self, layer: LayerId, time: f64) -> HostResult<Rect> {
        let slot = self.layer(layer)?;
        match &slot.kind {
            LayerKind::Solid { width, height, .. } => Ok(Rect::new(0.0, 0.0, *width, *height)),
            LayerKind::Null => Ok(Rect::new(0.0, 0.0, 100.0, 100.0)),
            LayerKind::Shape => {
                let mut bounds: Option<Rect> = None;
                for (index, group) in slot.groups.iter().enumerate() {
                    let affine = self.group_affine(layer, slot, index, time)?;
                    for content in &group.contents {
                        if let Some(path) = self.content_path(content, time)? {
                            let rect = (affine * path).bounding_box();
                            bounds = Some(bounds.map_or(rect, |b| b.union(rect)));
                        }
                    }
                }
                Ok(bounds.unwrap_or(Rect::ZERO))
            }
        }
    }

    fn add_group(&mut self, layer: LayerId, parent: Option<GroupId>) -> HostResult<GroupId> {
        let slot = self.layer(layer)?;
        if slot.kind != LayerKind::Shape {
            return Err(HostError::InvalidContent(format!(
                "layer '{}' cannot hold vector groups",
                slot.name
            )));
        }
        if let Some(p) = parent {
            if p >= slot.groups.len() {
                return Err(HostError::UnknownGroup { layer, group: p });
            }
        }
        let transform = self.alloc_properties(vec![
            ("anchorpoint", PropertyValue::vec2(0.0, 0.0)),
            ("position", PropertyValue::vec2(0.0, 0.0)),
            ("scale", PropertyValue::vec2(100.0, 100.0)),
            ("rotation", PropertyValue::Scalar(0.0)),
            ("opacity", PropertyValue::Scalar(100.0)),
        ]);
        let groups = &mut self.layer_mut(layer)?.groups;
        groups.push(Group {
            parent,
            transform,
            contents: Vec::new(),
        });
        Ok(groups.len() - 1)
    }

    fn group_property(
        &self,
        layer: LayerId,
        group: GroupId,
        name: &str,
    ) -> HostResult<PropertyId> {
        let g = self
            .layer(layer)?
            .groups
            .get(group)
            .ok_or(HostError::UnknownGroup { layer, group })?;
        lookup(&g.transform, name).ok_or_else(|| HostError::UnknownAttribute {
            layer,
            name: name.to_string(),
        })
    }

    fn add_content(
        &mut self,
        layer: LayerId,
        group: GroupId,
        kind: ContentKind,
    ) -> HostResult<PropertyMap> {
        if self.layer(layer)?.groups.get(group).is_none() {
            return Err(HostError::UnknownGroup { layer, group });
        }
        let props = self.alloc_properties(Self::content_defaults(kind));
        let slot = self.layer_mut(layer)?;
        slot.groups[group].contents.push(Content {
            kind,
            props: props.clone(),
        });
        Ok(props)
    }

    fn add_mask(&mut self, layer: LayerId, mode: MaskMode) -> HostResult<PropertyMap> {
        self.layer(layer)?;
        let props = self.alloc_properties(vec![
            ("path", PropertyValue::Path(PathShape::new(Vec::new(), true))),
            ("feather", PropertyValue::vec2(0.0, 0.0)),
            ("opacity", PropertyValue::Scalar(100.0)),
            ("expansion", PropertyValue::Scalar(0.0)),
        ]);
        self.layer_mut(layer)?.masks.push(Mask {
            mode,
            props: props.clone(),
        });
        Ok(props)
    }

    fn mask_vertices(&self, layer: LayerId, time: f64) -> HostResult<Vec<Point>> {
        let mut points = Vec::new();
        for mask in &self.layer(layer)?.masks {
            if mask.mode == MaskMode::None {
                continue;
            }
            if let PropertyValue::Path(path) = self.eval_named(&mask.props, "path", time)? {
                points.extend(path.vertices);
            }
        }
        Ok(points)
    }

    fn value(&self, prop: PropertyId) -> HostResult<PropertyValue> {
        self.eval(prop, self.comp.time)
    }

    fn value_at(&self, prop: PropertyId, time: f64) -> HostResult<PropertyValue> {
        self.eval(prop, time)
    }

    fn set_value(&mut self, prop: PropertyId, value: PropertyValue) -> HostResult<()> {
        let slot = self.prop_mut(prop)?;
        if !slot.keys.is_empty() {
            return Err(HostError::TimeVarying(slot.name.clone()));
        }
        slot.value = conform(&slot.name, &slot.value, value)?;
        Ok(())
    }

    fn add_keyframe(
        &mut self,
        prop: PropertyId,
        time: f64,
        value: PropertyValue,
        easing: EasingType,
    ) -> HostResult<usize> {
        let slot = self.prop_mut(prop)?;
        let value = conform(&slot.name, &slot.value, value)?;
        animation::insert_keyframe(
            &mut slot.keys,
            PropertyKeyframe {
                time,
                value,
                easing,
            },
        );
        Ok(slot.keys.len())
    }

    fn keyframes(&self, prop: PropertyId) -> HostResult<Vec<PropertyKeyframe>> {
        Ok(self.prop(prop)?.keys.clone())
    }

    fn set_keyframe_value(
        &mut self,
        prop: PropertyId,
        index: usize,
        value: PropertyValue,
    ) -> HostResult<()> {
        let slot = self.prop_mut(prop)?;
        let value = conform(&slot.name, &slot.value, value)?;
        match slot.keys.get_mut(index) {
            Some(key) => {
                key.value = value;
                Ok(())
            }
            None => Err(HostError::KeyframeIndex {
                name: slot.name.clone(),
                index,
            }),
        }
    }

    fn expression(&self, prop: PropertyId) -> HostResult<Option<String>> {
        Ok(self.prop(prop)?.expression.clone())
    }

    fn set_expression(&mut self, prop: PropertyId, expression: Option<String>) -> HostResult<()> {
        self.prop_mut(prop)?.expression = expression;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape_layer(host: &mut MemoryHost) -> (LayerId, GroupId) {
        let layer = host.create_layer(LayerKind::Shape, "shape").unwrap();
        let group = host.add_group(layer, None).unwrap();
        (layer, group)
    }

    #[test]
    fn layer_defaults_center_position() {
        let mut host = MemoryHost::default();
        let layer = host.create_layer(LayerKind::Shape, "a").unwrap();
        let pos = host
            .value(host.layer_property(layer, "position").unwrap())
            .unwrap();
        assert_eq!(pos, PropertyValue::vec3(960.0, 540.0, 0.0));
        assert_eq!(
            host.layer_property(layer, "rotation").unwrap(),
            host.layer_property(layer, "zrotation").unwrap()
        );
    }

    #[test]
    fn short_vector_write_keeps_z() {
        let mut host = MemoryHost::default();
        let layer = host.create_layer(LayerKind::Shape, "a").unwrap();
        let pos = host.layer_property(layer, "position").unwrap();
        host.set_value(pos, PropertyValue::vec3(1.0, 2.0, 7.0)).unwrap();
        host.set_value(pos, PropertyValue::vec2(5.0, 6.0)).unwrap();
        assert_eq!(host.value(pos).unwrap(), PropertyValue::vec3(5.0, 6.0, 7.0));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut host = MemoryHost::default();
        let layer = host.create_layer(LayerKind::Shape, "a").unwrap();
        let opacity = host.layer_property(layer, "opacity").unwrap();
        let err = host.set_value(opacity, PropertyValue::vec2(1.0, 1.0));
        assert!(matches!(err, Err(HostError::KindMismatch { .. })));
    }

    #[test]
    fn keyed_property_rejects_static_write() {
        let mut host = MemoryHost::default();
        let layer = host.create_layer(LayerKind::Shape, "a").unwrap();
        let opacity = host.layer_property(layer, "opacity").unwrap();
        host.set_value_at_time(opacity, 0.0, PropertyValue::Scalar(0.0))
            .unwrap();
        host.set_value_at_time(opacity, 1.0, PropertyValue::Scalar(100.0))
            .unwrap();
        assert!(matches!(
            host.set_value(opacity, PropertyValue::Scalar(5.0)),
            Err(HostError::TimeVarying(_))
        ));
        let mid = host.value_at(opacity, 0.5).unwrap().as_scalar().unwrap();
        assert!((mid - 50.0).abs() < 1e-6);
    }

    #[test]
    fn rect_bounds_follow_group_transform() {
        let mut host = MemoryHost::default();
        let (layer, group) = shape_layer(&mut host);
        let rect = host.add_content(layer, group, ContentKind::Rect).unwrap();
        host.set_value(rect["size"], PropertyValue::vec2(40.0, 20.0))
            .unwrap();
        let group_pos = host.group_property(layer, group, "position").unwrap();
        host.set_value(group_pos, PropertyValue::vec2(10.0, 10.0))
            .unwrap();

        let bounds = host.source_rect(layer, 0.0).unwrap();
        assert!((bounds.x0 - -10.0).abs() < 1e-9);
        assert!((bounds.y0 - 0.0).abs() < 1e-9);
        assert!((bounds.width() - 40.0).abs() < 1e-9);
        assert!((bounds.height() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn solid_bounds_start_at_origin() {
        let mut host = MemoryHost::default();
        let layer = host
            .create_layer(
                LayerKind::Solid {
                    width: 300.0,
                    height: 200.0,
                    color: Color::BLACK,
                },
                "solid",
            )
            .unwrap();
        assert_eq!(
            host.source_rect(layer, 0.0).unwrap(),
            Rect::new(0.0, 0.0, 300.0, 200.0)
        );
        assert!(host.add_group(layer, None).is_err());
    }

    #[test]
    fn duplicate_copies_values_and_keys() {
        let mut host = MemoryHost::default();
        let (layer, group) = shape_layer(&mut host);
        host.add_content(layer, group, ContentKind::Ellipse).unwrap();
        let pos = host.layer_property(layer, "position").unwrap();
        host.set_value_at_time(pos, 0.0, PropertyValue::vec3(0.0, 0.0, 0.0))
            .unwrap();

        let copy = host.duplicate_layer(layer).unwrap();
        let copy_pos = host.layer_property(copy, "position").unwrap();
        assert_ne!(copy_pos, pos);
        assert_eq!(host.keyframes(copy_pos).unwrap().len(), 1);
        assert_eq!(host.layer_info(copy).unwrap().groups, 1);
        assert_eq!(
            host.layer_property(copy, "rotation").unwrap(),
            host.layer_property(copy, "zrotation").unwrap()
        );
    }

    #[test]
    fn remove_frees_slots_and_clears_children() {
        let mut host = MemoryHost::default();
        let parent = host.create_layer(LayerKind::Null, "null").unwrap();
        let child = host.create_layer(LayerKind::Shape, "child").unwrap();
        host.set_parent(child, Some(parent)).unwrap();
        assert!(host.set_parent(parent, Some(child)).is_err());

        host.remove_layer(parent).unwrap();
        assert_eq!(host.layer_info(child).unwrap().parent, None);
        assert_eq!(host.layer_count(), 1);

        let reused = host.create_layer(LayerKind::Shape, "next").unwrap();
        assert_eq!(reused, parent);
        assert_eq!(host.layer_ids(), vec![child, reused]);
    }

    #[test]
    fn inactive_masks_are_ignored() {
        let mut host = MemoryHost::default();
        let layer = host.create_layer(LayerKind::Shape, "a").unwrap();
        let on = host.add_mask(layer, MaskMode::Add).unwrap();
        let off = host.add_mask(layer, MaskMode::None).unwrap();
        let square = PathShape::new(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
            true,
        );
        host.set_value(on["path"], PropertyValue::Path(square.clone()))
            .unwrap();
        host.set_value(off["path"], PropertyValue::Path(square.translated(Vec2::new(50.0, 50.0))))
            .unwrap();
        assert_eq!(host.mask_vertices(layer, 0.0).unwrap(), square.vertices);
    }
}
