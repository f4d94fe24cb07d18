use crate::anchor;
use crate::animation::PropertyValue;
use crate::errors::SketchResult;
use crate::host::{ContentKind, GroupId, HostStore, LayerId, LayerKind, PropertyMap, SharedHost};
use crate::properties::{LayerHandle, ShapeHandle};
use crate::session::{BuildContext, TRANSFORM_2D, TRANSFORM_3D};
use crate::style::StyleSnapshot;
use glam::DVec3;

/// Transform attributes of a vector group.
pub(crate) const GROUP_TRANSFORM: [&str; 5] = ["anchorpoint", "position", "scale", "rotation", "opacity"];

/// `<base>_<n>` where `n` is the layer count once the new layer exists.
pub(crate) fn layer_name(host: &dyn HostStore, base: &str) -> String {
    format!("{}_{}", base, host.layer_count() + 1)
}

/// Stroke and fill created for one group.
#[derive(Clone, Debug, Default)]
pub(crate) struct Paint {
    pub stroke: Option<PropertyMap>,
    pub fill: Option<PropertyMap>,
}

/// One layer under construction. Holds the locked host for the whole build.
pub(crate) struct LayerBuilder<'h> {
    host: &'h mut dyn HostStore,
    ctx: BuildContext,
    layer: LayerId,
    shape: ShapeHandle,
}

impl<'h> LayerBuilder<'h> {
    /// Creates the layer and switches it to 3D when the gate is on.
    pub fn create(
        host: &'h mut dyn HostStore,
        shared: &SharedHost,
        ctx: BuildContext,
        kind: LayerKind,
        name: &str,
    ) -> SketchResult<Self> {
        let layer = host.create_layer(kind, name)?;
        if ctx.settings.three_d {
            host.set_three_d(layer, true)?;
        }
        Ok(Self {
            host,
            ctx,
            layer,
            shape: ShapeHandle::new(LayerHandle::new(shared.clone(), layer)),
        })
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn host(&mut self) -> &mut dyn HostStore {
        &mut *self.host
    }

    pub fn add_group(&mut self, parent: Option<GroupId>) -> SketchResult<GroupId> {
        Ok(self.host.add_group(self.layer, parent)?)
    }

    pub fn add_content(&mut self, group: GroupId, kind: ContentKind) -> SketchResult<PropertyMap> {
        Ok(self.host.add_content(self.layer, group, kind)?)
    }

    /// Adds the stroke (color, weight, cap) and, when allowed, the fill `style` enables.
    pub fn add_paint(
        &mut self,
        group: GroupId,
        style: &StyleSnapshot,
        stroke: bool,
        fill: bool,
    ) -> SketchResult<Paint> {
        let mut paint = Paint::default();
        if stroke {
            let props = self.add_content(group, ContentKind::Stroke)?;
            self.write(&props, "color", PropertyValue::Color(style.stroke_color))?;
            self.write(&props, "weight", PropertyValue::Scalar(style.stroke_weight))?;
            self.write(
                &props,
                "linecap",
                PropertyValue::Scalar(self.ctx.settings.cap_mode.code()),
            )?;
            paint.stroke = Some(props);
        }
        if fill {
            let props = self.add_content(group, ContentKind::Fill)?;
            self.write(&props, "color", PropertyValue::Color(style.fill_color))?;
            paint.fill = Some(props);
        }
        Ok(paint)
    }

    /// Stroke and fill driven by the live style.
    pub fn add_style_paint(&mut self, group: GroupId) -> SketchResult<Paint> {
        let style = self.ctx.style;
        self.add_paint(group, &style, style.stroke_enabled, style.fill_enabled)
    }

    fn write(&mut self, props: &PropertyMap, name: &str, value: PropertyValue) -> SketchResult<()> {
        if let Some(&id) = props.get(name) {
            self.host.set_value(id, value)?;
        }
        Ok(())
    }

    /// Sets `name` from `props` and exposes it on the handle.
    pub fn expose_value(
        &mut self,
        props: &PropertyMap,
        name: &str,
        value: PropertyValue,
    ) -> SketchResult<()> {
        self.write(props, name, value)?;
        self.expose(props, name, name);
        Ok(())
    }

    /// Exposes `props[name]` as `attribute`.
    pub fn expose(&mut self, props: &PropertyMap, name: &str, attribute: &str) {
        if let Some(&id) = props.get(name) {
            self.shape.insert(attribute, id);
        }
    }

    /// `stroke`, `weight` and `fill` attributes.
    pub fn expose_paint(&mut self, paint: &Paint) {
        if let Some(stroke) = &paint.stroke {
            self.expose(stroke, "color", "stroke");
            self.expose(stroke, "weight", "weight");
        }
        if let Some(fill) = &paint.fill {
            self.expose(fill, "color", "fill");
        }
    }

    /// Exposes the transform attributes for the current 3D gate.
    pub fn collect_transform(&mut self) -> SketchResult<()> {
        let names: &[&str] = if self.ctx.settings.three_d {
            &TRANSFORM_3D
        } else {
            &TRANSFORM_2D
        };
        for name in names {
            let id = self.host.layer_property(self.layer, name)?;
            self.shape.insert(*name, id);
        }
        Ok(())
    }

    fn set_layer(&mut self, name: &str, value: PropertyValue) -> SketchResult<()> {
        let id = self.host.layer_property(self.layer, name)?;
        self.host.set_value(id, value)?;
        Ok(())
    }

    pub fn set_anchor(&mut self, x: f64, y: f64) -> SketchResult<()> {
        self.set_layer("anchorpoint", PropertyValue::vec3(x, y, 0.0))
    }

    /// Writes the layer position without the transform translation.
    pub fn set_position_raw(&mut self, position: DVec3) -> SketchResult<()> {
        self.set_layer(
            "position",
            PropertyValue::vec3(position.x, position.y, position.z),
        )
    }

    /// Writes `requested` plus the current translation as the layer position.
    pub fn place(&mut self, requested: DVec3) -> SketchResult<()> {
        self.set_position_raw(requested + self.ctx.matrix.translation())
    }

    /// Moves the anchor to the session anchor mode.
    pub fn reposition_anchor(&mut self) -> SketchResult<()> {
        anchor::reposition_anchor(&mut *self.host, self.layer, self.ctx.settings.anchor_mode)
    }

    /// Handle for one vector group: its paint attributes plus its own transform.
    pub fn group_handle(&mut self, group: GroupId, paint: &Paint) -> SketchResult<ShapeHandle> {
        let mut handle = ShapeHandle::new(self.shape.layer().clone());
        if let Some(stroke) = &paint.stroke {
            let attributes = [
                ("color", "stroke"),
                ("weight", "weight"),
                ("linecap", "linecap"),
                ("linejoin", "linejoin"),
                ("miterlimit", "miterlimit"),
            ];
            for (name, attribute) in attributes {
                if let Some(&id) = stroke.get(name) {
                    handle.insert(attribute, id);
                }
            }
        }
        if let Some(&id) = paint.fill.as_ref().and_then(|fill| fill.get("color")) {
            handle.insert("fill", id);
        }
        for name in GROUP_TRANSFORM {
            handle.insert(name, self.host.group_property(self.layer, group, name)?);
        }
        Ok(handle)
    }

    /// Hands out the handle without touching the layer transform.
    pub fn into_handle(self) -> ShapeHandle {
        self.shape
    }

    /// Writes scale and rotation from the matrix, the session opacity and blend mode,
    /// disables the layer for inactive builds and hands out the handle.
    pub fn finish(mut self) -> SketchResult<ShapeHandle> {
        let m = self.ctx.matrix;
        self.set_layer(
            "scale",
            PropertyValue::vec3(m.scale.x, m.scale.y, m.scale.z),
        )?;
        if self.ctx.settings.three_d {
            self.set_layer("xrotation", PropertyValue::Scalar(m.rotation3d.x))?;
            self.set_layer("yrotation", PropertyValue::Scalar(m.rotation3d.y))?;
            self.set_layer("zrotation", PropertyValue::Scalar(m.rotation3d.z))?;
        } else {
            self.set_layer("rotation", PropertyValue::Scalar(m.rotation))?;
        }
        self.set_layer("opacity", PropertyValue::Scalar(self.ctx.settings.opacity))?;
        self.host
            .set_blend_mode(self.layer, self.ctx.settings.blend_mode)?;
        if self.ctx.inactive {
            self.host.set_layer_enabled(self.layer, false)?;
        }
        Ok(self.shape)
    }
}
