use crate::animation::PropertyValue;
use crate::errors::SketchResult;
use crate::host::{HostStore, LayerId, LayerKind};
use crate::types::AnchorMode;
use glam::DVec2;
use kurbo::Rect;
use tracing::{debug, instrument};

/// Box the anchor grid is laid over: active mask vertices clamped to the content
/// bounds, or the content bounds when the layer has no active mask.
pub fn anchor_bounds(host: &dyn HostStore, layer: LayerId, time: f64) -> SketchResult<Rect> {
    let content = host.source_rect(layer, time)?;
    let vertices = host.mask_vertices(layer, time)?;
    if vertices.is_empty() {
        return Ok(content);
    }

    let (mut xl, mut yl) = (f64::INFINITY, f64::INFINITY);
    let (mut xh, mut yh) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in &vertices {
        xl = xl.min(p.x);
        xh = xh.max(p.x);
        yl = yl.min(p.y);
        yh = yh.max(p.y);
    }
    if host.layer_info(layer)?.kind == LayerKind::Shape {
        xl = xl.max(content.x0);
        xh = xh.min(content.x1);
        yl = yl.max(content.y0);
        yh = yh.min(content.y1);
    }
    Ok(Rect::new(xl, yl, xh, yh))
}

/// Moves the anchor point of `layer` to the `mode` cell of its bounds without
/// moving the layer visually.
///
/// A keyframed anchor gets a keyframe at the current time instead. Otherwise the
/// anchor delta, scaled and rotated like the layer, is added to the static
/// position or to every position keyframe.
#[instrument(level = "debug", skip(host))]
pub fn reposition_anchor(
    host: &mut dyn HostStore,
    layer: LayerId,
    mode: AnchorMode,
) -> SketchResult<()> {
    let time = host.composition().time;
    let bounds = anchor_bounds(host, layer, time)?;
    let (fx, fy) = mode.fractions();
    let target = DVec2::new(
        bounds.x0 + fx * bounds.width(),
        bounds.y0 + fy * bounds.height(),
    );

    let anchor_prop = host.layer_property(layer, "anchorpoint")?;
    if host.is_time_varying(anchor_prop)? {
        host.set_value_at_time(anchor_prop, time, PropertyValue::vec2(target.x, target.y))?;
        return Ok(());
    }

    let anchor = host.value(anchor_prop)?;
    let scale = host.value(host.layer_property(layer, "scale")?)?;
    let rotation = host
        .value(host.layer_property(layer, "rotation")?)?
        .as_scalar()
        .unwrap_or(0.0);

    let scaled = DVec2::new(
        (target.x - anchor.component(0)) * scale.component(0) / 100.0,
        (target.y - anchor.component(1)) * scale.component(1) / 100.0,
    );
    let delta = DVec2::from_angle(rotation.to_radians()).rotate(scaled);
    debug!(layer, ?target, ?delta, "anchor moved");

    host.set_value(anchor_prop, PropertyValue::vec2(target.x, target.y))?;

    let position_prop = host.layer_property(layer, "position")?;
    let keys = host.keyframes(position_prop)?;
    if keys.is_empty() {
        let position = host.value(position_prop)?;
        host.set_value(position_prop, shifted(&position, delta))?;
    } else {
        for (index, key) in keys.iter().enumerate() {
            host.set_keyframe_value(position_prop, index, shifted(&key.value, delta))?;
        }
    }
    Ok(())
}

fn shifted(position: &PropertyValue, delta: DVec2) -> PropertyValue {
    let mut components = position.as_vector().map(<[f64]>::to_vec).unwrap_or_default();
    components.resize(components.len().max(2), 0.0);
    components[0] += delta.x;
    components[1] += delta.y;
    PropertyValue::Vector(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ContentKind, MemoryHost};
    use crate::types::{MaskMode, PathShape};
    use kurbo::Point;

    /// Shape layer with a 40×20 rect centered on the layer origin, at comp (100, 100).
    fn rect_layer(host: &mut MemoryHost) -> LayerId {
        let layer = host.create_layer(LayerKind::Shape, "rect").unwrap();
        let group = host.add_group(layer, None).unwrap();
        let rect = host.add_content(layer, group, ContentKind::Rect).unwrap();
        host.set_value(rect["size"], PropertyValue::vec2(40.0, 20.0))
            .unwrap();
        let pos = host.layer_property(layer, "position").unwrap();
        host.set_value(pos, PropertyValue::vec3(100.0, 100.0, 0.0))
            .unwrap();
        layer
    }

    fn value(host: &MemoryHost, layer: LayerId, name: &str) -> PropertyValue {
        host.value(host.layer_property(layer, name).unwrap()).unwrap()
    }

    #[test]
    fn top_left_compensates_position() {
        let mut host = MemoryHost::default();
        let layer = rect_layer(&mut host);
        reposition_anchor(&mut host, layer, AnchorMode::TOP_LEFT).unwrap();
        assert_eq!(value(&host, layer, "anchorpoint"), PropertyValue::vec3(-20.0, -10.0, 0.0));
        assert_eq!(value(&host, layer, "position"), PropertyValue::vec3(80.0, 90.0, 0.0));
    }

    #[test]
    fn delta_follows_scale() {
        let mut host = MemoryHost::default();
        let layer = rect_layer(&mut host);
        let scale = host.layer_property(layer, "scale").unwrap();
        host.set_value(scale, PropertyValue::vec3(200.0, 200.0, 100.0))
            .unwrap();
        reposition_anchor(&mut host, layer, AnchorMode::BOTTOM_RIGHT).unwrap();
        assert_eq!(value(&host, layer, "position"), PropertyValue::vec3(140.0, 120.0, 0.0));
    }

    #[test]
    fn keyframed_position_is_shifted_per_key() {
        let mut host = MemoryHost::default();
        let layer = rect_layer(&mut host);
        let pos = host.layer_property(layer, "position").unwrap();
        host.set_value_at_time(pos, 0.0, PropertyValue::vec3(0.0, 0.0, 0.0))
            .unwrap();
        host.set_value_at_time(pos, 1.0, PropertyValue::vec3(50.0, 0.0, 0.0))
            .unwrap();
        reposition_anchor(&mut host, layer, AnchorMode::LEFT).unwrap();
        let keys = host.keyframes(pos).unwrap();
        assert_eq!(keys[0].value, PropertyValue::vec3(-20.0, 0.0, 0.0));
        assert_eq!(keys[1].value, PropertyValue::vec3(30.0, 0.0, 0.0));
    }

    #[test]
    fn keyframed_anchor_gets_a_key() {
        let mut host = MemoryHost::default();
        let layer = rect_layer(&mut host);
        let anchor = host.layer_property(layer, "anchorpoint").unwrap();
        host.set_value_at_time(anchor, 2.0, PropertyValue::vec3(0.0, 0.0, 0.0))
            .unwrap();
        reposition_anchor(&mut host, layer, AnchorMode::TOP).unwrap();
        assert_eq!(host.keyframes(anchor).unwrap().len(), 2);
        assert_eq!(value(&host, layer, "position"), PropertyValue::vec3(100.0, 100.0, 0.0));
    }

    #[test]
    fn masks_narrow_the_box() {
        let mut host = MemoryHost::default();
        let layer = rect_layer(&mut host);
        let mask = host.add_mask(layer, MaskMode::Add).unwrap();
        let path = PathShape::new(
            vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(50.0, 5.0)],
            true,
        );
        host.set_value(mask["path"], PropertyValue::Path(path)).unwrap();
        let bounds = anchor_bounds(&host, layer, 0.0).unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 20.0, 5.0));
    }
}
