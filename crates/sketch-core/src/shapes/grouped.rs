use super::builder::{layer_name, LayerBuilder};
use crate::animation::PropertyValue;
use crate::errors::{SketchError, SketchResult};
use crate::host::{lock_host, ContentKind, LayerKind};
use crate::properties::ShapeHandle;
use crate::recorder::Recording;
use crate::session::Session;
use crate::types::{DrawMode, PathShape};
use glam::DVec3;
use kurbo::Vec2;
use tracing::{debug, instrument, warn};

impl Session {
    /// Builds what was recorded since `begin_shape` and returns to idle.
    ///
    /// Freeform recordings become one path layer. Lines, quads and triangles become
    /// one layer with a sub-group per consecutive vertex group, styled with the
    /// matching style snapshot; the per-group handles are kept for `last_shape`.
    /// Without an active recording nothing is built and `None` is returned.
    ///
    /// The buffers and the inactive flag are cleared on every exit, including a
    /// vertex count the mode cannot partition.
    pub fn end_shape(&mut self, closed: bool) -> SketchResult<Option<ShapeHandle>> {
        self.last_shapes.clear();
        let recording = self.recorder.finish();
        let Some(mode) = recording.mode else {
            warn!("end_shape() without begin_shape() builds nothing");
            return Ok(None);
        };

        let shape = match mode.group_size() {
            None => {
                let mut path = PathShape::new(recording.vertices.clone(), closed);
                if let Some((inn, out)) = recording.freeform_tangents() {
                    path = path.with_tangents(inn, out);
                }
                let mut ctx = self.context();
                ctx.inactive = recording.inactive;
                self.build_path(path, ctx)?
            }
            Some(size) => self.build_groups(mode, size, &recording)?,
        };
        Ok(Some(shape))
    }

    #[instrument(level = "debug", skip(self, recording), fields(vertices = recording.vertices.len()))]
    fn build_groups(
        &mut self,
        mode: DrawMode,
        size: usize,
        recording: &Recording,
    ) -> SketchResult<ShapeHandle> {
        let count = recording.vertices.len();
        if count % size != 0 {
            return Err(SketchError::validation(format!(
                "bad number of vertex points for this drawing mode: {:?} takes multiples of {}, got {}",
                mode, size, count
            )));
        }

        let ctx = self.context();
        let translation = ctx.matrix.translation();
        let offset = Vec2::new(translation.x, translation.y);
        let lines = mode == DrawMode::Lines;

        let shared = self.host().clone();
        let mut host = lock_host(&shared)?;
        let name = layer_name(&*host, "shape");
        let mut b = LayerBuilder::create(&mut *host, &shared, ctx, LayerKind::Shape, &name)?;
        let general = b.add_group(None)?;

        let mut groups = Vec::with_capacity(count / size);
        for (index, chunk) in recording.vertices.chunks(size).enumerate() {
            let group = b.add_group(Some(general))?;
            let content = b.add_content(group, ContentKind::Path)?;
            let path = PathShape::new(chunk.to_vec(), !lines).translated(offset);

            let style = self.style.snapshot_at(index);
            let paint = if lines {
                b.add_paint(group, &style, true, false)?
            } else {
                b.add_paint(group, &style, style.stroke_enabled, style.fill_enabled)?
            };
            let mut handle = b.group_handle(group, &paint)?;
            if let Some(&id) = content.get("path") {
                b.host().set_value(id, PropertyValue::Path(path))?;
                handle.insert("path", id);
            }
            groups.push(handle);
        }
        b.collect_transform()?;

        b.set_position_raw(DVec3::new(0.0, 0.0, translation.z))?;
        b.reposition_anchor()?;
        let handle = b.finish()?;
        debug!(groups = groups.len(), "grouped shape built");
        self.last_shapes = groups;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use crate::animation::PropertyValue;
    use crate::session::{Session, SessionConfig};
    use crate::types::{BeginMode, DrawMode};

    fn session() -> Session {
        Session::in_memory(SessionConfig::default()).unwrap()
    }

    #[test]
    fn end_without_begin_builds_nothing() {
        let mut s = session();
        assert!(s.end_shape(false).unwrap().is_none());
    }

    #[test]
    fn triangles_are_closed_and_translated() {
        let mut s = session();
        s.translate(5.0, 0.0, 0.0);
        s.begin_shape(BeginMode::Draw(DrawMode::Triangles));
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)] {
            s.vertex(x, y);
        }
        let layer = s.end_shape(false).unwrap().unwrap();
        assert!(layer.contains("position"));
        assert_eq!(s.last_shape().len(), 1);
        let group = &s.last_shape()[0];
        assert!(group.contains("fill"));
        assert!(group.contains("anchorpoint"));
        for name in ["linecap", "linejoin", "miterlimit"] {
            assert!(group.contains(name), "{}", name);
        }
        assert_eq!(
            group.require("miterlimit").unwrap().value().unwrap(),
            PropertyValue::Scalar(4.0)
        );
        assert_eq!(layer.layer().info().unwrap().groups, 2);
    }

    #[test]
    fn freeform_clears_previous_groups() {
        let mut s = session();
        s.begin_shape(BeginMode::Draw(DrawMode::Lines));
        s.vertex(0.0, 0.0);
        s.vertex(1.0, 1.0);
        s.end_shape(false).unwrap();
        assert_eq!(s.last_shape().len(), 1);
        assert!(!s.last_shape()[0].contains("fill"));

        s.begin_shape(BeginMode::default());
        s.vertex(0.0, 0.0);
        let shape = s.end_shape(false).unwrap().unwrap();
        assert!(s.last_shape().is_empty());
        let path = shape.require("path").unwrap().value().unwrap();
        assert!(matches!(path, PropertyValue::Path(p) if !p.closed));
    }

    #[test]
    fn inactive_build_is_disabled() {
        let mut s = session();
        s.begin_shape(BeginMode::Inactive);
        assert!(s.is_recording());
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)] {
            s.vertex(x, y);
        }
        let shape = s.end_shape(false).unwrap().unwrap();
        assert!(!shape.layer().enabled().unwrap());
        assert!(s.last_shape().is_empty());
        let path = shape.require("path").unwrap().value().unwrap();
        assert!(matches!(path, PropertyValue::Path(p) if p.vertices.len() == 3));

        let next = s
            .shape(crate::shapes::ShapeForm::Vertices(vec![kurbo::Point::new(1.0, 1.0)]))
            .unwrap();
        assert!(next.layer().enabled().unwrap());
    }

    #[test]
    fn inactive_path_can_feed_keyframes() {
        let mut s = session();
        s.begin_shape(BeginMode::Inactive);
        s.vertex(0.0, 0.0);
        s.vertex(50.0, 50.0);
        let template = s.end_shape(true).unwrap().unwrap();
        let shape = template.require("path").unwrap().value().unwrap();

        s.begin_shape(BeginMode::default());
        s.vertex(0.0, 0.0);
        s.vertex(1.0, 1.0);
        let visible = s.end_shape(true).unwrap().unwrap();
        assert!(visible.layer().enabled().unwrap());
        let path = visible.require("path").unwrap();
        path.add_keyframe(1.0, shape.clone()).unwrap();
        assert_eq!(path.value_at(1.0).unwrap(), shape);
    }
}
