use crate::anchor;
use crate::animation::PropertyValue;
use crate::errors::SketchResult;
use crate::host::lock_host;
use crate::properties::{LayerHandle, ShapeHandle};
use crate::session::Session;
use crate::types::{BeginMode, DrawMode, MaskMode, PathShape};
use kurbo::{Point, Vec2};
use tracing::{debug, warn};

/// Call forms of `mask`. Forms without an explicit flag build a closed mask.
#[derive(Clone, Debug, PartialEq)]
pub enum MaskForm {
    /// `mask(layer, vertices)`
    Vertices(Vec<Point>),
    /// `mask(layer, vertices, closed)`
    VerticesClosed(Vec<Point>, bool),
    /// `mask(layer, vertices, tangents)`: the tangents serve as in and out tangents.
    Tangents(Vec<Point>, Vec<Vec2>),
    /// `mask(layer, vertices, in, out)`
    InOut {
        vertices: Vec<Point>,
        in_tangents: Vec<Vec2>,
        out_tangents: Vec<Vec2>,
    },
    /// `mask(layer, vertices, in, out, closed)`
    InOutClosed {
        vertices: Vec<Point>,
        in_tangents: Vec<Vec2>,
        out_tangents: Vec<Vec2>,
        closed: bool,
    },
}

impl MaskForm {
    pub fn into_path(self) -> PathShape {
        match self {
            MaskForm::Vertices(vertices) => PathShape::new(vertices, true),
            MaskForm::VerticesClosed(vertices, closed) => PathShape::new(vertices, closed),
            MaskForm::Tangents(vertices, tangents) => {
                PathShape::new(vertices, true).with_tangents(tangents.clone(), tangents)
            }
            MaskForm::InOut {
                vertices,
                in_tangents,
                out_tangents,
            } => PathShape::new(vertices, true).with_tangents(in_tangents, out_tangents),
            MaskForm::InOutClosed {
                vertices,
                in_tangents,
                out_tangents,
                closed,
            } => PathShape::new(vertices, closed).with_tangents(in_tangents, out_tangents),
        }
    }
}

const MASK_ATTRIBUTES: [&str; 4] = ["path", "feather", "opacity", "expansion"];

impl Session {
    /// Adds a mask to `layer` in the current mask mode and re-anchors the layer.
    ///
    /// The returned handle shares the target layer and exposes `path`, `feather`,
    /// `opacity` and `expansion`. Mask vertices are in layer space and ignore the
    /// transform stack.
    pub fn mask(&mut self, layer: &LayerHandle, form: MaskForm) -> SketchResult<ShapeHandle> {
        self.add_mask_path(layer, form.into_path())
    }

    fn add_mask_path(&mut self, layer: &LayerHandle, path: PathShape) -> SketchResult<ShapeHandle> {
        let mut host = lock_host(&layer.host)?;
        let props = host.add_mask(layer.id, self.settings.mask_mode)?;
        let mut handle = ShapeHandle::new(layer.clone());
        if let Some(&id) = props.get("path") {
            host.set_value(id, PropertyValue::Path(path))?;
        }
        for name in MASK_ATTRIBUTES {
            if let Some(&id) = props.get(name) {
                handle.insert(name, id);
            }
        }
        anchor::reposition_anchor(&mut *host, layer.id, self.settings.anchor_mode)?;
        debug!(layer = layer.id, mode = ?self.settings.mask_mode, "mask added");
        Ok(handle)
    }

    /// Starts recording mask vertices, switching the mask mode when one is given.
    pub fn begin_mask(&mut self, mode: Option<MaskMode>) {
        if let Some(mode) = mode {
            self.settings.mask_mode = mode;
        }
        self.style.reset();
        let discarded = self.recorder.begin(BeginMode::Draw(DrawMode::Freeform));
        if discarded > 0 {
            warn!(discarded, "begin_mask: discarding vertices of an unfinished shape");
        }
    }

    /// Turns the recorded vertices into a mask on `layer`. Returns `None` when
    /// nothing was being recorded.
    pub fn end_mask(&mut self, layer: &LayerHandle, closed: bool) -> SketchResult<Option<ShapeHandle>> {
        let recording = self.recorder.finish();
        if recording.mode.is_none() {
            warn!("end_mask() without begin_mask() builds nothing");
            return Ok(None);
        }
        let mut path = PathShape::new(recording.vertices.clone(), closed);
        if let Some((inn, out)) = recording.freeform_tangents() {
            path = path.with_tangents(inn, out);
        }
        self.add_mask_path(layer, path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;
    use crate::shapes::SolidForm;
    use crate::types::AnchorMode;

    #[test]
    fn mask_on_solid_reanchors() {
        let mut s = Session::in_memory(SessionConfig::sized("m", 200.0, 100.0)).unwrap();
        let solid = s.solid(SolidForm::Full).unwrap();
        s.anchor_mode(AnchorMode::TOP_LEFT);
        let mask = s
            .mask(
                solid.layer(),
                MaskForm::Vertices(vec![
                    Point::new(20.0, 10.0),
                    Point::new(60.0, 10.0),
                    Point::new(60.0, 50.0),
                ]),
            )
            .unwrap();
        assert_eq!(mask.names().len(), 4);
        let path = mask.require("path").unwrap().value().unwrap();
        assert!(matches!(path, PropertyValue::Path(p) if p.closed && p.vertices.len() == 3));
        assert_eq!(
            solid.require("anchorpoint").unwrap().value().unwrap(),
            PropertyValue::vec3(20.0, 10.0, 0.0)
        );
    }

    #[test]
    fn recorded_mask_uses_in_tangents_for_both() {
        let mut s = Session::in_memory(SessionConfig::default()).unwrap();
        let solid = s.solid(SolidForm::Full).unwrap();
        s.begin_mask(Some(MaskMode::Subtract));
        s.vertex(0.0, 0.0);
        s.vertex(10.0, 0.0);
        s.itangent(1.0, 1.0);
        let mask = s.end_mask(solid.layer(), true).unwrap().unwrap();
        assert_eq!(s.settings().mask_mode, MaskMode::Subtract);
        let PropertyValue::Path(path) = mask.require("path").unwrap().value().unwrap() else {
            panic!("mask path is not a path");
        };
        assert_eq!(path.in_tangents, path.out_tangents);
        assert!(s.end_mask(solid.layer(), true).unwrap().is_none());
    }
}
