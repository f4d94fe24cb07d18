use super::builder::{layer_name, LayerBuilder};
use crate::animation::PropertyValue;
use crate::errors::{SketchError, SketchResult};
use crate::host::{lock_host, ContentKind, LayerKind};
use crate::properties::ShapeHandle;
use crate::session::{BuildContext, Session};
use crate::types::PathShape;
use glam::DVec3;
use kurbo::{Point, Vec2};
use tracing::debug;

/// Call forms of `rect`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RectForm {
    /// `rect(x, y)`: composition-sized.
    At { x: f64, y: f64 },
    /// `rect(x, y, w, h)`
    Sized { x: f64, y: f64, w: f64, h: f64 },
    /// `rect(x, y, w, h, round)`
    Rounded { x: f64, y: f64, w: f64, h: f64, round: f64 },
    /// `rect(x, y, z)` in 3D mode.
    At3d { x: f64, y: f64, z: f64 },
    /// `rect(x, y, z, w, h)` in 3D mode.
    Sized3d { x: f64, y: f64, z: f64, w: f64, h: f64 },
    /// `rect(x, y, z, w, h, round)` in 3D mode.
    Rounded3d { x: f64, y: f64, z: f64, w: f64, h: f64, round: f64 },
}

impl RectForm {
    /// Resolves a positional call by argument count under the given 3D gate.
    pub fn from_args(args: &[f64], three_d: bool) -> SketchResult<Self> {
        let form = match (three_d, args) {
            (false, &[x, y]) => RectForm::At { x, y },
            (false, &[x, y, w, h]) => RectForm::Sized { x, y, w, h },
            (false, &[x, y, w, h, round]) => RectForm::Rounded { x, y, w, h, round },
            (true, &[x, y, z]) => RectForm::At3d { x, y, z },
            (true, &[x, y, z, w, h]) => RectForm::Sized3d { x, y, z, w, h },
            (true, &[x, y, z, w, h, round]) => RectForm::Rounded3d { x, y, z, w, h, round },
            _ => return Err(no_form("rect", args.len(), three_d)),
        };
        Ok(form)
    }

    pub fn is_3d(&self) -> bool {
        matches!(
            self,
            RectForm::At3d { .. } | RectForm::Sized3d { .. } | RectForm::Rounded3d { .. }
        )
    }

    /// `(position, size, roundness)`; missing sizes fall back to `comp`.
    fn resolve(self, comp: (f64, f64)) -> (DVec3, (f64, f64), f64) {
        match self {
            RectForm::At { x, y } => (DVec3::new(x, y, 0.0), comp, 0.0),
            RectForm::Sized { x, y, w, h } => (DVec3::new(x, y, 0.0), (w, h), 0.0),
            RectForm::Rounded { x, y, w, h, round } => (DVec3::new(x, y, 0.0), (w, h), round),
            RectForm::At3d { x, y, z } => (DVec3::new(x, y, z), comp, 0.0),
            RectForm::Sized3d { x, y, z, w, h } => (DVec3::new(x, y, z), (w, h), 0.0),
            RectForm::Rounded3d { x, y, z, w, h, round } => (DVec3::new(x, y, z), (w, h), round),
        }
    }
}

/// Call forms of `ellipse`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EllipseForm {
    At { x: f64, y: f64 },
    Sized { x: f64, y: f64, w: f64, h: f64 },
    At3d { x: f64, y: f64, z: f64 },
    Sized3d { x: f64, y: f64, z: f64, w: f64, h: f64 },
}

impl EllipseForm {
    pub fn from_args(args: &[f64], three_d: bool) -> SketchResult<Self> {
        let form = match (three_d, args) {
            (false, &[x, y]) => EllipseForm::At { x, y },
            (false, &[x, y, w, h]) => EllipseForm::Sized { x, y, w, h },
            (true, &[x, y, z]) => EllipseForm::At3d { x, y, z },
            (true, &[x, y, z, w, h]) => EllipseForm::Sized3d { x, y, z, w, h },
            _ => return Err(no_form("ellipse", args.len(), three_d)),
        };
        Ok(form)
    }

    pub fn is_3d(&self) -> bool {
        matches!(self, EllipseForm::At3d { .. } | EllipseForm::Sized3d { .. })
    }

    fn resolve(self, comp: (f64, f64)) -> (DVec3, (f64, f64)) {
        match self {
            EllipseForm::At { x, y } => (DVec3::new(x, y, 0.0), comp),
            EllipseForm::Sized { x, y, w, h } => (DVec3::new(x, y, 0.0), (w, h)),
            EllipseForm::At3d { x, y, z } => (DVec3::new(x, y, z), comp),
            EllipseForm::Sized3d { x, y, z, w, h } => (DVec3::new(x, y, z), (w, h)),
        }
    }
}

/// Call forms of `polygon`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PolygonForm {
    /// `polygon(x, y)`: radius `min(width, height) / 2`, five sides.
    At { x: f64, y: f64 },
    /// `polygon(x, y, radius, sides)`
    Sized { x: f64, y: f64, radius: f64, sides: f64 },
    At3d { x: f64, y: f64, z: f64 },
    Sized3d { x: f64, y: f64, z: f64, radius: f64, sides: f64 },
}

const DEFAULT_SIDES: f64 = 5.0;

impl PolygonForm {
    pub fn from_args(args: &[f64], three_d: bool) -> SketchResult<Self> {
        let form = match (three_d, args) {
            (false, &[x, y]) => PolygonForm::At { x, y },
            (false, &[x, y, radius, sides]) => PolygonForm::Sized { x, y, radius, sides },
            (true, &[x, y, z]) => PolygonForm::At3d { x, y, z },
            (true, &[x, y, z, radius, sides]) => PolygonForm::Sized3d { x, y, z, radius, sides },
            _ => return Err(no_form("polygon", args.len(), three_d)),
        };
        Ok(form)
    }

    pub fn is_3d(&self) -> bool {
        matches!(self, PolygonForm::At3d { .. } | PolygonForm::Sized3d { .. })
    }

    /// `(position, radius, sides)`.
    fn resolve(self, comp: (f64, f64)) -> (DVec3, f64, f64) {
        let radius = comp.0.min(comp.1) / 2.0;
        match self {
            PolygonForm::At { x, y } => (DVec3::new(x, y, 0.0), radius, DEFAULT_SIDES),
            PolygonForm::Sized { x, y, radius, sides } => (DVec3::new(x, y, 0.0), radius, sides),
            PolygonForm::At3d { x, y, z } => (DVec3::new(x, y, z), radius, DEFAULT_SIDES),
            PolygonForm::Sized3d { x, y, z, radius, sides } => (DVec3::new(x, y, z), radius, sides),
        }
    }
}

/// Call forms of `shape`.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeForm {
    /// `shape(vertices)`: open.
    Vertices(Vec<Point>),
    /// `shape(vertices, closed)`
    VerticesClosed(Vec<Point>, bool),
    /// `shape(vertices, in, out)`: open.
    InOut {
        vertices: Vec<Point>,
        in_tangents: Vec<Vec2>,
        out_tangents: Vec<Vec2>,
    },
    /// `shape(vertices, in, out, closed)`
    InOutClosed {
        vertices: Vec<Point>,
        in_tangents: Vec<Vec2>,
        out_tangents: Vec<Vec2>,
        closed: bool,
    },
}

impl ShapeForm {
    pub fn into_path(self) -> PathShape {
        match self {
            ShapeForm::Vertices(vertices) => PathShape::new(vertices, false),
            ShapeForm::VerticesClosed(vertices, closed) => PathShape::new(vertices, closed),
            ShapeForm::InOut {
                vertices,
                in_tangents,
                out_tangents,
            } => PathShape::new(vertices, false).with_tangents(in_tangents, out_tangents),
            ShapeForm::InOutClosed {
                vertices,
                in_tangents,
                out_tangents,
                closed,
            } => PathShape::new(vertices, closed).with_tangents(in_tangents, out_tangents),
        }
    }
}

/// Call forms of `solid`. The argument-free and single-argument forms work in both modes.
#[derive(Clone, Debug, PartialEq)]
pub enum SolidForm {
    /// `solid()`: composition-sized, centered, lasting the composition.
    Full,
    /// `solid(name)`
    Named(String),
    /// `solid(duration)`
    Timed(f64),
    /// `solid(x, y, w, h)`
    Sized { x: f64, y: f64, w: f64, h: f64 },
    /// `solid(name, x, y, w, h)`
    NamedSized { name: String, x: f64, y: f64, w: f64, h: f64 },
    /// `solid(x, y, w, h, duration)`
    TimedSized { x: f64, y: f64, w: f64, h: f64, duration: f64 },
    /// `solid(x, y, z, w, h)` in 3D mode.
    Sized3d { x: f64, y: f64, z: f64, w: f64, h: f64 },
    /// `solid(name, x, y, z, w, h)` in 3D mode.
    NamedSized3d { name: String, x: f64, y: f64, z: f64, w: f64, h: f64 },
    /// `solid(x, y, z, w, h, duration)` in 3D mode.
    TimedSized3d { x: f64, y: f64, z: f64, w: f64, h: f64, duration: f64 },
}

struct SolidSpec {
    name: Option<String>,
    position: DVec3,
    size: (f64, f64),
    duration: f64,
}

impl SolidForm {
    /// Resolves a positional call; `name` is the leading string argument, if any.
    pub fn from_args(name: Option<String>, args: &[f64], three_d: bool) -> SketchResult<Self> {
        let form = match (name, three_d, args) {
            (None, _, &[]) => SolidForm::Full,
            (Some(name), _, &[]) => SolidForm::Named(name),
            (None, _, &[duration]) => SolidForm::Timed(duration),
            (None, false, &[x, y, w, h]) => SolidForm::Sized { x, y, w, h },
            (Some(name), false, &[x, y, w, h]) => SolidForm::NamedSized { name, x, y, w, h },
            (None, false, &[x, y, w, h, duration]) => SolidForm::TimedSized { x, y, w, h, duration },
            (None, true, &[x, y, z, w, h]) => SolidForm::Sized3d { x, y, z, w, h },
            (Some(name), true, &[x, y, z, w, h]) => SolidForm::NamedSized3d { name, x, y, z, w, h },
            (None, true, &[x, y, z, w, h, duration]) => {
                SolidForm::TimedSized3d { x, y, z, w, h, duration }
            }
            (name, _, _) => {
                let count = args.len() + usize::from(name.is_some());
                return Err(no_form("solid", count, three_d));
            }
        };
        Ok(form)
    }

    /// `Some(true)` for 3D-only forms, `Some(false)` for 2D-only forms, `None` otherwise.
    pub fn dimension(&self) -> Option<bool> {
        match self {
            SolidForm::Full | SolidForm::Named(_) | SolidForm::Timed(_) => None,
            SolidForm::Sized { .. } | SolidForm::NamedSized { .. } | SolidForm::TimedSized { .. } => {
                Some(false)
            }
            _ => Some(true),
        }
    }

    fn resolve(self, comp: (f64, f64), comp_duration: f64) -> SolidSpec {
        let center = DVec3::new(comp.0 / 2.0, comp.1 / 2.0, 0.0);
        let spec = |name, position, size, duration| SolidSpec {
            name,
            position,
            size,
            duration,
        };
        match self {
            SolidForm::Full => spec(None, center, comp, comp_duration),
            SolidForm::Named(name) => spec(Some(name), center, comp, comp_duration),
            SolidForm::Timed(duration) => spec(None, center, comp, duration),
            SolidForm::Sized { x, y, w, h } => {
                spec(None, DVec3::new(x, y, 0.0), (w, h), comp_duration)
            }
            SolidForm::NamedSized { name, x, y, w, h } => {
                spec(Some(name), DVec3::new(x, y, 0.0), (w, h), comp_duration)
            }
            SolidForm::TimedSized { x, y, w, h, duration } => {
                spec(None, DVec3::new(x, y, 0.0), (w, h), duration)
            }
            SolidForm::Sized3d { x, y, z, w, h } => {
                spec(None, DVec3::new(x, y, z), (w, h), comp_duration)
            }
            SolidForm::NamedSized3d { name, x, y, z, w, h } => {
                spec(Some(name), DVec3::new(x, y, z), (w, h), comp_duration)
            }
            SolidForm::TimedSized3d { x, y, z, w, h, duration } => {
                spec(None, DVec3::new(x, y, z), (w, h), duration)
            }
        }
    }
}

fn no_form(what: &str, count: usize, three_d: bool) -> SketchError {
    SketchError::argument(format!(
        "{}: no {} call form takes {} arguments",
        what,
        if three_d { "3D" } else { "2D" },
        count
    ))
}

fn check_mode(what: &str, form_is_3d: bool, three_d: bool) -> SketchResult<()> {
    if form_is_3d == three_d {
        return Ok(());
    }
    Err(SketchError::argument(format!(
        "{}: {} call form used while 3D mode is {}",
        what,
        if form_is_3d { "3D" } else { "2D" },
        if three_d { "on" } else { "off" }
    )))
}

impl Session {
    fn comp_size(&self) -> (f64, f64) {
        (self.width(), self.height())
    }

    /// Draws a rectangle centered on its position (with the default anchor mode).
    pub fn rect(&mut self, form: RectForm) -> SketchResult<ShapeHandle> {
        check_mode("rect", form.is_3d(), self.settings.three_d)?;
        let (position, (w, h), round) = form.resolve(self.comp_size());
        let shared = self.host().clone();
        let mut host = lock_host(&shared)?;
        let name = layer_name(&*host, "rect");
        let mut b = LayerBuilder::create(&mut *host, &shared, self.context(), LayerKind::Shape, &name)?;

        let group = b.add_group(None)?;
        let rect = b.add_content(group, ContentKind::Rect)?;
        let paint = b.add_style_paint(group)?;
        b.collect_transform()?;
        b.expose_paint(&paint);
        b.expose_value(&rect, "size", PropertyValue::vec2(w, h))?;
        b.expose_value(&rect, "round", PropertyValue::Scalar(round))?;

        b.reposition_anchor()?;
        b.place(position)?;
        debug!(layer = b.layer(), ?position, w, h, "rect");
        b.finish()
    }

    pub fn rect_args(&mut self, args: &[f64]) -> SketchResult<ShapeHandle> {
        let form = RectForm::from_args(args, self.settings.three_d)?;
        self.rect(form)
    }

    pub fn ellipse(&mut self, form: EllipseForm) -> SketchResult<ShapeHandle> {
        check_mode("ellipse", form.is_3d(), self.settings.three_d)?;
        let (position, (w, h)) = form.resolve(self.comp_size());
        let shared = self.host().clone();
        let mut host = lock_host(&shared)?;
        let name = layer_name(&*host, "ellipse");
        let mut b = LayerBuilder::create(&mut *host, &shared, self.context(), LayerKind::Shape, &name)?;

        let group = b.add_group(None)?;
        let ellipse = b.add_content(group, ContentKind::Ellipse)?;
        let paint = b.add_style_paint(group)?;
        b.collect_transform()?;
        b.expose_paint(&paint);
        b.expose_value(&ellipse, "size", PropertyValue::vec2(w, h))?;

        b.reposition_anchor()?;
        b.place(position)?;
        b.finish()
    }

    pub fn ellipse_args(&mut self, args: &[f64]) -> SketchResult<ShapeHandle> {
        let form = EllipseForm::from_args(args, self.settings.three_d)?;
        self.ellipse(form)
    }

    /// Draws a regular polygon; `points` is the side count.
    pub fn polygon(&mut self, form: PolygonForm) -> SketchResult<ShapeHandle> {
        check_mode("polygon", form.is_3d(), self.settings.three_d)?;
        let (position, radius, sides) = form.resolve(self.comp_size());
        if !radius.is_finite() || !sides.is_finite() {
            return Err(SketchError::argument(format!(
                "polygon: radius and sides must be finite, got {} and {}",
                radius, sides
            )));
        }
        let shared = self.host().clone();
        let mut host = lock_host(&shared)?;
        let name = layer_name(&*host, "polygon");
        let mut b = LayerBuilder::create(&mut *host, &shared, self.context(), LayerKind::Shape, &name)?;

        let group = b.add_group(None)?;
        let polygon = b.add_content(group, ContentKind::Polygon)?;
        let paint = b.add_style_paint(group)?;
        b.collect_transform()?;
        b.expose_paint(&paint);
        b.expose_value(&polygon, "points", PropertyValue::Scalar(sides))?;
        b.expose_value(&polygon, "radius", PropertyValue::Scalar(radius))?;
        b.expose(&polygon, "roundness", "roundness");

        b.reposition_anchor()?;
        b.place(position)?;
        b.finish()
    }

    pub fn polygon_args(&mut self, args: &[f64]) -> SketchResult<ShapeHandle> {
        let form = PolygonForm::from_args(args, self.settings.three_d)?;
        self.polygon(form)
    }

    /// Draws a stroked segment. Lines never get a fill.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> SketchResult<ShapeHandle> {
        let shared = self.host().clone();
        let mut host = lock_host(&shared)?;
        let name = layer_name(&*host, "line");
        let ctx = self.context();
        let mut b = LayerBuilder::create(&mut *host, &shared, ctx, LayerKind::Shape, &name)?;

        let group = b.add_group(None)?;
        let path = b.add_content(group, ContentKind::Path)?;
        let paint = b.add_paint(group, &ctx.style, true, false)?;
        b.collect_transform()?;
        b.expose_paint(&paint);
        let segment = PathShape::new(vec![Point::new(x1, y1), Point::new(x2, y2)], false);
        b.expose_value(&path, "path", PropertyValue::Path(segment))?;

        b.set_anchor(x1, y1)?;
        b.place(DVec3::new(x1, y1, 0.0))?;
        b.reposition_anchor()?;
        b.finish()
    }

    /// `line(x1, y1, x2, y2)`
    pub fn line_args(&mut self, args: &[f64]) -> SketchResult<ShapeHandle> {
        match *args {
            [x1, y1, x2, y2] => self.line(x1, y1, x2, y2),
            _ => Err(no_form("line", args.len(), self.settings.three_d)),
        }
    }

    /// Draws an arbitrary path. Vertices are offset by the current translation; the
    /// layer sits at the origin. Built disabled while an inactive build is pending.
    pub fn shape(&mut self, form: ShapeForm) -> SketchResult<ShapeHandle> {
        let mut ctx = self.context();
        ctx.inactive = self.recorder.is_inactive();
        self.build_path(form.into_path(), ctx)
    }

    pub(crate) fn build_path(
        &mut self,
        path: PathShape,
        ctx: BuildContext,
    ) -> SketchResult<ShapeHandle> {
        let translation = ctx.matrix.translation();
        let path = path.translated(Vec2::new(translation.x, translation.y));
        let shared = self.host().clone();
        let mut host = lock_host(&shared)?;
        let name = layer_name(&*host, "shape");
        let mut b = LayerBuilder::create(&mut *host, &shared, ctx, LayerKind::Shape, &name)?;

        let group = b.add_group(None)?;
        let content = b.add_content(group, ContentKind::Path)?;
        let paint = b.add_style_paint(group)?;
        b.collect_transform()?;
        b.expose_paint(&paint);
        b.expose_value(&content, "path", PropertyValue::Path(path))?;

        b.set_position_raw(DVec3::new(0.0, 0.0, translation.z))?;
        b.reposition_anchor()?;
        b.finish()
    }

    /// Adds a solid filled with the current fill color.
    pub fn solid(&mut self, form: SolidForm) -> SketchResult<ShapeHandle> {
        if let Some(form_is_3d) = form.dimension() {
            check_mode("solid", form_is_3d, self.settings.three_d)?;
        }
        let spec = form.resolve(self.comp_size(), self.config().duration);
        let ctx = self.context();
        let shared = self.host().clone();
        let mut host = lock_host(&shared)?;
        let name = match spec.name {
            Some(name) => name,
            None => layer_name(&*host, "solid"),
        };
        let kind = LayerKind::Solid {
            width: spec.size.0,
            height: spec.size.1,
            color: ctx.style.fill_color,
        };
        let mut b = LayerBuilder::create(&mut *host, &shared, ctx, kind, &name)?;
        let layer = b.layer();
        b.host().set_layer_duration(layer, spec.duration)?;
        b.collect_transform()?;

        b.reposition_anchor()?;
        b.place(spec.position)?;
        b.finish()
    }

    /// `solid(name?, ...)`; `name` is the leading string argument when given.
    pub fn solid_args(&mut self, name: Option<String>, args: &[f64]) -> SketchResult<ShapeHandle> {
        let form = SolidForm::from_args(name, args, self.settings.three_d)?;
        self.solid(form)
    }

    /// Adds a null layer exposing only its transform.
    pub fn null_layer(&mut self, duration: Option<f64>) -> SketchResult<ShapeHandle> {
        let duration = duration.unwrap_or(self.config().duration);
        let shared = self.host().clone();
        let mut host = lock_host(&shared)?;
        let name = layer_name(&*host, "null");
        let mut b = LayerBuilder::create(&mut *host, &shared, self.context(), LayerKind::Null, &name)?;
        let layer = b.layer();
        b.host().set_layer_duration(layer, duration)?;
        b.collect_transform()?;
        Ok(b.into_handle())
    }
}
