//! # Session Module
//!
//! The drawing session: every piece of drawing state in one explicit object.
//!
//! ## Responsibilities
//! - **Config**: `SessionConfig` describes the composition a run builds into.
//! - **State**: style stack, transform stack, vertex recorder, global modes
//!   (3D gate, anchor mode, blend/mask/cap modes, opacity) and frame counters.
//! - **Runner**: `go` runs a `Sketch`'s `setup` once and `draw` once per frame.
//!
//! Shape constructors live in `crate::shapes` and masks in `crate::masks`; both
//! extend `Session` with further `impl` blocks.

use crate::anchor;
use crate::animation::PropertyValue;
use crate::errors::{SketchError, SketchResult};
use crate::host::{lock_host, share, CompositionInfo, LayerInfo, MemoryHost, SharedHost};
use crate::properties::{LayerHandle, ShapeHandle};
use crate::recorder::VertexRecorder;
use crate::style::{self, StyleSnapshot, StyleStack};
use crate::transform::{TransformMatrix, TransformStack};
use crate::types::{AnchorMode, BeginMode, BlendMode, Color, LineCap, MaskMode};
use glam::DVec3;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Transform attributes exposed on 2D layers.
pub const TRANSFORM_2D: [&str; 5] = ["anchorpoint", "position", "scale", "rotation", "opacity"];
/// Transform attributes exposed on 3D layers.
pub const TRANSFORM_3D: [&str; 8] = [
    "anchorpoint",
    "position",
    "scale",
    "orientation",
    "xrotation",
    "yrotation",
    "zrotation",
    "opacity",
];

/// The composition a session builds into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub name: String,
    pub width: f64,
    pub height: f64,
    /// Seconds.
    pub duration: f64,
    pub frame_rate: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "untitled".to_string(),
            width: 1920.0,
            height: 1080.0,
            duration: 10.0,
            frame_rate: 24.0,
        }
    }
}

impl SessionConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn named_with_duration(name: impl Into<String>, duration: f64) -> Self {
        Self {
            duration,
            ..Self::named(name)
        }
    }

    pub fn sized(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::named(name)
        }
    }

    pub fn sized_with_duration(
        name: impl Into<String>,
        width: f64,
        height: f64,
        duration: f64,
    ) -> Self {
        Self {
            duration,
            ..Self::sized(name, width, height)
        }
    }

    pub fn full(
        name: impl Into<String>,
        width: f64,
        height: f64,
        duration: f64,
        frame_rate: f64,
    ) -> Self {
        Self {
            frame_rate,
            ..Self::sized_with_duration(name, width, height, duration)
        }
    }

    /// Frames the draw loop runs.
    pub fn total_frames(&self) -> u64 {
        (self.duration * self.frame_rate).ceil().max(0.0) as u64
    }

    pub fn frame_duration(&self) -> f64 {
        if self.frame_rate > 0.0 {
            1.0 / self.frame_rate
        } else {
            0.0
        }
    }
}

/// Global modes consumed by every constructor.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct DrawSettings {
    pub three_d: bool,
    pub anchor_mode: AnchorMode,
    pub blend_mode: BlendMode,
    pub mask_mode: MaskMode,
    pub cap_mode: LineCap,
    /// 0–100.
    pub opacity: f64,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            three_d: false,
            anchor_mode: AnchorMode::CENTER,
            blend_mode: BlendMode::Normal,
            mask_mode: MaskMode::Add,
            cap_mode: LineCap::Butt,
            opacity: 100.0,
        }
    }
}

/// State read by a constructor at call time.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BuildContext {
    pub style: StyleSnapshot,
    pub matrix: TransformMatrix,
    pub settings: DrawSettings,
    /// Create the layer disabled.
    pub inactive: bool,
}

/// One drawing session over a host composition.
pub struct Session {
    host: SharedHost,
    config: SessionConfig,
    pub(crate) style: StyleStack,
    pub(crate) transform: TransformStack,
    pub(crate) recorder: VertexRecorder,
    pub(crate) settings: DrawSettings,
    pub(crate) last_shapes: Vec<ShapeHandle>,
    frame_count: u64,
    frame_time: f64,
}

impl Session {
    /// Publishes `config` as the host composition and starts from the session defaults.
    pub fn new(host: SharedHost, config: SessionConfig) -> SketchResult<Self> {
        {
            let mut h = lock_host(&host)?;
            let current = h.composition();
            h.set_composition(CompositionInfo {
                name: config.name.clone(),
                width: config.width,
                height: config.height,
                duration: config.duration,
                frame_rate: config.frame_rate,
                time: 0.0,
                background: current.background,
            });
        }
        let mut session = Self {
            host,
            config,
            style: StyleStack::new(),
            transform: TransformStack::new(),
            recorder: VertexRecorder::new(),
            settings: DrawSettings::default(),
            last_shapes: Vec::new(),
            frame_count: 0,
            frame_time: 0.0,
        };
        session.restore_defaults()?;
        Ok(session)
    }

    /// Session over a fresh in-memory composition.
    pub fn in_memory(config: SessionConfig) -> SketchResult<Self> {
        Self::new(share(MemoryHost::default()), config)
    }

    /// Resets every piece of drawing state and paints the background black.
    pub fn restore_defaults(&mut self) -> SketchResult<()> {
        self.settings = DrawSettings::default();
        self.style.restore_defaults();
        self.transform.reset();
        self.recorder = VertexRecorder::new();
        self.last_shapes.clear();
        self.background(&[0.0]);
        Ok(())
    }

    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        self.config.width
    }

    pub fn height(&self) -> f64 {
        self.config.height
    }

    pub fn settings(&self) -> &DrawSettings {
        &self.settings
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    pub(crate) fn context(&self) -> BuildContext {
        BuildContext {
            style: *self.style.current(),
            matrix: *self.transform.current(),
            settings: self.settings,
            inactive: false,
        }
    }

    // Color & style

    /// Parses a color; two and four component forms also set the session opacity.
    pub fn color(&mut self, components: &[f64]) -> Option<Color> {
        let parsed = style::parse_color(components)?;
        if let Some(opacity) = parsed.opacity {
            self.settings.opacity = opacity;
        }
        Some(parsed.color)
    }

    fn color_or_warn(&mut self, components: &[f64], what: &str, fallback: Color) -> Color {
        match self.color(components) {
            Some(color) => color,
            None => {
                warn!(
                    count = components.len(),
                    "{}: a color takes 1 to 4 components; keeping the current color", what
                );
                fallback
            }
        }
    }

    /// Sets the composition background color (1 or 3 components).
    pub fn background(&mut self, components: &[f64]) {
        if components.len() != 1 && components.len() != 3 {
            warn!(count = components.len(), "background takes 1 or 3 components");
            return;
        }
        let Some(color) = style::parse_color(components) else {
            return;
        };
        match lock_host(&self.host) {
            Ok(mut host) => {
                let mut comp = host.composition();
                comp.background = color.color;
                host.set_composition(comp);
            }
            Err(e) => warn!("background: {}", e),
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.style.set_fill(color);
    }

    pub fn fill_components(&mut self, components: &[f64]) {
        let current = self.style.current().fill_color;
        let color = self.color_or_warn(components, "fill", current);
        self.style.set_fill(color);
    }

    pub fn stroke(&mut self, color: Color) {
        self.style.set_stroke(color);
    }

    pub fn stroke_components(&mut self, components: &[f64]) {
        let current = self.style.current().stroke_color;
        let color = self.color_or_warn(components, "stroke", current);
        self.style.set_stroke(color);
    }

    pub fn no_fill(&mut self) {
        self.style.set_no_fill();
    }

    pub fn no_stroke(&mut self) {
        self.style.set_no_stroke();
    }

    pub fn stroke_weight(&mut self, weight: f64) {
        self.style.set_stroke_weight(weight);
    }

    pub fn current_style(&self) -> &StyleSnapshot {
        self.style.current()
    }

    pub fn style_stack(&self) -> &StyleStack {
        &self.style
    }

    // Global modes

    pub fn set_3d_mode(&mut self, on: bool) {
        self.settings.three_d = on;
    }

    pub fn anchor_mode(&mut self, mode: AnchorMode) {
        self.settings.anchor_mode = mode;
    }

    pub fn blend_mode(&mut self, mode: BlendMode) {
        self.settings.blend_mode = mode;
    }

    pub fn mask_mode(&mut self, mode: MaskMode) {
        self.settings.mask_mode = mode;
    }

    pub fn cap_mode(&mut self, cap: LineCap) {
        self.settings.cap_mode = cap;
    }

    pub fn opacity(&mut self, opacity: f64) {
        self.settings.opacity = opacity;
    }

    // Transform

    pub fn matrix(&self) -> &TransformMatrix {
        self.transform.current()
    }

    pub fn push_matrix(&mut self) {
        self.transform.push();
    }

    pub fn pop_matrix(&mut self) -> SketchResult<()> {
        self.transform.pop()
    }

    pub fn reset_matrix(&mut self) {
        self.transform.reset();
    }

    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        self.transform.translate(DVec3::new(x, y, z));
    }

    /// `translate(x, y)` or `translate(x, y, z)`.
    pub fn translate_args(&mut self, args: &[f64]) -> SketchResult<()> {
        let args = finite(args, "translate")?;
        match *args {
            [x, y] => self.translate(x, y, 0.0),
            [x, y, z] => self.translate(x, y, z),
            _ => {
                return Err(SketchError::validation(
                    "translate: provide x and y coordinates",
                ))
            }
        }
        Ok(())
    }

    /// Multiplies the current scale; factors are ratios (2.0 doubles).
    pub fn scale(&mut self, sx: f64, sy: f64, sz: f64) {
        self.transform.scale(DVec3::new(sx, sy, sz));
    }

    /// `scale(s)` (x and y), `scale(sx, sy)` or `scale(sx, sy, sz)`.
    pub fn scale_args(&mut self, args: &[f64]) -> SketchResult<()> {
        let args = finite(args, "scale")?;
        match *args {
            [s] => self.scale(s, s, 1.0),
            [sx, sy] => self.scale(sx, sy, 1.0),
            [sx, sy, sz] => self.scale(sx, sy, sz),
            _ => {
                return Err(SketchError::validation(
                    "scale: provide valid x and/or y factors",
                ))
            }
        }
        Ok(())
    }

    pub fn rotate(&mut self, degrees: f64) -> SketchResult<()> {
        finite(&[degrees], "rotate")?;
        self.transform.rotate(degrees);
        Ok(())
    }

    pub fn rotate3d(&mut self, x: f64, y: f64, z: f64) -> SketchResult<()> {
        finite(&[x, y, z], "rotate")?;
        self.transform.rotate3d(DVec3::new(x, y, z));
        Ok(())
    }

    // Vertex recording

    /// Starts recording vertices. The style history is cleared first.
    pub fn begin_shape(&mut self, mode: BeginMode) {
        self.style.reset();
        let discarded = self.recorder.begin(mode);
        if discarded > 0 {
            warn!(discarded, "begin_shape: discarding vertices of an unfinished shape");
        }
        debug!(?mode, "begin_shape");
    }

    pub fn vertex(&mut self, x: f64, y: f64) {
        if !self.recorder.vertex(Point::new(x, y)) {
            warn!("vertex() outside begin_shape/end_shape is ignored");
        }
    }

    pub fn itangent(&mut self, x: f64, y: f64) {
        if !self.recorder.in_tangent(Vec2::new(x, y)) {
            warn!("itangent() outside begin_shape/end_shape is ignored");
        }
    }

    pub fn otangent(&mut self, x: f64, y: f64) {
        if !self.recorder.out_tangent(Vec2::new(x, y)) {
            warn!("otangent() outside begin_shape/end_shape is ignored");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Vertices buffered by the current recording.
    pub fn recorded_vertices(&self) -> usize {
        self.recorder.len()
    }

    /// Per-group handles of the most recent grouped `end_shape`.
    pub fn last_shape(&self) -> &[ShapeHandle] {
        &self.last_shapes
    }

    // Layer utilities

    /// Content bounds of a layer at the current composition time.
    pub fn bounds(&self, layer: &LayerHandle) -> SketchResult<Rect> {
        layer.bounds()
    }

    /// Moves a layer's anchor point to `mode` without moving the layer.
    pub fn anchor(&self, layer: &LayerHandle, mode: AnchorMode) -> SketchResult<()> {
        let mut host = lock_host(&layer.host)?;
        anchor::reposition_anchor(&mut *host, layer.id, mode)
    }

    /// Parents `child` to `parent`.
    pub fn parent(&self, parent: &LayerHandle, child: &LayerHandle) -> SketchResult<()> {
        child.set_parent(Some(parent))
    }

    /// Duplicates the layer behind `shape`; the copy exposes its transform attributes.
    pub fn duplicate(&self, shape: &ShapeHandle) -> SketchResult<ShapeHandle> {
        let layer = shape.layer();
        let mut host = lock_host(&layer.host)?;
        let copy = host.duplicate_layer(layer.id)?;
        let three_d = host.layer_info(copy)?.three_d;
        let mut handle = ShapeHandle::new(LayerHandle::new(layer.host.clone(), copy));
        let names: &[&str] = if three_d { &TRANSFORM_3D } else { &TRANSFORM_2D };
        for name in names {
            handle.insert(*name, host.layer_property(copy, name)?);
        }
        Ok(handle)
    }

    // Runner support

    pub(crate) fn start_frame(&mut self, frame: u64) {
        self.transform.reset();
        self.frame_count = frame;
        self.frame_time += self.config.frame_duration();
    }

    /// Every live layer with its transform values.
    pub fn summary(&self) -> SketchResult<CompositionSummary> {
        let host = lock_host(&self.host)?;
        let mut layers = Vec::new();
        for id in host.layer_ids() {
            let info = host.layer_info(id)?;
            let names: &[&str] = if info.three_d { &TRANSFORM_3D } else { &TRANSFORM_2D };
            let mut transform = BTreeMap::new();
            for name in names {
                let value = host.value(host.layer_property(id, name)?)?;
                transform.insert(name.to_string(), value);
            }
            layers.push(LayerSummary { info, transform });
        }
        Ok(CompositionSummary {
            composition: host.composition(),
            frames: self.frame_count,
            layers,
        })
    }
}

fn finite<'a>(args: &'a [f64], what: &str) -> SketchResult<&'a [f64]> {
    if args.iter().all(|v| v.is_finite()) {
        Ok(args)
    } else {
        Err(SketchError::validation(format!(
            "{}: arguments must be finite numbers",
            what
        )))
    }
}

/// A layer as reported by `Session::summary`.
#[derive(Clone, Debug, Serialize)]
pub struct LayerSummary {
    #[serde(flatten)]
    pub info: LayerInfo,
    pub transform: BTreeMap<String, PropertyValue>,
}

/// What a session built.
#[derive(Clone, Debug, Serialize)]
pub struct CompositionSummary {
    pub composition: CompositionInfo,
    pub frames: u64,
    pub layers: Vec<LayerSummary>,
}

/// User code driven by `go`.
pub trait Sketch {
    /// Runs once after the session is initialised.
    fn setup(&mut self, _session: &mut Session) -> SketchResult<()> {
        Ok(())
    }

    /// Runs once per frame.
    fn draw(&mut self, _session: &mut Session) -> SketchResult<()> {
        Ok(())
    }

    /// Whether the draw loop runs at all.
    fn has_draw(&self) -> bool {
        true
    }
}

/// Runs a sketch against `host`: `setup` once, then `draw` once per frame with the
/// transform stack reset before each frame. A failure aborts the run and is returned.
#[instrument(skip(host, sketch), fields(name = %config.name))]
pub fn go<S: Sketch + ?Sized>(
    host: SharedHost,
    config: SessionConfig,
    sketch: &mut S,
) -> SketchResult<Session> {
    let started = Instant::now();
    let mut session = Session::new(host, config)?;

    let result = run(&mut session, sketch);
    if let Err(e) = &result {
        error!("{}", e);
    }
    result?;

    info!(seconds = started.elapsed().as_secs_f64(), "Done");
    Ok(session)
}

fn run<S: Sketch + ?Sized>(session: &mut Session, sketch: &mut S) -> SketchResult<()> {
    info!("Running setup...");
    sketch.setup(session)?;

    if sketch.has_draw() {
        info!("Running draw...");
        let total = session.config.total_frames();
        for frame in 1..=total {
            session.start_frame(frame);
            sketch.draw(session)?;
            debug!(frame, "frame done");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_constructors_follow_defaults() {
        let c = SessionConfig::named_with_duration("intro", 4.0);
        assert_eq!(c.width, 1920.0);
        assert_eq!(c.duration, 4.0);
        assert_eq!(c.frame_rate, 24.0);
        let full = SessionConfig::full("x", 100.0, 50.0, 2.0, 12.0);
        assert_eq!(full.total_frames(), 24);
    }

    #[test]
    fn config_from_partial_json() {
        let c: SessionConfig = serde_json::from_str(r#"{"name": "demo", "width": 640}"#).unwrap();
        assert_eq!(c.name, "demo");
        assert_eq!(c.width, 640.0);
        assert_eq!(c.height, 1080.0);
    }

    #[test]
    fn color_alpha_sets_opacity() {
        let mut s = Session::in_memory(SessionConfig::default()).unwrap();
        s.fill_components(&[255.0, 0.0, 0.0, 40.0]);
        assert_eq!(s.settings().opacity, 40.0);
        assert_eq!(s.current_style().fill_color, Color::new(1.0, 0.0, 0.0, 1.0));
        s.fill_components(&[]);
        assert_eq!(s.current_style().fill_color, Color::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn transform_argument_validation() {
        let mut s = Session::in_memory(SessionConfig::default()).unwrap();
        assert!(matches!(s.translate_args(&[1.0]), Err(SketchError::Validation(_))));
        assert!(matches!(
            s.scale_args(&[f64::NAN]),
            Err(SketchError::Validation(_))
        ));
        s.scale_args(&[2.0]).unwrap();
        assert_eq!(s.matrix().scale, DVec3::new(200.0, 200.0, 100.0));
    }

    struct Counter {
        frames: u64,
        last_x: f64,
    }

    impl Sketch for Counter {
        fn draw(&mut self, session: &mut Session) -> SketchResult<()> {
            self.frames += 1;
            session.translate(1.0, 0.0, 0.0);
            self.last_x = session.matrix().position.x;
            Ok(())
        }
    }

    #[test]
    fn draw_runs_once_per_frame_with_fresh_matrix() {
        let mut sketch = Counter {
            frames: 0,
            last_x: 0.0,
        };
        let config = SessionConfig::full("loop", 100.0, 100.0, 1.0, 10.0);
        let session = go(share(MemoryHost::default()), config, &mut sketch).unwrap();
        assert_eq!(sketch.frames, 10);
        assert_eq!(sketch.last_x, 1.0);
        assert_eq!(session.frame_count(), 10);
        assert!((session.frame_time() - 1.0).abs() < 1e-9);
    }
}
