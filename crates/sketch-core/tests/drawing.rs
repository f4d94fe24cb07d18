//! Drawing Session Tests
//!
//! Tests for the session API: constructor call forms, grouped vertex builds,
//! style snapshots and the transform stack.

use kurbo::Point;
use sketch_core::{
    BeginMode, Color, DrawMode, EllipseForm, PolygonForm, PropertyValue, RectForm, Session,
    SessionConfig, ShapeHandle, SketchError, SolidForm,
};

fn session() -> Session {
    Session::in_memory(SessionConfig::default()).unwrap()
}

fn names(handle: &ShapeHandle) -> Vec<&str> {
    handle.iter().map(|(name, _)| name.as_str()).collect()
}

fn sorted(mut list: Vec<&'static str>) -> Vec<&'static str> {
    list.sort_unstable();
    list
}

const TRANSFORM_2D: [&str; 5] = ["anchorpoint", "opacity", "position", "rotation", "scale"];
const TRANSFORM_3D: [&str; 8] = [
    "anchorpoint",
    "opacity",
    "orientation",
    "position",
    "scale",
    "xrotation",
    "yrotation",
    "zrotation",
];

fn expected(transform: &[&'static str], extra: &[&'static str]) -> Vec<&'static str> {
    sorted(transform.iter().chain(extra).copied().collect())
}

/// Every call form yields the attribute set of its mode.
///
/// Validates:
/// - rect 2, 4, 5 (2D) and 3, 5, 6 (3D) arguments
/// - ellipse 2, 4 (2D) and 3, 5 (3D) arguments
/// - polygon 2, 4 (2D) and 3, 5 (3D) arguments
/// - line, solid and null_layer
#[test]
fn arity_coverage() {
    let mut s = session();
    let rect = expected(&TRANSFORM_2D, &["fill", "round", "size", "stroke", "weight"]);
    for args in [&[0.0, 0.0][..], &[0.0, 0.0, 10.0, 10.0], &[0.0, 0.0, 10.0, 10.0, 2.0]] {
        assert_eq!(names(&s.rect_args(args).unwrap()), rect, "rect {:?}", args);
    }
    let ellipse = expected(&TRANSFORM_2D, &["fill", "size", "stroke", "weight"]);
    for args in [&[0.0, 0.0][..], &[0.0, 0.0, 10.0, 10.0]] {
        assert_eq!(names(&s.ellipse_args(args).unwrap()), ellipse);
    }
    let polygon = expected(
        &TRANSFORM_2D,
        &["fill", "points", "radius", "roundness", "stroke", "weight"],
    );
    for args in [&[0.0, 0.0][..], &[0.0, 0.0, 20.0, 6.0]] {
        assert_eq!(names(&s.polygon_args(args).unwrap()), polygon);
    }
    let line = expected(&TRANSFORM_2D, &["path", "stroke", "weight"]);
    assert_eq!(names(&s.line_args(&[0.0, 0.0, 10.0, 10.0]).unwrap()), line);
    let solid = expected(&TRANSFORM_2D, &[]);
    assert_eq!(names(&s.solid_args(None, &[]).unwrap()), solid);
    assert_eq!(names(&s.solid_args(Some("bg".into()), &[]).unwrap()), solid);
    assert_eq!(names(&s.solid_args(None, &[2.0]).unwrap()), solid);
    assert_eq!(names(&s.solid_args(None, &[0.0, 0.0, 10.0, 10.0]).unwrap()), solid);
    assert_eq!(names(&s.null_layer(None).unwrap()), solid);

    s.set_3d_mode(true);
    let rect = expected(&TRANSFORM_3D, &["fill", "round", "size", "stroke", "weight"]);
    for args in [
        &[0.0, 0.0, 0.0][..],
        &[0.0, 0.0, 0.0, 10.0, 10.0],
        &[0.0, 0.0, 0.0, 10.0, 10.0, 2.0],
    ] {
        assert_eq!(names(&s.rect_args(args).unwrap()), rect, "rect {:?}", args);
    }
    let ellipse = expected(&TRANSFORM_3D, &["fill", "size", "stroke", "weight"]);
    for args in [&[0.0, 0.0, 0.0][..], &[0.0, 0.0, 0.0, 10.0, 10.0]] {
        assert_eq!(names(&s.ellipse_args(args).unwrap()), ellipse);
    }
    let polygon = expected(
        &TRANSFORM_3D,
        &["fill", "points", "radius", "roundness", "stroke", "weight"],
    );
    for args in [&[0.0, 0.0, 0.0][..], &[0.0, 0.0, 0.0, 20.0, 6.0]] {
        assert_eq!(names(&s.polygon_args(args).unwrap()), polygon);
    }
    let solid = expected(&TRANSFORM_3D, &[]);
    assert_eq!(names(&s.solid_args(None, &[0.0, 0.0, 0.0, 10.0, 10.0]).unwrap()), solid);
    assert_eq!(
        names(&s.solid_args(Some("s".into()), &[0.0, 0.0, 0.0, 10.0, 10.0]).unwrap()),
        solid
    );
    assert_eq!(names(&s.solid(SolidForm::Full).unwrap()), solid);
}

/// Call forms that do not exist for the gate are argument errors.
#[test]
fn unmatched_arity_is_an_argument_error() {
    let mut s = session();
    assert!(matches!(s.rect_args(&[1.0, 2.0, 3.0]), Err(SketchError::Argument(_))));
    assert!(matches!(s.ellipse_args(&[1.0]), Err(SketchError::Argument(_))));
    assert!(matches!(s.line_args(&[1.0, 2.0]), Err(SketchError::Argument(_))));
    assert!(matches!(
        s.ellipse(EllipseForm::At3d { x: 0.0, y: 0.0, z: 0.0 }),
        Err(SketchError::Argument(_))
    ));
    s.set_3d_mode(true);
    assert!(matches!(
        s.polygon(PolygonForm::At { x: 0.0, y: 0.0 }),
        Err(SketchError::Argument(_))
    ));
}

fn path_of(handle: &ShapeHandle) -> sketch_core::PathShape {
    match handle.require("path").unwrap().value().unwrap() {
        PropertyValue::Path(path) => path,
        other => panic!("expected a path, got {:?}", other),
    }
}

/// Validates:
/// - LINES with 6 vertices yields 3 two-point groups
/// - 5 vertices is a validation error and clears the buffer
#[test]
fn group_partition() {
    let mut s = session();
    s.begin_shape(BeginMode::Draw(DrawMode::Lines));
    for i in 0..6 {
        s.vertex(i as f64 * 10.0, 0.0);
    }
    s.end_shape(false).unwrap().unwrap();
    assert_eq!(s.last_shape().len(), 3);
    for (i, group) in s.last_shape().iter().enumerate() {
        let path = path_of(group);
        assert_eq!(path.vertices.len(), 2);
        assert_eq!(path.vertices[0], Point::new(i as f64 * 20.0, 0.0));
    }

    s.begin_shape(BeginMode::Draw(DrawMode::Lines));
    for i in 0..5 {
        s.vertex(i as f64, 0.0);
    }
    assert!(matches!(s.end_shape(false), Err(SketchError::Validation(_))));
    assert!(!s.is_recording());
    assert_eq!(s.recorded_vertices(), 0);
    assert!(s.last_shape().is_empty());

    s.begin_shape(BeginMode::Draw(DrawMode::Lines));
    assert_eq!(s.recorded_vertices(), 0);
}

fn fill_of(handle: &ShapeHandle) -> PropertyValue {
    handle.require("fill").unwrap().value().unwrap()
}

fn quad(s: &mut Session) {
    for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
        s.vertex(x, y);
    }
}

/// Each QUADS group binds the style snapshot pushed for it; extra groups reuse the last.
#[test]
fn style_snapshot_binding() {
    let red = PropertyValue::Color(Color::new(1.0, 0.0, 0.0, 1.0));
    let blue = PropertyValue::Color(Color::new(0.0, 0.0, 1.0, 1.0));

    let mut s = session();
    s.begin_shape(BeginMode::Draw(DrawMode::Quads));
    s.fill_components(&[255.0, 0.0, 0.0]);
    quad(&mut s);
    s.fill_components(&[0.0, 0.0, 255.0]);
    quad(&mut s);
    s.end_shape(true).unwrap();
    assert_eq!(s.last_shape().len(), 2);
    assert_eq!(fill_of(&s.last_shape()[0]), red);
    assert_eq!(fill_of(&s.last_shape()[1]), blue);

    s.begin_shape(BeginMode::Draw(DrawMode::Quads));
    s.fill_components(&[255.0, 0.0, 0.0]);
    s.fill_components(&[0.0, 0.0, 255.0]);
    quad(&mut s);
    quad(&mut s);
    quad(&mut s);
    s.end_shape(true).unwrap();
    assert_eq!(s.last_shape().len(), 3);
    assert_eq!(fill_of(&s.last_shape()[0]), red);
    assert_eq!(fill_of(&s.last_shape()[1]), blue);
    assert_eq!(fill_of(&s.last_shape()[2]), blue);
}

fn x_of(handle: &ShapeHandle) -> f64 {
    handle
        .require("position")
        .unwrap()
        .value()
        .unwrap()
        .component(0)
}

/// Validates:
/// - translations accumulate
/// - pop_matrix restores the pushed matrix
#[test]
fn transform_accumulation() {
    let mut s = session();
    s.translate_args(&[10.0, 0.0]).unwrap();
    s.translate_args(&[20.0, 0.0]).unwrap();
    let rect = s.rect(RectForm::Sized { x: 0.0, y: 0.0, w: 10.0, h: 10.0 }).unwrap();
    assert_eq!(x_of(&rect), 30.0);

    let mut s = session();
    s.push_matrix();
    s.translate(5.0, 0.0, 0.0);
    let inner = s.rect_args(&[0.0, 0.0, 10.0, 10.0]).unwrap();
    s.pop_matrix().unwrap();
    let outer = s.rect_args(&[0.0, 0.0, 10.0, 10.0]).unwrap();
    assert_eq!(x_of(&inner), 5.0);
    assert_eq!(x_of(&outer), 0.0);
}

#[test]
fn pop_without_push_keeps_the_matrix() {
    let mut s = session();
    s.translate(7.0, 3.0, 0.0);
    s.rotate(45.0).unwrap();
    let before = *s.matrix();
    assert!(matches!(s.pop_matrix(), Err(SketchError::State(_))));
    assert_eq!(*s.matrix(), before);
}

/// Two consecutive `begin_shape` calls leave the style history empty both times.
#[test]
fn style_reset_is_idempotent() {
    let mut s = session();
    s.fill_components(&[255.0, 0.0, 0.0]);
    s.stroke_weight(3.0);
    assert_eq!(s.style_stack().len(), 2);
    s.begin_shape(BeginMode::default());
    assert!(s.style_stack().is_empty());
    s.begin_shape(BeginMode::default());
    assert!(s.style_stack().is_empty());
    assert_eq!(s.current_style().stroke_weight, 3.0);
}

#[test]
fn closed_freeform_path_end_to_end() {
    let mut s = session();
    s.begin_shape(BeginMode::default());
    s.vertex(0.0, 0.0);
    s.vertex(10.0, 0.0);
    s.vertex(10.0, 10.0);
    let shape = s.end_shape(true).unwrap().unwrap();
    let path = path_of(&shape);
    assert_eq!(
        path.vertices,
        vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
    );
    assert!(path.closed);
    assert!(s.last_shape().is_empty());
}

/// Handles alias host storage: a write through one is seen by a duplicate read.
#[test]
fn handles_alias_host_storage() {
    let mut s = session();
    let rect = s.rect_args(&[0.0, 0.0, 10.0, 10.0]).unwrap();
    let size = rect.require("size").unwrap();
    size.add_keyframe(0.0, PropertyValue::vec2(10.0, 10.0)).unwrap();
    size.add_keyframe(1.0, PropertyValue::vec2(30.0, 10.0)).unwrap();
    assert_eq!(rect.require("size").unwrap().num_keys().unwrap(), 2);
    assert_eq!(size.value_at(0.5).unwrap().component(0), 20.0);
    assert!(matches!(rect.require("nope"), Err(SketchError::Argument(_))));

    size.set_expression("wiggle(1, 5)").unwrap();
    assert_eq!(size.expression().unwrap().as_deref(), Some("wiggle(1, 5)"));
    size.clear_expression().unwrap();
    assert_eq!(size.expression().unwrap(), None);
}
