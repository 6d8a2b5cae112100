//! The capability set: every name student code may call.

use std::f64::consts::PI;
use std::rc::Rc;

use koda_eval::{format_number, number_arg, string_arg, Value};

use crate::console::{console_object, ConsoleBuffer};
use crate::math::math_object;
use crate::surface::{clear_all, fill_all, LineCap, Path, SharedSurface, Stroke, Surface};

/// Ordered mapping from primitive name to callable value.
///
/// Insertion order is the binding order: capability names become the
/// compiled body's formal parameters and the values its arguments, in the
/// same order.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    entries: Vec<(String, Value)>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability. An existing name is replaced in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names in binding order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Values in binding order.
    pub fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The standard drawing capabilities over `surface`, with `console`
/// writing into `console`.
pub fn standard_capabilities(surface: SharedSurface, console: &ConsoleBuffer) -> CapabilitySet {
    let mut set = CapabilitySet::new();
    set.insert("Math", math_object());
    set.insert("console", console_object(console));
    register_canvas(&mut set, &surface);
    register_shapes(&mut set, &surface);
    register_arcs(&mut set, &surface);
    set
}

// ══════════════════════════════════════════════════════════════════════════════
// Registration helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Register a drawing primitive. Primitives never return a value.
fn add_primitive(
    set: &mut CapabilitySet,
    surface: &SharedSurface,
    name: &'static str,
    draw: impl Fn(&mut dyn Surface, &[Value]) + 'static,
) {
    let surface = Rc::clone(surface);
    let func = Value::native(name, move |args| {
        let mut surface = surface.borrow_mut();
        draw(&mut *surface, args);
        Ok(Value::Undefined)
    });
    set.insert(name, func);
}

/// `clear()` and `fill(color)` act on the whole device-pixel backing
/// store, whatever scaling is in effect.
fn register_canvas(set: &mut CapabilitySet, surface: &SharedSurface) {
    add_primitive(set, surface, "clear", |s, _| clear_all(s));
    add_primitive(set, surface, "fill", |s, args| fill_all(s, &string_arg(args, 0)));
}

fn register_shapes(set: &mut CapabilitySet, surface: &SharedSurface) {
    add_primitive(set, surface, "circle", |s, args| {
        let n = |i| number_arg(args, i);
        s.fill_path(&Path::circle(n(0), n(1), n(2)), &string_arg(args, 3));
    });
    add_primitive(set, surface, "ring", |s, args| {
        let n = |i| number_arg(args, i);
        let stroke = Stroke::new(n(3), string_arg(args, 4));
        s.stroke_path(&Path::circle(n(0), n(1), n(2)), &stroke);
    });
    add_primitive(set, surface, "rectangle", |s, args| {
        let n = |i| number_arg(args, i);
        s.fill_rect(n(0), n(1), n(2), n(3), &string_arg(args, 4));
    });
    add_primitive(set, surface, "triangle", |s, args| {
        let n = |i| number_arg(args, i);
        let path = Path::new()
            .move_to(n(0), n(1))
            .line_to(n(2), n(3))
            .line_to(n(4), n(5))
            .close();
        s.fill_path(&path, &string_arg(args, 6));
    });
    add_primitive(set, surface, "line", |s, args| {
        let n = |i| number_arg(args, i);
        let path = Path::new().move_to(n(0), n(1)).line_to(n(2), n(3));
        let stroke = Stroke::new(n(4), string_arg(args, 5)).with_cap(LineCap::Round);
        s.stroke_path(&path, &stroke);
    });
    add_primitive(set, surface, "text", |s, args| {
        let n = |i| number_arg(args, i);
        let font = format!("{}px Inter, sans-serif", format_number(n(2)));
        s.fill_text(&string_arg(args, 3), n(0), n(1), &font, &string_arg(args, 4));
    });
}

// ══════════════════════════════════════════════════════════════════════════════
// Arcs
// ══════════════════════════════════════════════════════════════════════════════

/// Which side of the circle the zero angle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcCorner {
    /// Angle 0 (east).
    Right,
    /// Angle π (west).
    Left,
}

/// Whether the arc bends downward or upward on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcSweep {
    Down,
    Up,
}

/// `(start, end, anticlockwise)` in radians for an arc of `degrees`.
///
/// Screen angles grow clockwise, so "down" is clockwise from the right
/// corner and counter-clockwise from the left.
pub fn arc_angles(corner: ArcCorner, sweep: ArcSweep, degrees: f64) -> (f64, f64, bool) {
    let rad = degrees.to_radians();
    match (corner, sweep) {
        (ArcCorner::Right, ArcSweep::Down) => (0.0, rad, false),
        (ArcCorner::Right, ArcSweep::Up) => (0.0, -rad, true),
        (ArcCorner::Left, ArcSweep::Down) => (PI, PI - rad, true),
        (ArcCorner::Left, ArcSweep::Up) => (PI, PI + rad, false),
    }
}

/// Stroke an arc of the circle around `(x, y)`.
#[allow(clippy::too_many_arguments)]
pub fn stroke_arc(
    surface: &mut dyn Surface,
    x: f64,
    y: f64,
    radius: f64,
    start: f64,
    end: f64,
    anticlockwise: bool,
    width: f64,
    color: &str,
) {
    let path = Path::new().arc(x, y, radius, start, end, anticlockwise);
    surface.stroke_path(&path, &Stroke::new(width, color));
}

/// `arc` plus the four directional variants, all `(x, y, r, deg, t, c)`.
fn register_arcs(set: &mut CapabilitySet, surface: &SharedSurface) {
    let variants = [
        ("arc", ArcCorner::Right, ArcSweep::Down),
        ("arcRightDown", ArcCorner::Right, ArcSweep::Down),
        ("arcRightUp", ArcCorner::Right, ArcSweep::Up),
        ("arcLeftDown", ArcCorner::Left, ArcSweep::Down),
        ("arcLeftUp", ArcCorner::Left, ArcSweep::Up),
    ];
    for (name, corner, sweep) in variants {
        add_primitive(set, surface, name, move |s, args| {
            let n = |i| number_arg(args, i);
            let (start, end, anticlockwise) = arc_angles(corner, sweep, n(3));
            stroke_arc(s, n(0), n(1), n(2), start, end, anticlockwise, n(4), &string_arg(args, 5));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawCommand, RecordingSurface};
    use crate::surface::{PathSegment, Transform};
    use koda_eval::Function;
    use std::cell::RefCell;

    fn setup(dpr: f64) -> (Rc<RefCell<RecordingSurface>>, CapabilitySet) {
        let recording = Rc::new(RefCell::new(RecordingSurface::new(100.0, 50.0, dpr)));
        let surface: SharedSurface = recording.clone();
        let set = standard_capabilities(surface, &ConsoleBuffer::new());
        (recording, set)
    }

    fn call(set: &CapabilitySet, name: &str, args: &[Value]) -> Value {
        match set.get(name) {
            Some(Value::Function(Function::Native(native))) => (native.func)(args).expect("call"),
            other => panic!("missing capability {name}: {other:?}"),
        }
    }

    #[test]
    fn test_binding_order_is_stable() {
        let (_, set) = setup(1.0);
        let names = set.names();
        assert_eq!(&names[..4], ["Math", "console", "clear", "fill"]);
        for name in [
            "circle",
            "ring",
            "rectangle",
            "triangle",
            "line",
            "text",
            "arc",
            "arcRightDown",
            "arcRightUp",
            "arcLeftDown",
            "arcLeftUp",
        ] {
            assert!(set.contains(name), "missing {name}");
        }
        assert_eq!(set.len(), names.len());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut set = CapabilitySet::new();
        set.insert("a", Value::from(1.0));
        set.insert("b", Value::from(2.0));
        set.insert("a", Value::from(3.0));
        assert_eq!(set.names(), ["a", "b"]);
        assert_eq!(set.get("a"), Some(&Value::from(3.0)));
    }

    #[test]
    fn test_fill_covers_device_pixels_at_any_dpr() {
        for dpr in [1.0, 2.0, 1.5] {
            let (recording, set) = setup(dpr);
            call(&set, "fill", &["#123456".into()]);
            let surface = recording.borrow();
            match surface.commands() {
                [DrawCommand::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                    transform,
                }] => {
                    assert_eq!((*x, *y), (0.0, 0.0));
                    assert_eq!(*width, (100.0 * dpr).floor());
                    assert_eq!(*height, (50.0 * dpr).floor());
                    assert_eq!(color, "#123456");
                    assert!(transform.is_identity());
                }
                other => panic!("unexpected commands: {other:?}"),
            }
            assert_eq!(surface.transform(), Transform::scale(dpr));
        }
    }

    #[test]
    fn test_clear_restores_transform() {
        let (recording, set) = setup(2.0);
        call(&set, "clear", &[]);
        call(&set, "circle", &[10.0.into(), 10.0.into(), 5.0.into(), "red".into()]);
        let surface = recording.borrow();
        let commands = surface.commands();
        assert!(matches!(commands[0], DrawCommand::ClearRect { width, .. } if width == 200.0));
        assert_eq!(commands[1].transform(), Transform::scale(2.0));
    }

    #[test]
    fn test_primitives_return_undefined() {
        let (_, set) = setup(1.0);
        let out = call(&set, "rectangle", &[0.0.into(), 0.0.into(), 5.0.into(), 5.0.into(), "blue".into()]);
        assert_eq!(out, Value::Undefined);
    }

    #[test]
    fn test_line_has_round_cap() {
        let (recording, set) = setup(1.0);
        let args: Vec<Value> = vec![0.0.into(), 0.0.into(), 10.0.into(), 0.0.into(), 3.0.into(), "black".into()];
        call(&set, "line", &args);
        match recording.borrow().commands() {
            [DrawCommand::StrokePath { stroke, .. }] => {
                assert_eq!(stroke.cap, LineCap::Round);
                assert_eq!(stroke.width, 3.0);
            }
            other => panic!("unexpected commands: {other:?}"),
        };
    }

    #[test]
    fn test_text_font() {
        let (recording, set) = setup(1.0);
        call(&set, "text", &[1.0.into(), 2.0.into(), 24.0.into(), "Hej".into(), "#000".into()]);
        match recording.borrow().commands() {
            [DrawCommand::FillText { text, font, .. }] => {
                assert_eq!(text, "Hej");
                assert_eq!(font, "24px Inter, sans-serif");
            }
            other => panic!("unexpected commands: {other:?}"),
        };
    }

    #[test]
    fn test_arc_angles() {
        let half = PI / 2.0;
        assert_eq!(arc_angles(ArcCorner::Right, ArcSweep::Down, 90.0), (0.0, half, false));
        assert_eq!(arc_angles(ArcCorner::Right, ArcSweep::Up, 90.0), (0.0, -half, true));
        assert_eq!(arc_angles(ArcCorner::Left, ArcSweep::Down, 90.0), (PI, PI - half, true));
        assert_eq!(arc_angles(ArcCorner::Left, ArcSweep::Up, 90.0), (PI, PI + half, false));
    }

    #[test]
    fn test_legacy_arc_matches_right_down() {
        let (recording, set) = setup(1.0);
        let args: Vec<Value> = vec![50.0.into(), 50.0.into(), 20.0.into(), 180.0.into(), 2.0.into(), "red".into()];
        call(&set, "arc", &args);
        call(&set, "arcRightDown", &args);
        let surface = recording.borrow();
        let commands = surface.commands();
        assert_eq!(commands[0], commands[1]);
        match &commands[0] {
            DrawCommand::StrokePath { path, .. } => assert!(matches!(
                path.segments[0],
                PathSegment::Arc { end_angle, anticlockwise: false, .. } if end_angle == PI
            )),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_arguments_coerce() {
        let (recording, set) = setup(1.0);
        call(&set, "circle", &[]);
        match recording.borrow().commands() {
            [DrawCommand::FillPath { color, path, .. }] => {
                assert_eq!(color, "undefined");
                assert!(matches!(path.segments[0], PathSegment::Arc { x, .. } if x.is_nan()));
            }
            other => panic!("unexpected commands: {other:?}"),
        };
    }
}
