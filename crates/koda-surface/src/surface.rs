//! Rendering surface abstraction.
//!
//! A small canvas-2D-like interface: an affine transform, rectangle
//! clear/fill, path fill/stroke and text. Capabilities draw through it and
//! never see pixels directly.

use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Shared handle to the surface one run draws on.
pub type SharedSurface = Rc<RefCell<dyn Surface>>;

// ══════════════════════════════════════════════════════════════════════════════
// Transform
// ══════════════════════════════════════════════════════════════════════════════

/// Affine transform `[a c e; b d f; 0 0 1]`, as in `setTransform(a, b, c, d, e, f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Uniform scale, e.g. logical → device pixels.
    pub fn scale(factor: f64) -> Self {
        Transform {
            a: factor,
            d: factor,
            ..Self::IDENTITY
        }
    }

    /// Map a point through the transform.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════════════════════

/// One drawing instruction of a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "segment", rename_all = "snake_case")]
pub enum PathSegment {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    /// Circular arc around `(x, y)`; angles in radians, 0 pointing right
    /// and growing clockwise on screen.
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    Close,
}

/// A sequence of path segments, built like a canvas path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        self.segments.push(PathSegment::MoveTo { x, y });
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        self.segments.push(PathSegment::LineTo { x, y });
        self
    }

    pub fn arc(
        mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) -> Self {
        self.segments.push(PathSegment::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        });
        self
    }

    pub fn close(mut self) -> Self {
        self.segments.push(PathSegment::Close);
        self
    }

    /// A full circle.
    pub fn circle(x: f64, y: f64, radius: f64) -> Self {
        Self::new().arc(x, y, radius, 0.0, 2.0 * PI, false)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Styles
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
}

/// Stroke style for outlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub width: f64,
    pub color: String,
    pub cap: LineCap,
}

impl Stroke {
    pub fn new(width: f64, color: impl Into<String>) -> Self {
        Self {
            width,
            color: color.into(),
            cap: LineCap::Butt,
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Surface
// ══════════════════════════════════════════════════════════════════════════════

/// A 2D rendering target.
///
/// Coordinates passed to drawing calls are mapped through the current
/// transform. `device_size` is the backing store size in device pixels.
pub trait Surface {
    /// Backing store size `(width, height)` in device pixels.
    fn device_size(&self) -> (u32, u32);

    fn transform(&self) -> Transform;

    fn set_transform(&mut self, transform: Transform);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str);

    fn fill_path(&mut self, path: &Path, color: &str);

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke);

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, color: &str);
}

/// Run `draw` with the identity transform in place, then restore the
/// previous transform.
pub fn with_identity(surface: &mut dyn Surface, draw: impl FnOnce(&mut dyn Surface)) {
    let saved = surface.transform();
    surface.set_transform(Transform::IDENTITY);
    draw(surface);
    surface.set_transform(saved);
}

/// Clear the whole device-pixel backing store, whatever scaling is in
/// effect.
pub fn clear_all(surface: &mut dyn Surface) {
    let (w, h) = surface.device_size();
    with_identity(surface, |s| s.clear_rect(0.0, 0.0, f64::from(w), f64::from(h)));
}

/// Flood the whole device-pixel backing store with `color`.
pub fn fill_all(surface: &mut dyn Surface, color: &str) {
    let (w, h) = surface.device_size();
    with_identity(surface, |s| s.fill_rect(0.0, 0.0, f64::from(w), f64::from(h), color));
}
