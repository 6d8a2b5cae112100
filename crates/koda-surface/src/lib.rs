//! Koda capability surface.
//!
//! The fixed set of primitives student code may call: drawing over a
//! [`Surface`], the `Math` geometry object and a restricted `console`.

pub mod capabilities;
pub mod console;
pub mod math;
pub mod recording;
pub mod surface;

pub use capabilities::{arc_angles, standard_capabilities, stroke_arc, ArcCorner, ArcSweep, CapabilitySet};
pub use console::{ConsoleBuffer, ConsoleLevel, ConsoleLine};
pub use recording::{DrawCommand, RecordingSurface};
pub use surface::{
    clear_all, fill_all, with_identity, LineCap, Path, PathSegment, SharedSurface, Stroke, Surface,
    Transform,
};
