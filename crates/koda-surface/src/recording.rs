//! In-memory surface that records draw calls.
//!
//! Used by the CLI and browser hosts, which hand the recorded command list
//! to a real canvas (or print it), and by tests.

use serde::{Deserialize, Serialize};

use crate::surface::{Path, Stroke, Surface, Transform};

/// One recorded drawing call, with the transform that was current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    ClearRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        transform: Transform,
    },
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: String,
        transform: Transform,
    },
    FillPath {
        path: Path,
        color: String,
        transform: Transform,
    },
    StrokePath {
        path: Path,
        stroke: Stroke,
        transform: Transform,
    },
    FillText {
        text: String,
        x: f64,
        y: f64,
        font: String,
        color: String,
        transform: Transform,
    },
}

impl DrawCommand {
    /// The transform in effect when the command was issued.
    pub fn transform(&self) -> Transform {
        match self {
            DrawCommand::ClearRect { transform, .. }
            | DrawCommand::FillRect { transform, .. }
            | DrawCommand::FillPath { transform, .. }
            | DrawCommand::StrokePath { transform, .. }
            | DrawCommand::FillText { transform, .. } => *transform,
        }
    }
}

/// A surface that stores every call instead of rasterizing it.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    device_width: u32,
    device_height: u32,
    transform: Transform,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    /// A surface of `width × height` logical pixels at the given device
    /// pixel ratio. The backing store is `floor(size × dpr)` device pixels
    /// and drawing starts scaled by `dpr`.
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            device_width: (width * device_pixel_ratio).floor().max(0.0) as u32,
            device_height: (height * device_pixel_ratio).floor().max(0.0) as u32,
            transform: Transform::scale(device_pixel_ratio),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded commands.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Surface for RecordingSurface {
    fn device_size(&self) -> (u32, u32) {
        (self.device_width, self.device_height)
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::ClearRect {
            x,
            y,
            width,
            height,
            transform: self.transform,
        });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str) {
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            color: color.to_string(),
            transform: self.transform,
        });
    }

    fn fill_path(&mut self, path: &Path, color: &str) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            color: color.to_string(),
            transform: self.transform,
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            stroke: stroke.clone(),
            transform: self.transform,
        });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, color: &str) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            font: font.to_string(),
            color: color.to_string(),
            transform: self.transform,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_size_is_floored() {
        let surface = RecordingSurface::new(500.0, 300.0, 1.5);
        assert_eq!(surface.device_size(), (750, 450));
        let surface = RecordingSurface::new(333.0, 10.0, 1.25);
        assert_eq!(surface.device_size(), (416, 12));
    }

    #[test]
    fn test_initial_transform_scales_by_dpr() {
        let surface = RecordingSurface::new(100.0, 100.0, 2.0);
        assert_eq!(surface.transform(), Transform::scale(2.0));
    }

    #[test]
    fn test_commands_record_current_transform() {
        let mut surface = RecordingSurface::new(100.0, 100.0, 2.0);
        surface.fill_rect(1.0, 2.0, 3.0, 4.0, "#000");
        surface.set_transform(Transform::IDENTITY);
        surface.clear_rect(0.0, 0.0, 200.0, 200.0);

        let commands = surface.take_commands();
        assert_eq!(commands[0].transform(), Transform::scale(2.0));
        assert!(commands[1].transform().is_identity());
        assert!(surface.is_empty());
    }

    #[test]
    fn test_command_json_shape() {
        let mut surface = RecordingSurface::new(10.0, 10.0, 1.0);
        surface.fill_path(&Path::new().move_to(0.0, 0.0).close(), "red");
        let json = serde_json::to_value(surface.commands()).unwrap();
        assert_eq!(json[0]["op"], "fill_path");
        assert_eq!(json[0]["color"], "red");
        assert_eq!(json[0]["path"][0]["segment"], "move_to");
        assert_eq!(json[0]["path"][1]["segment"], "close");
        assert_eq!(json[0]["transform"]["a"], 1.0);
    }
}
