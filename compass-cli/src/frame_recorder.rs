use std::io::Write;

use anyhow::Result;
use dial_compass::{DialView, Heading, ViewSize};
use nalgebra::Point2;
use serde::Serialize;

use crate::config::ScreenConfig;

/// What the screen looked like after an update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub timestamp: f64, // ms
    pub heading: Option<f32>,
    pub dial_rotation: f32,
    pub marker_visible: bool,
    pub marker_x: Option<f32>,
    pub marker_y: Option<f32>,
}

/// Headless stand-in for the dial image and the marker view.
pub struct FrameRecorder {
    dial_size: ViewSize,
    marker_size: ViewSize,
    dial_rotation: f32,
    marker_visible: bool,
    marker_position: Option<Point2<f32>>,
}

impl FrameRecorder {
    pub fn new(config: &ScreenConfig) -> Self {
        Self {
            dial_size: config.dial_size(),
            marker_size: config.marker_size(),
            dial_rotation: 0.0,
            marker_visible: false,
            marker_position: None,
        }
    }

    pub fn frame(&self, timestamp: f64, heading: Option<Heading>) -> Frame {
        let position = self.marker_position.filter(|_| self.marker_visible);
        Frame {
            timestamp,
            heading: heading.map(|heading| heading.normalized()),
            dial_rotation: self.dial_rotation,
            marker_visible: self.marker_visible,
            marker_x: position.map(|p| p.x),
            marker_y: position.map(|p| p.y),
        }
    }
}

impl DialView for FrameRecorder {
    fn dial_size(&self) -> ViewSize {
        self.dial_size
    }

    fn marker_size(&self) -> ViewSize {
        self.marker_size
    }

    fn set_dial_rotation(&mut self, rotation: f32) {
        self.dial_rotation = rotation;
    }

    fn show_marker(&mut self) {
        self.marker_visible = true;
    }

    fn move_marker(&mut self, position: Point2<f32>) {
        self.marker_position = Some(position);
    }
}

pub fn write_frames<W: Write>(writer: W, frames: &[Frame]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for frame in frames {
        wtr.serialize(frame)?;
    }
    wtr.flush()?;
    Ok(())
}
