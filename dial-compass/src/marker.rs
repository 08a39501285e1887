use libm::{cos, sin};
use nalgebra::{Point2, Vector2};

use crate::heading::DEG_TO_RAD;

/// Laid out size of a view in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ViewSize {
    pub width: u32,
    pub height: u32,
}

impl ViewSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Half the size, rounded down to whole pixels
    pub fn half(&self) -> Vector2<f32> {
        Vector2::new((self.width / 2) as f32, (self.height / 2) as f32)
    }

    /// Center in the view's own coordinates
    pub fn center(&self) -> Point2<f32> {
        Point2::from(self.half())
    }

    pub fn is_laid_out(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Where the marker sits relative to the dial center, captured when the
/// dial was tapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerOffset(pub Vector2<f32>);

impl MarkerOffset {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self(Vector2::new(dx, dy))
    }

    /// Offset of a tap from the center of the dial as it is currently laid
    /// out. The dial's current rotation is not undone, so the offset is in
    /// whatever frame the dial was showing at tap time.
    pub fn capture(tap: Point2<f32>, dial: ViewSize) -> Self {
        if !dial.is_laid_out() {
            log_warn!(
                "dial tapped before layout ({}x{}), marker offset is relative to the origin",
                dial.width,
                dial.height
            );
        }
        Self(tap - dial.center())
    }

    pub fn dx(&self) -> f32 {
        self.0.x
    }

    pub fn dy(&self) -> f32 {
        self.0.y
    }

    /// The offset rotated clockwise (screen coordinates, y down) by
    /// `rotation` degrees.
    pub fn rotated(&self, rotation: f32) -> Vector2<f32> {
        let angle = rotation as f64 * DEG_TO_RAD;
        let (sin, cos) = (sin(angle), cos(angle));
        let (dx, dy) = (self.0.x as f64, self.0.y as f64);

        Vector2::new(
            (dx * cos - dy * sin) as f32,
            (dx * sin + dy * cos) as f32,
        )
    }
}

/// Top-left position of the marker view, in the dial's parent coordinates,
/// that puts the marker's center on the same spot of the dial face once the
/// dial is rotated by `dial_rotation` degrees.
pub fn marker_position(
    dial_rotation: f32,
    offset: &MarkerOffset,
    dial: ViewSize,
    marker: ViewSize,
) -> Point2<f32> {
    dial.center() + offset.rotated(dial_rotation) - marker.half()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const DIAL: ViewSize = ViewSize::new(300, 300);
    const MARKER: ViewSize = ViewSize::new(20, 20);

    #[test]
    fn no_rotation_is_center_plus_offset() {
        let offset = MarkerOffset::new(40.0, -25.0);
        let position = marker_position(0.0, &offset, DIAL, MARKER);

        assert_abs_diff_eq!(position, Point2::new(150.0 + 40.0 - 10.0, 150.0 - 25.0 - 10.0));
    }

    #[test]
    fn quarter_turn_maps_dx_dy_to_minus_dy_dx() {
        let offset = MarkerOffset::new(40.0, -25.0);

        assert_abs_diff_eq!(offset.rotated(90.0), Vector2::new(25.0, 40.0), epsilon = 1e-4);
        assert_abs_diff_eq!(
            marker_position(90.0, &offset, DIAL, MARKER),
            Point2::new(150.0 + 25.0 - 10.0, 150.0 + 40.0 - 10.0),
            epsilon = 1e-4
        );
    }

    #[test]
    fn rotation_is_periodic() {
        let offset = MarkerOffset::new(-63.5, 12.25);
        for rotation in [-270.0f32, -33.3, 0.0, 17.0, 90.0, 181.5] {
            assert_abs_diff_eq!(
                marker_position(rotation, &offset, DIAL, MARKER),
                marker_position(rotation + 360.0, &offset, DIAL, MARKER),
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn odd_sizes_round_half_down() {
        let dial = ViewSize::new(301, 199);
        let marker = ViewSize::new(15, 9);
        let position = marker_position(0.0, &MarkerOffset::new(0.0, 0.0), dial, marker);

        assert_abs_diff_eq!(position, Point2::new(150.0 - 7.0, 99.0 - 4.0));
    }

    #[test]
    fn capture_is_relative_to_center() {
        let offset = MarkerOffset::capture(Point2::new(200.0, 100.0), DIAL);
        assert_eq!(offset, MarkerOffset::new(50.0, -50.0));
    }

    #[test]
    fn capture_before_layout_uses_raw_tap() {
        let offset = MarkerOffset::capture(Point2::new(12.0, 34.0), ViewSize::default());
        assert_eq!(offset, MarkerOffset::new(12.0, 34.0));
    }
}
