use core::f64::consts::PI;

use crate::rotation::Orientation;

pub(crate) const RAD_TO_DEG: f64 = 180.0 / PI;
pub(crate) const DEG_TO_RAD: f64 = PI / 180.0;

/// Degrees clockwise from magnetic north. Not wrapped: whatever the azimuth
/// conversion produced is kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Heading(pub f32);

impl Heading {
    pub fn from_azimuth_radians(azimuth: f32) -> Self {
        Self((azimuth as f64 * RAD_TO_DEG) as f32)
    }

    pub fn from_orientation(orientation: &Orientation) -> Self {
        Self::from_azimuth_radians(orientation.azimuth)
    }

    pub fn degrees(&self) -> f32 {
        self.0
    }

    /// Wrapped into [0, 360), for display
    pub fn normalized(&self) -> f32 {
        let wrapped = self.0 % 360.0;
        if wrapped < 0.0 {
            // -1e-8 % 360 + 360 rounds to 360 in f32
            let wrapped = wrapped + 360.0;
            if wrapped >= 360.0 {
                0.0
            } else {
                wrapped
            }
        } else {
            wrapped
        }
    }

    /// Rotation to apply to the dial image so north on the dial points at
    /// magnetic north.
    pub fn dial_rotation(&self) -> f32 {
        -self.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use core::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn azimuth_to_degrees() {
        assert_abs_diff_eq!(
            Heading::from_azimuth_radians(FRAC_PI_2).degrees(),
            90.0,
            epsilon = 1e-4
        );
        assert_abs_diff_eq!(
            Heading::from_azimuth_radians(-FRAC_PI_2).degrees(),
            -90.0,
            epsilon = 1e-4
        );
    }

    #[test]
    fn dial_rotates_against_heading() {
        assert_eq!(Heading(30.0).dial_rotation(), -30.0);
        assert_eq!(Heading(-120.0).dial_rotation(), 120.0);
    }

    #[test]
    fn normalized_wraps_into_range() {
        assert_eq!(Heading(-90.0).normalized(), 270.0);
        assert_eq!(Heading(370.0).normalized(), 10.0);
        assert_eq!(Heading(0.0).normalized(), 0.0);
        assert_eq!(Heading(-360.0).normalized(), 0.0);
        assert!(Heading(-1e-8).normalized() < 360.0);
    }
}
