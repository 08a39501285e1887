use libm::{asinf, atan2f, sqrtf};
use nalgebra::{Matrix3, Vector3};

pub const STANDARD_GRAVITY: f32 = 9.80665;

// Below 10% of standard gravity the device is treated as falling freely
const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;

// Minimum magnitude of east = geomagnetic x gravity, in uT * m/s^2
const MIN_EAST_NORM: f32 = 0.1;

/// Device attitude in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Orientation {
    /// Rotation about -z, 0 when the device's y axis points to magnetic north
    pub azimuth: f32,
    /// Rotation about x
    pub pitch: f32,
    /// Rotation about y
    pub roll: f32,
}

/// Rotation matrix from the device frame to the world frame (east, north, up),
/// together with the inclination matrix that rotates the geomagnetic vector
/// into the world frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationMatrix {
    rotation: Matrix3<f32>,
    inclination: Matrix3<f32>,
}

impl RotationMatrix {
    /// Returns `None` when the device is in free fall, or when the magnetic
    /// field is (close to) parallel to gravity so east is undefined.
    pub fn from_gravity_and_geomagnetic(
        gravity: &[f32; 3],
        geomagnetic: &[f32; 3],
    ) -> Option<Self> {
        let a = Vector3::from_row_slice(gravity);
        let e = Vector3::from_row_slice(geomagnetic);

        let norm_sq_a = a.norm_squared();
        if norm_sq_a < FREE_FALL_GRAVITY_SQUARED {
            return None;
        }

        let h = e.cross(&a);
        let norm_h = sqrtf(h.norm_squared());
        if norm_h < MIN_EAST_NORM {
            return None;
        }

        let h = h / norm_h;
        let a = a / sqrtf(norm_sq_a);
        let m = a.cross(&h);

        #[rustfmt::skip]
        let rotation = Matrix3::new(
            h.x, h.y, h.z,
            m.x, m.y, m.z,
            a.x, a.y, a.z,
        );

        let inv_e = 1.0 / sqrtf(e.norm_squared());
        let c = e.dot(&m) * inv_e;
        let s = e.dot(&a) * inv_e;

        #[rustfmt::skip]
        let inclination = Matrix3::new(
            1.0, 0.0, 0.0,
            0.0, c,   s,
            0.0, -s,  c,
        );

        Some(Self {
            rotation,
            inclination,
        })
    }

    pub fn rotation(&self) -> &Matrix3<f32> {
        &self.rotation
    }

    pub fn inclination(&self) -> &Matrix3<f32> {
        &self.inclination
    }

    pub fn orientation(&self) -> Orientation {
        let r = &self.rotation;
        Orientation {
            azimuth: atan2f(r[(0, 1)], r[(1, 1)]),
            pitch: asinf(-r[(2, 1)]),
            roll: atan2f(-r[(2, 0)], r[(2, 2)]),
        }
    }

    /// Magnetic dip angle in radians
    pub fn inclination_angle(&self) -> f32 {
        atan2f(self.inclination[(1, 2)], self.inclination[(1, 1)])
    }
}
