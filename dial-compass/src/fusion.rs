use crate::{
    rotation::{Orientation, RotationMatrix},
    sensor::SensorSample,
};

/// Keeps the most recent gravity and geomagnetic vectors and turns each new
/// sample into an orientation once both are known.
#[derive(Debug, Clone, Default)]
pub struct OrientationFusion {
    gravity: Option<[f32; 3]>,
    geomagnetic: Option<[f32; 3]>,
}

impl OrientationFusion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` until both sensors have reported, and for any sample
    /// where the rotation matrix can't be computed.
    pub fn feed(&mut self, sample: &SensorSample) -> Option<Orientation> {
        match sample {
            SensorSample::Accelerometer(reading) => self.gravity = Some(reading.values),
            SensorSample::Magnetometer(reading) => self.geomagnetic = Some(reading.values),
        }

        let (gravity, geomagnetic) = (self.gravity.as_ref()?, self.geomagnetic.as_ref()?);
        match RotationMatrix::from_gravity_and_geomagnetic(gravity, geomagnetic) {
            Some(matrix) => Some(matrix.orientation()),
            None => {
                log_trace!("rotation matrix unavailable, skipping sample");
                None
            }
        }
    }

    pub fn gravity(&self) -> Option<&[f32; 3]> {
        self.gravity.as_ref()
    }

    pub fn geomagnetic(&self) -> Option<&[f32; 3]> {
        self.geomagnetic.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use core::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::sensor::SensorReading;

    fn acc(values: [f32; 3]) -> SensorSample {
        SensorSample::Accelerometer(SensorReading::new(0.0, values))
    }

    fn mag(values: [f32; 3]) -> SensorSample {
        SensorSample::Magnetometer(SensorReading::new(0.0, values))
    }

    #[test]
    fn waits_for_both_sensors() {
        let mut fusion = OrientationFusion::new();
        assert!(fusion.feed(&acc([0.0, 0.0, 9.81])).is_none());
        assert!(fusion.feed(&acc([0.0, 0.0, 9.81])).is_none());

        let orientation = fusion.feed(&mag([0.0, 22.0, -40.0])).unwrap();
        assert_abs_diff_eq!(orientation.azimuth, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn every_sample_after_both_produces_orientation() {
        let mut fusion = OrientationFusion::new();
        fusion.feed(&mag([0.0, 22.0, -40.0]));
        fusion.feed(&acc([0.0, 0.0, 9.81]));

        let orientation = fusion.feed(&mag([22.0, 0.0, -40.0])).unwrap();
        assert_abs_diff_eq!(orientation.azimuth, -FRAC_PI_2, epsilon = 1e-6);
    }

    #[test]
    fn failed_matrix_is_skipped_then_retried() {
        let mut fusion = OrientationFusion::new();
        fusion.feed(&mag([0.0, 22.0, -40.0]));
        assert!(fusion.feed(&acc([0.0, 0.0, 0.1])).is_none());

        // buffers keep the failing sample until replaced
        assert_eq!(fusion.gravity(), Some(&[0.0, 0.0, 0.1]));
        assert!(fusion.feed(&mag([0.0, 22.0, -40.0])).is_none());

        assert!(fusion.feed(&acc([0.0, 0.0, 9.81])).is_some());
    }

    #[test]
    fn recorded_level_spin() {
        use crate::heading::Heading;

        let mut fusion = OrientationFusion::new();
        let mut checked = 0;
        for line in csv::Reader::from_path("./test-data/level_spin.csv")
            .unwrap()
            .records()
        {
            let record = line.unwrap();
            let reading = SensorReading::new(
                record[0].parse::<f64>().unwrap(),
                [
                    record[2].parse::<f32>().unwrap(),
                    record[3].parse::<f32>().unwrap(),
                    record[4].parse::<f32>().unwrap(),
                ],
            );
            let sample = match &record[1] {
                "accelerometer" => SensorSample::Accelerometer(reading),
                "magnetometer" => SensorSample::Magnetometer(reading),
                other => panic!("unknown sensor {}", other),
            };

            let orientation = fusion.feed(&sample);
            if record[5].is_empty() {
                continue;
            }
            let expected = record[5].parse::<f32>().unwrap();
            let heading = Heading::from_orientation(&orientation.unwrap()).degrees();
            let error = (heading - expected + 540.0).rem_euclid(360.0) - 180.0;
            assert!(
                error.abs() < 0.01,
                "expected {} got {} at {}",
                expected,
                heading,
                reading.timestamp
            );
            checked += 1;
        }
        assert_eq!(checked, 36);
    }
}
