use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Error};
use dial_compass::{
    rotation::STANDARD_GRAVITY, SensorDelay, SensorEvent, SensorHub, SensorKind, SensorReading,
    SensorSample,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{interval, Instant, MissedTickBehavior},
};

/// A device lying flat and spinning at a constant rate.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    pub start_heading: f32, // degrees
    pub spin_rate: f32,     // degrees per second
    pub horizontal_field: f32,
    pub vertical_field: f32,
    /// Uniform noise added to every axis
    pub noise: f32,
    pub has_magnetometer: bool,
}

impl SimulatedDevice {
    pub fn heading_at(&self, elapsed_ms: f64) -> f32 {
        self.start_heading + self.spin_rate * (elapsed_ms / 1000.0) as f32
    }

    /// Field seen by a level device whose top points `heading` degrees
    /// clockwise from north.
    pub fn field_at_heading(&self, heading: f32) -> [f32; 3] {
        let heading = heading.to_radians();
        [
            -self.horizontal_field * heading.sin(),
            self.horizontal_field * heading.cos(),
            -self.vertical_field,
        ]
    }

    pub fn sample(&self, kind: SensorKind, elapsed_ms: f64, rng: &mut impl Rng) -> SensorSample {
        let mut values = match kind {
            SensorKind::Accelerometer => [0.0, 0.0, STANDARD_GRAVITY],
            SensorKind::Magnetometer => self.field_at_heading(self.heading_at(elapsed_ms)),
        };
        let noise = self.noise.abs();
        if noise > 0.0 {
            for value in values.iter_mut() {
                *value += rng.gen_range(-noise..=noise);
            }
        }

        let reading = SensorReading::new(elapsed_ms, values);
        match kind {
            SensorKind::Accelerometer => SensorSample::Accelerometer(reading),
            SensorKind::Magnetometer => SensorSample::Magnetometer(reading),
        }
    }
}

/// Runs one tokio task per registered sensor, all feeding the same channel.
pub struct SimulatedSensorHub {
    device: Arc<SimulatedDevice>,
    tx: UnboundedSender<SensorEvent>,
    start: Instant,
    tasks: Vec<(SensorKind, JoinHandle<()>)>,
}

impl SimulatedSensorHub {
    pub fn new(device: SimulatedDevice, tx: UnboundedSender<SensorEvent>, start: Instant) -> Self {
        Self {
            device: Arc::new(device),
            tx,
            start,
            tasks: Vec::new(),
        }
    }
}

impl SensorHub for SimulatedSensorHub {
    type Error = Error;

    fn has_sensor(&self, kind: SensorKind) -> bool {
        match kind {
            SensorKind::Accelerometer => true,
            SensorKind::Magnetometer => self.device.has_magnetometer,
        }
    }

    fn register(&mut self, kind: SensorKind, delay: SensorDelay) -> Result<(), Error> {
        if !self.has_sensor(kind) {
            return Err(anyhow!("no {} on the simulated device", kind.name()));
        }
        if self.tasks.iter().any(|(registered, _)| *registered == kind) {
            return Err(anyhow!("{} is already registered", kind.name()));
        }

        // tokio intervals can't be zero
        let period = Duration::from_micros(delay.period_us().max(1000) as u64);
        let device = self.device.clone();
        let tx = self.tx.clone();
        let start = self.start;
        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                let sample = device.sample(kind, elapsed_ms, &mut rng);
                if tx.send(sample.into()).is_err() {
                    break;
                }
            }
        });

        log::debug!("simulated {} every {:?}", kind.name(), period);
        self.tasks.push((kind, handle));
        Ok(())
    }

    fn unregister_all(&mut self) {
        for (kind, handle) in self.tasks.drain(..) {
            handle.abort();
            log::debug!("simulated {} stopped", kind.name());
        }
    }
}

impl Drop for SimulatedSensorHub {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use dial_compass::{Heading, OrientationFusion};
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    fn device() -> SimulatedDevice {
        SimulatedDevice {
            start_heading: 10.0,
            spin_rate: 90.0,
            horizontal_field: 22.0,
            vertical_field: 42.0,
            noise: 0.0,
            has_magnetometer: true,
        }
    }

    #[test]
    fn samples_follow_spin() {
        let device = device();
        let mut rng = StdRng::seed_from_u64(0);
        let mut fusion = OrientationFusion::new();

        fusion.feed(&device.sample(SensorKind::Accelerometer, 0.0, &mut rng));
        let orientation = fusion
            .feed(&device.sample(SensorKind::Magnetometer, 1000.0, &mut rng))
            .unwrap();

        assert_abs_diff_eq!(device.heading_at(1000.0), 100.0);
        assert_abs_diff_eq!(
            Heading::from_orientation(&orientation).degrees(),
            100.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn noise_stays_in_bounds() {
        let device = SimulatedDevice {
            noise: 0.5,
            ..device()
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let sample = device.sample(SensorKind::Accelerometer, 0.0, &mut rng);
            let values = sample.reading().values;
            assert!(values[0].abs() <= 0.5);
            assert!((values[2] - STANDARD_GRAVITY).abs() <= 0.5 + 1e-5);
        }
    }

    #[tokio::test]
    async fn unregister_stops_delivery() {
        let (tx, mut rx) = unbounded_channel();
        let mut hub = SimulatedSensorHub::new(device(), tx, Instant::now());

        hub.register(SensorKind::Accelerometer, SensorDelay::Game)
            .unwrap();
        hub.register(SensorKind::Magnetometer, SensorDelay::Game)
            .unwrap();
        assert!(hub
            .register(SensorKind::Magnetometer, SensorDelay::Game)
            .is_err());

        assert!(rx.recv().await.is_some());
        hub.unregister_all();
        hub.unregister_all();

        // let aborted tasks wind down, then drain what was already queued
        tokio::time::sleep(Duration::from_millis(50)).await;
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn missing_magnetometer() {
        let (tx, _rx) = unbounded_channel();
        let mut hub = SimulatedSensorHub::new(
            SimulatedDevice {
                has_magnetometer: false,
                ..device()
            },
            tx,
            Instant::now(),
        );

        assert!(!hub.has_sensor(SensorKind::Magnetometer));
        assert!(hub
            .register(SensorKind::Magnetometer, SensorDelay::Ui)
            .is_err());
    }
}
