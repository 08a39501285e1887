use core::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorKind {
    Accelerometer,
    Magnetometer,
}

impl SensorKind {
    pub const ALL: [SensorKind; 2] = [SensorKind::Accelerometer, SensorKind::Magnetometer];

    pub fn name(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Magnetometer => "magnetometer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    pub timestamp: f64,   // ms
    pub values: [f32; 3], // m/s^2 for the accelerometer, uT for the magnetometer
}

impl SensorReading {
    pub fn new(timestamp: f64, values: [f32; 3]) -> Self {
        Self { timestamp, values }
    }
}

/// A single sample, tagged with the sensor it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorSample {
    /// Gravity vector
    Accelerometer(SensorReading),
    /// Geomagnetic vector
    Magnetometer(SensorReading),
}

impl SensorSample {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorSample::Accelerometer(_) => SensorKind::Accelerometer,
            SensorSample::Magnetometer(_) => SensorKind::Magnetometer,
        }
    }

    pub fn reading(&self) -> &SensorReading {
        match self {
            SensorSample::Accelerometer(reading) | SensorSample::Magnetometer(reading) => reading,
        }
    }

    pub fn timestamp(&self) -> f64 {
        self.reading().timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorAccuracy {
    Unreliable,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorEvent {
    Sample(SensorSample),
    AccuracyChanged {
        kind: SensorKind,
        accuracy: SensorAccuracy,
    },
}

impl From<SensorSample> for SensorEvent {
    fn from(sample: SensorSample) -> Self {
        SensorEvent::Sample(sample)
    }
}

/// Requested delivery rate for a sensor subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorDelay {
    Fastest,
    Game,
    #[default]
    Ui,
    Normal,
}

impl SensorDelay {
    /// Nominal interval between samples in microseconds
    pub fn period_us(&self) -> u32 {
        match self {
            SensorDelay::Fastest => 0,
            SensorDelay::Game => 20_000,
            SensorDelay::Ui => 66_667,
            SensorDelay::Normal => 200_000,
        }
    }
}

/// Source of sensor events that can be subscribed to per sensor kind.
pub trait SensorHub {
    type Error: Debug;

    /// Whether the device has a sensor of this kind at all.
    fn has_sensor(&self, kind: SensorKind) -> bool;

    fn register(&mut self, kind: SensorKind, delay: SensorDelay) -> Result<(), Self::Error>;

    /// Stops delivery for every registered sensor. Calling it again is a no-op.
    fn unregister_all(&mut self);
}
