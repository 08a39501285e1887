use std::convert::Infallible;

use dial_compass::{SensorDelay, SensorHub, SensorKind};

/// Hub for inputs that don't come from a live device: replayed logs and
/// samples typed at the prompt. It only keeps track of what is registered.
#[derive(Debug, Default)]
pub struct ScriptedSensorHub {
    registered: Vec<(SensorKind, SensorDelay)>,
}

impl ScriptedSensorHub {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SensorHub for ScriptedSensorHub {
    type Error = Infallible;

    fn has_sensor(&self, _kind: SensorKind) -> bool {
        true
    }

    fn register(&mut self, kind: SensorKind, delay: SensorDelay) -> Result<(), Infallible> {
        self.registered.push((kind, delay));
        Ok(())
    }

    fn unregister_all(&mut self) {
        self.registered.clear();
    }
}
