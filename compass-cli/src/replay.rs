use std::io::Read;

use anyhow::{anyhow, Context, Result};
use dial_compass::{
    CompassScreen, SensorEvent, SensorReading, SensorSample, TouchAction, TouchEvent,
};
use serde::Deserialize;

use crate::{
    config::ScreenConfig,
    frame_recorder::{Frame, FrameRecorder},
    scripted_hub::ScriptedSensorHub,
};

#[derive(Debug, Deserialize)]
struct EventRecord {
    timestamp: f64,
    event: String,
    x: Option<f32>,
    y: Option<f32>,
    z: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayInput {
    Sensor(SensorEvent),
    Touch(TouchEvent),
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEvent {
    pub timestamp: f64, // ms
    pub input: ReplayInput,
}

impl TryFrom<EventRecord> for ReplayEvent {
    type Error = anyhow::Error;

    fn try_from(record: EventRecord) -> Result<Self> {
        let xyz = || -> Result<[f32; 3]> {
            match (record.x, record.y, record.z) {
                (Some(x), Some(y), Some(z)) => Ok([x, y, z]),
                _ => Err(anyhow!("{} needs x, y and z", record.event)),
            }
        };
        let xy = || -> Result<(f32, f32)> {
            match (record.x, record.y) {
                (Some(x), Some(y)) => Ok((x, y)),
                _ => Err(anyhow!("{} needs x and y", record.event)),
            }
        };
        let touch = |action: TouchAction| -> Result<ReplayInput> {
            let (x, y) = xy()?;
            Ok(ReplayInput::Touch(TouchEvent::new(action, x, y)))
        };

        let input = match record.event.as_str() {
            "accelerometer" => ReplayInput::Sensor(
                SensorSample::Accelerometer(SensorReading::new(record.timestamp, xyz()?)).into(),
            ),
            "magnetometer" => ReplayInput::Sensor(
                SensorSample::Magnetometer(SensorReading::new(record.timestamp, xyz()?)).into(),
            ),
            "touch_down" => touch(TouchAction::Down)?,
            "touch_move" => touch(TouchAction::Move)?,
            "touch_up" => touch(TouchAction::Up)?,
            "stop" => ReplayInput::Stop,
            other => return Err(anyhow!("unknown event {:?}", other)),
        };

        Ok(Self {
            timestamp: record.timestamp,
            input,
        })
    }
}

/// Reads a `timestamp,event,x,y,z` log.
pub fn read_events<R: Read>(reader: R) -> Result<Vec<ReplayEvent>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut events = Vec::new();
    for (i, record) in rdr.deserialize::<EventRecord>().enumerate() {
        // header is line 1
        let line = i + 2;
        let record = record.with_context(|| format!("malformed event on line {}", line))?;
        let event =
            ReplayEvent::try_from(record).with_context(|| format!("bad event on line {}", line))?;
        events.push(event);
    }
    Ok(events)
}

/// Feeds the events to a freshly resumed screen and returns a frame for
/// every event that changed what is shown.
pub fn run_replay(config: &ScreenConfig, events: &[ReplayEvent]) -> Vec<Frame> {
    let mut screen = CompassScreen::new(FrameRecorder::new(config));
    let mut hub = ScriptedSensorHub::new();
    let mut frames = Vec::new();

    let mut active = match screen.resume_with_delay(&mut hub, config.sensor_delay.into()) {
        Ok(active) => active,
        Err(infallible) => match infallible {},
    };

    for event in events {
        let updated = match &event.input {
            ReplayInput::Sensor(sensor_event) => active.on_sensor_event(sensor_event),
            ReplayInput::Touch(touch) => {
                active.on_touch(touch);
                touch.action == TouchAction::Down
            }
            ReplayInput::Stop => {
                active.stop_sensors();
                false
            }
        };

        if updated {
            let screen = active.screen();
            frames.push(screen.view().frame(event.timestamp, screen.heading()));
        }
    }

    let samples = events
        .iter()
        .filter(|event| matches!(event.input, ReplayInput::Sensor(_)))
        .count();
    log::info!(
        "replayed {} events ({} sensor samples), {} frames",
        events.len(),
        samples,
        frames.len()
    );

    frames
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use std::fs::File;

    use super::*;

    #[test]
    fn parse_events() {
        let log = "timestamp,event,x,y,z\n\
                   0,accelerometer,0,0,9.81\n\
                   1.5,touch_down,10,20,\n\
                   2,stop,,,\n";
        let events = read_events(log.as_bytes()).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1].input,
            ReplayInput::Touch(TouchEvent::new(TouchAction::Down, 10.0, 20.0))
        );
        assert_eq!(events[2].input, ReplayInput::Stop);
    }

    #[test]
    fn bad_row_names_line() {
        let log = "timestamp,event,x,y,z\n\
                   0,accelerometer,0,0,9.81\n\
                   1,magnetometer,0,22,\n";
        let error = read_events(log.as_bytes()).unwrap_err();
        assert!(format!("{:#}", error).contains("line 3"));

        let log = "timestamp,event,x,y,z\n0,gyroscope,0,0,0\n";
        assert!(read_events(log.as_bytes()).is_err());
    }

    #[test]
    fn replay_tap_spin_stop() {
        let events = read_events(File::open("./test-data/tap_spin_stop.csv").unwrap()).unwrap();
        let frames = run_replay(&ScreenConfig::default(), &events);

        // tap, three headings, nothing after stop
        assert_eq!(frames.len(), 4);

        let tap = &frames[0];
        assert!(tap.marker_visible);
        assert_eq!(tap.heading, None);
        assert_eq!((tap.marker_x, tap.marker_y), (Some(190.0), Some(140.0)));

        let east = &frames[2];
        assert_abs_diff_eq!(east.heading.unwrap(), 90.0, epsilon = 1e-3);
        assert_abs_diff_eq!(east.dial_rotation, -90.0, epsilon = 1e-3);
        assert_abs_diff_eq!(east.marker_x.unwrap(), 140.0, epsilon = 1e-3);
        assert_abs_diff_eq!(east.marker_y.unwrap(), 90.0, epsilon = 1e-3);

        assert_eq!(frames.last().unwrap().timestamp, 200.0);
    }

    #[test]
    fn no_tap_no_marker() {
        let events: Vec<ReplayEvent> =
            read_events(File::open("./test-data/tap_spin_stop.csv").unwrap())
                .unwrap()
                .into_iter()
                .filter(|event| !matches!(event.input, ReplayInput::Touch(_)))
                .collect();
        let frames = run_replay(&ScreenConfig::default(), &events);

        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|frame| !frame.marker_visible));
        assert!(frames.iter().all(|frame| frame.marker_x.is_none()));
    }
}
