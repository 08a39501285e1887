use std::time::Duration;

use anyhow::{anyhow, Result};
use dial_compass::{CompassScreen, SensorEvent, TouchAction, TouchEvent};
use tokio::{
    sync::mpsc::unbounded_channel,
    time::{sleep_until, Instant},
};

use crate::{
    config::ScreenConfig,
    frame_recorder::{Frame, FrameRecorder},
    simulated_sensors::{SimulatedDevice, SimulatedSensorHub},
};

/// A press on the dial `at_ms` after the screen is resumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTap {
    pub x: f32,
    pub y: f32,
    pub at_ms: u64,
}

/// Parses `X,Y@MS`
pub fn scheduled_tap_parser(s: &str) -> Result<ScheduledTap, String> {
    let (position, at_ms) = s
        .split_once('@')
        .ok_or_else(|| format!("expected X,Y@MS, got {:?}", s))?;
    let (x, y) = position
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y@MS, got {:?}", s))?;

    Ok(ScheduledTap {
        x: x.trim().parse().map_err(|_| format!("bad x in {:?}", s))?,
        y: y.trim().parse().map_err(|_| format!("bad y in {:?}", s))?,
        at_ms: at_ms.trim().parse().map_err(|_| format!("bad time in {:?}", s))?,
    })
}

pub struct SimulationPlan {
    pub device: SimulatedDevice,
    pub duration_ms: u64,
    pub taps: Vec<ScheduledTap>,
    pub stop_at_ms: Option<u64>,
}

/// Runs the screen against the simulated device until the plan's duration
/// elapses. Returns a frame for every update of the view.
pub async fn simulate(config: &ScreenConfig, mut plan: SimulationPlan) -> Result<Vec<Frame>> {
    plan.taps.sort_by_key(|tap| tap.at_ms);
    let mut taps = plan.taps.into_iter().peekable();

    let start = Instant::now();
    let deadline = start + Duration::from_millis(plan.duration_ms);
    let stop_at = plan
        .stop_at_ms
        .map(|stop_at_ms| start + Duration::from_millis(stop_at_ms));
    let elapsed_ms = || start.elapsed().as_secs_f64() * 1000.0;

    let (tx, mut rx) = unbounded_channel();
    let mut hub = SimulatedSensorHub::new(plan.device, tx, start);
    let mut screen = CompassScreen::new(FrameRecorder::new(config));
    let mut frames = Vec::new();

    let mut active = screen
        .resume_with_delay(&mut hub, config.sensor_delay.into())
        .map_err(|e| anyhow!("failed to start sensors: {}", e))?;
    log::info!(
        "simulating {} ms with {:?}",
        plan.duration_ms,
        active.registered_sensors()
    );

    let mut stopped = false;
    loop {
        let next_tap = taps
            .peek()
            .map(|tap| start + Duration::from_millis(tap.at_ms));

        tokio::select! {
            _ = sleep_until(deadline) => break,
            _ = sleep_until(stop_at.unwrap_or(deadline)), if stop_at.is_some() && !stopped => {
                active.stop_sensors();
                stopped = true;
            }
            _ = sleep_until(next_tap.unwrap_or(deadline)), if next_tap.is_some() => {
                if let Some(tap) = taps.next() {
                    log::info!("tap at ({}, {})", tap.x, tap.y);
                    active.on_touch(&TouchEvent::new(TouchAction::Down, tap.x, tap.y));
                    let screen = active.screen();
                    frames.push(screen.view().frame(elapsed_ms(), screen.heading()));
                }
            }
            Some(event) = rx.recv() => {
                if active.on_sensor_event(&event) {
                    let screen = active.screen();
                    let timestamp = match &event {
                        SensorEvent::Sample(sample) => sample.timestamp(),
                        _ => elapsed_ms(),
                    };
                    let frame = screen.view().frame(timestamp, screen.heading());
                    log::debug!(
                        "heading {:?} rotation {:.1} marker {:?},{:?}",
                        frame.heading,
                        frame.dial_rotation,
                        frame.marker_x,
                        frame.marker_y
                    );
                    frames.push(frame);
                }
            }
        }
    }

    if let Some(heading) = active.screen().heading() {
        log::info!(
            "final heading {:.1}, {} frames",
            heading.normalized(),
            frames.len()
        );
    } else {
        log::warn!("no heading was ever computed");
    }
    active.pause();

    Ok(frames)
}
