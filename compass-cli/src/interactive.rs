use std::time::Instant;

use anyhow::{anyhow, Result};
use dial_compass::{
    rotation::STANDARD_GRAVITY, ActiveScreen, CompassScreen, SensorReading, SensorSample,
    TouchAction, TouchEvent,
};
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::{
    config::ScreenConfig, frame_recorder::FrameRecorder, scripted_hub::ScriptedSensorHub,
    simulated_sensors::SimulatedDevice,
};

const HELP: &str = "\
tap <x> <y>          press the dial at (x, y)
heading <degrees>    deliver a level gravity sample and the field for this heading
acc <x> <y> <z>      deliver a raw accelerometer sample
mag <x> <y> <z>      deliver a raw magnetometer sample
stop                 turn the sensors off
status               show the dial and the marker
quit                 leave";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Tap(f32, f32),
    Heading(f32),
    Accelerometer([f32; 3]),
    Magnetometer([f32; 3]),
    Stop,
    Status,
    Help,
    Quit,
}

fn parse_floats<const N: usize>(args: &[&str]) -> Result<[f32; N]> {
    if args.len() != N {
        return Err(anyhow!("expected {} numbers, got {}", N, args.len()));
    }
    let mut values = [0f32; N];
    for (value, arg) in values.iter_mut().zip(args) {
        *value = arg
            .parse()
            .map_err(|_| anyhow!("{:?} is not a number", arg))?;
    }
    Ok(values)
}

fn parse_command(line: &str) -> Result<Command> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((name, args)) = words.split_first() else {
        return Err(anyhow!("empty command"));
    };

    Ok(match *name {
        "tap" => {
            let [x, y] = parse_floats::<2>(args)?;
            Command::Tap(x, y)
        }
        "heading" => {
            let [degrees] = parse_floats::<1>(args)?;
            Command::Heading(degrees)
        }
        "acc" => Command::Accelerometer(parse_floats(args)?),
        "mag" => Command::Magnetometer(parse_floats(args)?),
        "stop" => Command::Stop,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("unknown command {:?}, try help", other)),
    })
}

fn print_status(active: &ActiveScreen<'_, FrameRecorder, ScriptedSensorHub>, elapsed_ms: f64) {
    let screen = active.screen();
    let frame = screen.view().frame(elapsed_ms, screen.heading());
    match frame.heading {
        Some(heading) => println!(
            "heading {:.1}, dial rotation {:.1}",
            heading, frame.dial_rotation
        ),
        None => println!("no heading yet"),
    }
    match (frame.marker_x, frame.marker_y) {
        (Some(x), Some(y)) => println!("marker at ({:.1}, {:.1})", x, y),
        _ => println!("no marker"),
    }
    if !screen.is_listening() {
        println!("sensors are off");
    }
}

pub fn interactive(config: &ScreenConfig) -> Result<()> {
    let device = SimulatedDevice {
        start_heading: 0.0,
        spin_rate: 0.0,
        horizontal_field: config.horizontal_field_ut,
        vertical_field: config.vertical_field_ut,
        noise: 0.0,
        has_magnetometer: true,
    };
    let mut screen = CompassScreen::new(FrameRecorder::new(config));
    let mut hub = ScriptedSensorHub::new();
    let mut active = match screen.resume_with_delay(&mut hub, config.sensor_delay.into()) {
        Ok(active) => active,
        Err(infallible) => match infallible {},
    };

    let mut rl = DefaultEditor::new()?;
    let start = Instant::now();
    println!("{}", HELP);

    loop {
        let line = match rl.readline("compass> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        rl.add_history_entry(line.as_str())?;

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match command {
            Command::Tap(x, y) => {
                active.on_touch(&TouchEvent::new(TouchAction::Down, x, y));
            }
            Command::Heading(degrees) => {
                let gravity = SensorReading::new(elapsed_ms, [0.0, 0.0, STANDARD_GRAVITY]);
                let field = SensorReading::new(elapsed_ms, device.field_at_heading(degrees));
                active.on_sensor_event(&SensorSample::Accelerometer(gravity).into());
                if !active.on_sensor_event(&SensorSample::Magnetometer(field).into()) {
                    println!("sample ignored");
                }
            }
            Command::Accelerometer(values) => {
                let reading = SensorReading::new(elapsed_ms, values);
                if !active.on_sensor_event(&SensorSample::Accelerometer(reading).into()) {
                    println!("no update");
                }
            }
            Command::Magnetometer(values) => {
                let reading = SensorReading::new(elapsed_ms, values);
                if !active.on_sensor_event(&SensorSample::Magnetometer(reading).into()) {
                    println!("no update");
                }
            }
            Command::Stop => active.stop_sensors(),
            Command::Status => {}
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Quit => break,
        }

        print_status(&active, elapsed_ms);
    }

    active.pause();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("tap 10 20.5").unwrap(), Command::Tap(10.0, 20.5));
        assert_eq!(parse_command("  heading  -45 ").unwrap(), Command::Heading(-45.0));
        assert_eq!(
            parse_command("mag 0 22 -40").unwrap(),
            Command::Magnetometer([0.0, 22.0, -40.0])
        );
        assert_eq!(parse_command("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_bad_commands() {
        assert!(parse_command("tap 10").is_err());
        assert!(parse_command("acc 1 2 x").is_err());
        assert!(parse_command("spin").is_err());
        assert!(parse_command("").is_err());
    }
}
