use std::{fs::File, io::stdout, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dial_compass::{marker_position, Heading, MarkerOffset, RotationMatrix};
use log::LevelFilter;

use config::{load_screen_config, ScreenConfig};
use frame_recorder::{write_frames, Frame};
use replay::{read_events, run_replay};
use simulate::{scheduled_tap_parser, simulate, ScheduledTap, SimulationPlan};
use simulated_sensors::SimulatedDevice;

mod config;
mod frame_recorder;
mod interactive;
mod replay;
mod scripted_hub;
mod simulate;
mod simulated_sensors;

#[derive(Parser)]
#[command(name = "Compass CLI")]
#[command(bin_name = "compass-cli")]
struct Cli {
    /// Screen config (JSON), defaults to the per-user config if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Simulate(SimulateArgs),
    Replay(ReplayArgs),
    #[command(about = "Drive the screen from a prompt")]
    Interactive,
    Heading(HeadingArgs),
    Transform(TransformArgs),
}

#[derive(clap::Args)]
#[command(about = "Run the screen against a simulated spinning device")]
struct SimulateArgs {
    #[arg(long, default_value_t = 3000)]
    duration_ms: u64,

    /// Degrees per second, clockwise
    #[arg(long, default_value_t = 30.0, allow_negative_numbers = true)]
    spin_rate: f32,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    start_heading: f32,

    /// Uniform noise added to every sensor axis
    #[arg(long, default_value_t = 0.0)]
    noise: f32,

    /// Press the dial, as X,Y@MS
    #[arg(long = "tap", value_parser = scheduled_tap_parser)]
    taps: Vec<ScheduledTap>,

    /// Press the off button after this many ms
    #[arg(long)]
    stop_at: Option<u64>,

    #[arg(long, action)]
    no_magnetometer: bool,

    /// Frame CSV, stdout if omitted
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
#[command(about = "Replay a recorded timestamp,event,x,y,z log")]
struct ReplayArgs {
    events: PathBuf,

    /// Frame CSV, stdout if omitted
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
#[command(about = "Heading from one accelerometer and one magnetometer sample")]
#[command(allow_negative_numbers = true)]
struct HeadingArgs {
    ax: f32,
    ay: f32,
    az: f32,
    mx: f32,
    my: f32,
    mz: f32,
}

#[derive(clap::Args)]
#[command(about = "Marker position for a dial rotation and a tap offset")]
#[command(allow_negative_numbers = true)]
struct TransformArgs {
    rotation: f32,
    dx: f32,
    dy: f32,
}

fn output_frames(output: Option<PathBuf>, frames: &[Frame]) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_frames(file, frames)?;
            log::info!("wrote {} frames to {}", frames.len(), path.display());
        }
        None => write_frames(stdout().lock(), frames)?,
    }
    Ok(())
}

fn print_heading(args: HeadingArgs) {
    let gravity = [args.ax, args.ay, args.az];
    let geomagnetic = [args.mx, args.my, args.mz];

    match RotationMatrix::from_gravity_and_geomagnetic(&gravity, &geomagnetic) {
        Some(matrix) => {
            let orientation = matrix.orientation();
            let heading = Heading::from_orientation(&orientation);
            println!("heading:       {:.2}", heading.normalized());
            println!("dial rotation: {:.2}", heading.dial_rotation());
            println!("pitch:         {:.2}", orientation.pitch.to_degrees());
            println!("roll:          {:.2}", orientation.roll.to_degrees());
            println!("inclination:   {:.2}", matrix.inclination_angle().to_degrees());
        }
        None => println!("rotation matrix unavailable (free fall or field parallel to gravity)"),
    }
}

fn print_transform(config: &ScreenConfig, args: TransformArgs) {
    let position = marker_position(
        args.rotation,
        &MarkerOffset::new(args.dx, args.dy),
        config.dial_size(),
        config.marker_size(),
    );
    println!("{:.3} {:.3}", position.x, position.y);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .try_init();

    let config = load_screen_config(args.config.as_deref())?;
    log::debug!("{:?}", config);

    match args.command {
        Commands::Simulate(args) => {
            let plan = SimulationPlan {
                device: SimulatedDevice {
                    start_heading: args.start_heading,
                    spin_rate: args.spin_rate,
                    horizontal_field: config.horizontal_field_ut,
                    vertical_field: config.vertical_field_ut,
                    noise: args.noise,
                    has_magnetometer: !args.no_magnetometer,
                },
                duration_ms: args.duration_ms,
                taps: args.taps,
                stop_at_ms: args.stop_at,
            };
            let frames = simulate(&config, plan).await?;
            output_frames(args.output, &frames)?;
        }
        Commands::Replay(args) => {
            let file = File::open(&args.events)
                .with_context(|| format!("failed to open {}", args.events.display()))?;
            let events = read_events(file)?;
            let frames = run_replay(&config, &events);
            output_frames(args.output, &frames)?;
        }
        Commands::Interactive => interactive::interactive(&config)?,
        Commands::Heading(args) => print_heading(args),
        Commands::Transform(args) => print_transform(&config, args),
    }
    Ok(())
}
