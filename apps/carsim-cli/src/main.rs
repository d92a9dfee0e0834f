use std::path::PathBuf;

use anyhow::Context;
use carsim_common::RenderPose;
use carsim_input::{ControlState, PedalAction};
use carsim_kernel::{Controls, ProfileConfig, Vehicle, VehicleProfile};
use carsim_tools::{TelemetryLog, VehicleInspector};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "carsim-cli", about = "CLI tool for the carsim vehicle integrator")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the reference vehicle profile
    Info,
    /// Write the reference profile as JSON
    Profile {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Drive the integrator with constant controls
    Run {
        /// Number of frames to simulate
        #[arg(short = 'n', long, default_value = "600")]
        steps: u64,
        /// Frame time in seconds
        #[arg(long, default_value = "0.016666666666666666")]
        dt: f64,
        /// Longest integration sub-step; frames are split to fit
        #[arg(long)]
        max_step: Option<f64>,
        #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
        fuel: f64,
        #[arg(long, default_value = "0.0")]
        brake: f64,
        /// Normalized steering, positive turns left
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        steering: f64,
        /// JSON vehicle profile (reference car when omitted)
        #[arg(short, long)]
        profile: Option<PathBuf>,
        /// Write per-step telemetry to this JSON file
        #[arg(short, long)]
        telemetry: Option<PathBuf>,
        /// Keep one telemetry sample every N frames
        #[arg(long, default_value = "1")]
        stride: u64,
    },
    /// Drive a scripted lap from key edges, replay it, and compare state hashes
    Replay {
        /// Number of frames to simulate
        #[arg(short = 'n', long, default_value = "900")]
        steps: u64,
        /// Frame time in seconds
        #[arg(long, default_value = "0.016666666666666666")]
        dt: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let profile = VehicleProfile::reference();
            let p = profile.params();
            println!("carsim-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "reference car: mass={}kg wheelbase={}m wheel_radius={}m drive_ratio={:.3}",
                p.mass,
                profile.wheelbase(),
                p.wheel_radius,
                profile.total_drive_ratio()
            );
            println!("engine: {:?}", profile.engine());
        }
        Commands::Profile { out } => {
            let config = ProfileConfig::default();
            match out {
                Some(path) => {
                    config
                        .save(&path)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("wrote {}", path.display());
                }
                None => println!("{}", config.to_json_pretty()?),
            }
        }
        Commands::Run {
            steps,
            dt,
            max_step,
            fuel,
            brake,
            steering,
            profile,
            telemetry,
            stride,
        } => {
            anyhow::ensure!(dt > 0.0, "dt must be positive, got {dt}");
            let profile = match profile {
                Some(path) => ProfileConfig::load_profile(&path)
                    .with_context(|| format!("loading profile {}", path.display()))?,
                None => VehicleProfile::reference(),
            };
            let controls = Controls::new(fuel, brake).with_steering(steering);
            let mut vehicle = Vehicle::new(profile);
            let mut log = TelemetryLog::with_stride(stride);

            tracing::info!(steps, dt, ?controls, "running");
            for _ in 0..steps {
                match max_step {
                    Some(max) => vehicle.simulate_substepped(controls, dt, max),
                    None => vehicle.simulate(controls, dt),
                }
                log.record(&vehicle);
            }

            println!("{}", VehicleInspector::summary(&vehicle));
            let pose: RenderPose = vehicle.render_pose();
            println!(
                "pose: pos=({:.2}, {:.2}, {:.2}) wheels front={:.1}rad rear={:.1}rad steer={:.3}rad",
                pose.body.position.x,
                pose.body.position.y,
                pose.body.position.z,
                pose.front_wheel_spin,
                pose.rear_wheel_spin,
                pose.front_wheel_steer
            );

            if let Some(path) = telemetry {
                log.save(&path)
                    .with_context(|| format!("writing telemetry {}", path.display()))?;
            }
        }
        Commands::Replay { steps, dt } => {
            anyhow::ensure!(dt > 0.0, "dt must be positive, got {dt}");
            println!("Scripted drive: steps={steps}, dt={dt}");

            let mut vehicle = Vehicle::new(VehicleProfile::reference());
            let mut input = ControlState::new();
            for frame in 0..steps {
                script_edges(&mut input, frame, steps);
                vehicle.simulate(input.controls(), dt);
            }
            let events = vehicle.events().to_vec();
            let replayed = Vehicle::replay(VehicleProfile::reference(), &events);

            println!("Run:    {}", VehicleInspector::summary(&vehicle));
            println!("Replay: {}", VehicleInspector::summary(&replayed));
            println!(
                "Hash: {:#018x} vs {:#018x} -> {}",
                vehicle.state_hash(),
                replayed.state_hash(),
                if vehicle.state_hash() == replayed.state_hash() {
                    "OK"
                } else {
                    "MISMATCH"
                }
            );
        }
    }

    Ok(())
}

/// Accelerate, turn left while coasting, then brake to a stop.
fn script_edges(input: &mut ControlState, frame: u64, steps: u64) {
    let third = (steps / 3).max(1);
    if frame == 0 {
        input.press(PedalAction::Fuel);
    } else if frame == third {
        input.release(PedalAction::Fuel);
        input.press(PedalAction::SteerLeft);
    } else if frame == 2 * third {
        input.release(PedalAction::SteerLeft);
        input.press(PedalAction::Brake);
    }
}
