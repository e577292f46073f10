use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use glam::Vec2;
use log::error;
use thiserror::Error;

use tidepool_fluids::{sph::d2::SphFluid2DParams, SimulationError};
use tidepool_io::{DecodingError, EncodingError};

mod inspect;
mod run;

#[derive(Parser, Debug)]
#[command(name = "tidepool")]
#[command(about = "Headless 2D SPH fluid tank with a rigid disc and a ramp", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate the tank and record every frame.
    Run(RunArgs),
    /// Summarize a recording.
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Directory the recording is written to.
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Length of the recording in seconds.
    #[arg(long, default_value_t = 10.0)]
    duration: f32,

    #[arg(long, default_value_t = 1600)]
    particles: usize,

    #[arg(long, default_value_t = 9.8)]
    gravity: f32,

    /// Fraction of the normal velocity kept after hitting a wall.
    #[arg(long, default_value_t = 0.5)]
    damping: f32,

    #[arg(long, default_value_t = 200.0)]
    pressure: f32,

    #[arg(long, default_value_t = 0.06)]
    viscosity: f32,

    /// Leg length of the ramp in the bottom-left corner. 0 disables it.
    #[arg(long, default_value_t = 0.0)]
    ramp: f32,

    /// Drop the rigid disc into the tank.
    #[arg(long, default_value_t = false)]
    ball: bool,

    #[arg(long, default_value_t = 50.0)]
    ball_mass: f32,

    /// Hold the pointer at this point for the whole run.
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pointer: Option<Vec<f32>>,

    /// Pointer strength. Negative values push particles away.
    #[arg(long, default_value_t = 90.0, allow_negative_numbers = true)]
    strength: f32,
}

impl RunArgs {
    fn params(&self) -> SphFluid2DParams {
        SphFluid2DParams {
            gravity: self.gravity,
            collision_damping: self.damping,
            pressure_multiplier: self.pressure,
            viscosity_strength: self.viscosity,
            interaction_strength: self.strength,
            ramp_size: self.ramp,
            ball_mass: self.ball_mass,
            apply_ball_physics: self.ball,
            particle_count: self.particles,
            ..Default::default()
        }
    }

    fn pointer(&self) -> Option<Vec2> {
        match self.pointer.as_deref() {
            Some(&[x, y]) => Some(Vec2::new(x, y)),
            _ => None,
        }
    }

    fn num_frames(&self) -> u64 {
        (self.duration.max(0.0) * self.fps as f32).round() as u64
    }
}

#[derive(Args, Debug, Clone)]
struct InspectArgs {
    /// Directory holding the recording.
    #[arg(default_value = "output")]
    input: PathBuf,

    /// Print a line for every frame instead of only the summary.
    #[arg(long, default_value_t = false)]
    frames: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),
    #[error("could not write recording: {0}")]
    Encoding(#[from] EncodingError),
    #[error("could not read recording: {0}")]
    Decoding(#[from] DecodingError),
    #[error(transparent)]
    Template(#[from] indicatif::style::TemplateError),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run::run_d2(&args),
        Command::Inspect(args) => inspect::inspect_d2(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
