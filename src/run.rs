use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use log::info;

use tidepool_fluids::{scene::Scene, sph::d2::SphFluid2D};
use tidepool_io::FluidDataEncoder;

use crate::{AppError, RunArgs};

pub fn run_d2(args: &RunArgs) -> Result<(), AppError> {
    let params = args.params();
    params.validate()?;

    let fluid = SphFluid2D::new(&params);
    let mut scene = Scene::new(fluid, params);
    scene.set_interaction(args.pointer().map(|p| p.to_array()));

    let frames = args.num_frames();
    let dt = 1.0 / args.fps as f32;

    let mut encoder = FluidDataEncoder::new(args.output.clone(), frames, args.fps)?;
    encoder.encode_metadata(&scene)?;

    let bar_template = "Running Simulation {spinner:.green} [{elapsed}] [{bar:50.white/white}] {pos}/{len} ({eta})";
    let style = ProgressStyle::with_template(bar_template)?
        .progress_chars("=> ").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress = ProgressBar::new(frames).with_style(style);

    scene.play();
    for _ in (0..frames).progress_with(progress) {
        scene.advance(dt)?;
        encoder.encode_frame(&scene)?;
    }

    info!(
        "simulated {} particles for {} steps into {}",
        scene.fluid.len(),
        scene.steps(),
        args.output.display(),
    );

    Ok(())
}
