use glam::Vec2;
use log::{debug, info};

use tidepool_io::{DecodingError, FluidDataDecoder};

use crate::{AppError, InspectArgs};

pub fn inspect_d2(args: &InspectArgs) -> Result<(), AppError> {
    let mut decoder = FluidDataDecoder::new(args.input.clone());
    let meta = decoder.decode_metadata()?;
    let size = meta.size::<2>().ok_or(DecodingError::UnsupportedDimension(meta.dim))?;

    info!(
        "{} frames at {} fps, tank {}x{}, particle radius {}",
        meta.num_frames, meta.fps, size[0], size[1], meta.particle_radius,
    );

    let mut peak_speed = 0f32;
    let mut n_frames = 0u64;

    while let Some(frame) = decoder.decode_frame()? {
        let count = frame.positions.len::<2>();
        let centroid = frame.positions.iter::<2>().map(Vec2::from_array).sum::<Vec2>() / count.max(1) as f32;
        let max_speed = frame
            .velocities
            .iter::<2>()
            .map(|v| Vec2::from_array(v).length())
            .fold(0.0, f32::max);

        if args.frames {
            let disc = frame.disc.get::<2>(0).map(Vec2::from_array);
            println!("{n_frames:>6}  particles {count}  centroid {centroid}  max speed {max_speed:.3}  disc {disc:?}");
        } else {
            debug!("frame {n_frames}: centroid {centroid}, max speed {max_speed}");
        }

        peak_speed = peak_speed.max(max_speed);
        n_frames += 1;
    }

    println!("{n_frames} frames, peak particle speed {peak_speed:.3}");

    Ok(())
}
