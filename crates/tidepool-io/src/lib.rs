use std::{io::Write, path::{Path, PathBuf}};

use tidepool_fluids::sph::d2::SphFluid2D;

pub mod encode;
pub mod decode;
pub mod as_bytes;

pub use decode::{DecodingError, FluidDataDecoder};
pub use encode::{EncodingError, FluidDataEncoder, FluidFrameEncoder};

pub(crate) const METADATA_FILE: &str = "_meta";

pub trait EncodeFluid {
    fn encode_state<W: Write>(&self, encoder: &mut FluidFrameEncoder<W>) -> Result<(), EncodingError>;
}

impl EncodeFluid for SphFluid2D {
    fn encode_state<W: Write>(&self, encoder: &mut FluidFrameEncoder<W>) -> Result<(), EncodingError> {
        let particles = self.particles();

        encoder.encode_section(particles.len(), particles.positions.iter().copied())?;
        encoder.encode_section(particles.len(), particles.velocities.iter().copied())?;

        let disc = self.disc().map(|disc| disc.position());
        encoder.encode_section(disc.iter().len(), disc.into_iter())?;

        Ok(())
    }
}

/// Frame files are zero-padded so that they sort in playback order.
pub(crate) fn frame_path(dir: &Path, num_frames: u64, frame: u64) -> PathBuf {
    let max_digits = num_frames.saturating_sub(1).checked_ilog10().unwrap_or(0) + 1;
    let digits = frame.checked_ilog10().unwrap_or(0) + 1;
    let zeros = max_digits.saturating_sub(digits);

    dir.join(format!("{}{frame}.dat", "0".repeat(zeros as usize)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_names_are_padded() {
        let dir = Path::new("out");

        assert_eq!(frame_path(dir, 120, 7), dir.join("007.dat"));
        assert_eq!(frame_path(dir, 120, 119), dir.join("119.dat"));
        assert_eq!(frame_path(dir, 1, 0), dir.join("0.dat"));
        assert_eq!(frame_path(dir, 0, 0), dir.join("0.dat"));
    }
}
