use std::{fs::File, io::{BufWriter, Write}, path::PathBuf};

use log::info;
use thiserror::Error;

use tidepool_fluids::{scene::Scene, Fluid};

use crate::EncodeFluid;

use super::as_bytes::AsBytes;

pub struct FluidDataEncoder {
    /// The path to the directory into which the fluid data will be placed.
    path: PathBuf,
    num_frames: u64,
    fps: u32,
    current_frame: u64,
}

impl FluidDataEncoder {
    pub fn new(path: PathBuf, num_frames: u64, fps: u32) -> Result<FluidDataEncoder, EncodingError> {
        std::fs::create_dir_all(&path)?;
        info!("recording {num_frames} frames to {}", path.display());

        Ok(Self {
            path,
            num_frames,
            fps,
            current_frame: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.current_frame
    }

    fn frame_path(&self, frame: u64) -> PathBuf {
        crate::frame_path(&self.path, self.num_frames, frame)
    }

    pub fn encode_metadata<const D: usize, F, P>(&mut self, scene: &Scene<D, F, P>) -> Result<(), EncodingError>
    where 
        F: Fluid<D, Params = P>,
    {
        let path = self.path.join(crate::METADATA_FILE);
        let mut writer = BufWriter::new(File::create(path)?);

        writer.write_all(&(D as u8).to_bytes())?;
        writer.write_all(&self.fps.to_bytes())?;
        writer.write_all(&self.num_frames.to_bytes())?;

        writer.write_all(&scene.fluid.particle_radius().to_bytes())?;

        for extent in scene.size() {
            writer.write_all(&extent.to_bytes())?;
        }

        writer.flush()?;

        Ok(())
    }

    pub fn encode_frame<const D: usize, F, P>(&mut self, scene: &Scene<D, F, P>) -> Result<(), EncodingError>
    where 
        F: EncodeFluid + Fluid<D, Params = P>,
    {
        if self.current_frame >= self.num_frames {
            return Err(EncodingError::TooManyFrames(self.num_frames));
        }

        let path = self.frame_path(self.current_frame);
        let writer = BufWriter::new(File::create(path)?);

        let mut encoder = FluidFrameEncoder { writer };
        scene.fluid.encode_state(&mut encoder)?;
        encoder.writer.flush()?;

        self.current_frame += 1;

        Ok(())
    }
}

pub struct FluidFrameEncoder<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> FluidFrameEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: BufWriter::new(writer) }
    }

    /// Writes a section of `len` values, prefixed with its length.
    pub fn encode_section<const N: usize, T, I>(&mut self, len: usize, values: I) -> Result<(), EncodingError>
    where
        I: Iterator<Item = T>,
        T: AsBytes<N>,
    {
        self.writer.write_all(&(len as u64).to_bytes())?;

        let bytes: Vec<_> = values.flat_map(|v| v.to_bytes()).collect();
        self.writer.write_all(&bytes)?;

        Ok(())
    }

    pub fn finish(mut self) -> Result<W, EncodingError> {
        self.writer.flush()?;
        self.writer.into_inner().map_err(|e| EncodingError::Io(e.into_error()))
    }
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("recording was sized for {0} frames")]
    TooManyFrames(u64),
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    #[test]
    fn section_is_length_prefixed() {
        let mut encoder = FluidFrameEncoder::new(Vec::new());
        encoder
            .encode_section(2, [Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)].into_iter())
            .unwrap();
        let bytes = encoder.finish().unwrap();

        assert_eq!(bytes.len(), 8 + 2 * 8);
        assert_eq!(bytes[..8], 2u64.to_ne_bytes());
        assert_eq!(bytes[8..12], 1.0f32.to_ne_bytes());
        assert_eq!(bytes[20..], 4.0f32.to_ne_bytes());
    }
}
