use std::{fs::File, io::{BufReader, ErrorKind, Read}, path::PathBuf};

use smallvec::SmallVec;
use thiserror::Error;

use super::as_bytes::AsBytes;

pub struct FluidDataDecoder {
    /// The path to the directory in which the fluid data resides.
    path: PathBuf,
    dim: u8,
    num_frames: u64,
    current_frame: u64,
}

impl FluidDataDecoder {
    pub fn new(path: PathBuf) -> FluidDataDecoder {
        Self {
            path,
            dim: 0,
            num_frames: 0,
            current_frame: 0,
        }
    }

    fn read_value<const N: usize, T: AsBytes<N>, R: Read>(reader: &mut R) -> Result<T, DecodingError> {
        let mut bytes = [0; N];
        reader.read_exact(&mut bytes).map_err(DecodingError::from_read)?;

        Ok(T::from_bytes(bytes))
    }

    fn read_section<R: Read>(reader: &mut R, dim: u8) -> Result<FluidDataArray, DecodingError> {
        let len = Self::read_value::<8, u64, _>(reader)?;
        let byte_len = usize::try_from(len)
            .ok()
            .and_then(|len| len.checked_mul(dim as usize * 4))
            .ok_or(DecodingError::Truncated)?;

        let mut bytes = Vec::new();
        reader.take(byte_len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != byte_len {
            return Err(DecodingError::Truncated);
        }

        let values = bytes
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(FluidDataArray(values))
    }

    fn frame_path(&self, frame: u64) -> PathBuf {
        crate::frame_path(&self.path, self.num_frames, frame)
    }

    pub fn decode_metadata(&mut self) -> Result<FluidMetadata, DecodingError> {
        let path = self.path.join(crate::METADATA_FILE);
        let mut reader = BufReader::new(File::open(path)?);

        let dim = Self::read_value::<1, u8, _>(&mut reader)?;
        if !(1..=3).contains(&dim) {
            return Err(DecodingError::UnsupportedDimension(dim));
        }

        let fps = Self::read_value::<4, u32, _>(&mut reader)?;
        let num_frames = Self::read_value::<8, u64, _>(&mut reader)?;
        let particle_radius = Self::read_value::<4, f32, _>(&mut reader)?;
        let mut size: SmallVec<[_; 4]> = SmallVec::new();

        for _ in 0..dim {
            let v = Self::read_value::<4, f32, _>(&mut reader)?;
            size.push(v);
        }

        self.dim = dim;
        self.num_frames = num_frames;

        Ok(FluidMetadata {
            dim,
            fps,
            num_frames,
            particle_radius,
            size,
        })
    }

    /// Reads the next frame, or `None` once every recorded frame was read.
    pub fn decode_frame(&mut self) -> Result<Option<FluidFrameData>, DecodingError> {
        if self.current_frame >= self.num_frames {
            return Ok(None)
        }

        let path = self.frame_path(self.current_frame);
        let mut reader = BufReader::new(File::open(path)?);

        let positions = Self::read_section(&mut reader, self.dim)?;
        let velocities = Self::read_section(&mut reader, self.dim)?;
        let disc = Self::read_section(&mut reader, self.dim)?;

        self.current_frame += 1;

        Ok(Some(FluidFrameData {
            positions,
            velocities,
            disc,
        }))
    }

    pub fn reset(&mut self) {
        self.current_frame = 0;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FluidMetadata {
    pub dim: u8,
    pub fps: u32,
    pub num_frames: u64,
    pub particle_radius: f32,
    pub size: SmallVec<[f32; 4]>,
}

impl FluidMetadata {
    pub fn size<const D: usize>(&self) -> Option<[f32; D]> {
        self.size.get(..D)?.try_into().ok()
    }
}

#[derive(Clone, Debug)]
pub struct FluidFrameData {
    pub positions: FluidDataArray,
    pub velocities: FluidDataArray,
    /// Empty when the rigid disc was disabled for this frame.
    pub disc: FluidDataArray,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FluidDataArray(Vec<f32>);

impl FluidDataArray {
    pub fn iter<const D: usize>(&self) -> impl Iterator<Item = [f32; D]> + use<'_, D> {
        self.0
            .chunks_exact(D)
            .filter_map(|chunk| <[f32; D]>::try_from(chunk).ok())
    }

    pub fn get<const D: usize>(&self, i: usize) -> Option<[f32; D]> {
        self.0.get(i * D..(i + 1) * D)?.try_into().ok()
    }

    pub fn len<const D: usize>(&self) -> usize {
        self.0.len() / D
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unsupported recording dimension {0}")]
    UnsupportedDimension(u8),
    #[error("recording ended in the middle of a value")]
    Truncated,
}

impl DecodingError {
    fn from_read(e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_array_indexes_whole_vectors() {
        let array = FluidDataArray(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(array.len::<2>(), 3);
        assert_eq!(array.get::<2>(1), Some([2.0, 3.0]));
        assert_eq!(array.get::<2>(3), None);
        assert_eq!(array.iter::<3>().collect::<Vec<_>>(), vec![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
    }

    #[test]
    fn short_section_is_truncated() {
        let mut bytes = 2u64.to_ne_bytes().to_vec();
        bytes.extend(1.0f32.to_ne_bytes());

        let result = FluidDataDecoder::read_section(&mut bytes.as_slice(), 2);
        assert!(matches!(result, Err(DecodingError::Truncated)));
    }
}
