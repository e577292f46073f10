use glam::Vec2;
use thiserror::Error;

pub mod body;
pub mod boundary;
pub mod grid;
pub mod kernel;
pub mod obstacle;
pub mod particles;
pub mod scene;
pub mod sph;

/// A pointer held down somewhere inside the domain, pulling (or pushing, for negative strengths)
/// nearby particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interaction<const D: usize> {
    pub point: [f32; D],
}

impl<const D: usize> Interaction<D> {
    pub fn new(point: [f32; D]) -> Self {
        Self { point }
    }
}

pub trait Fluid<const D: usize> {
    type Params;

    /// Advances the fluid by `dt` seconds using a single snapshot of `params`.
    ///
    /// Implementations may split `dt` into equal substeps. A step of `dt` split `n` times matches
    /// `n` unsplit steps of `dt / n`.
    fn step(
        &mut self,
        dt: f32,
        params: &Self::Params,
        interaction: Option<Interaction<D>>,
    ) -> Result<(), SimulationError>;

    /// Re-seeds every particle (and body) to its initial configuration.
    fn reset(&mut self, params: &Self::Params);

    /// Extent of the simulation domain along each axis.
    fn domain_size(params: &Self::Params) -> [f32; D];

    fn particle_radius(&self) -> f32;
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter {
        name: &'static str,
        value: f32,
    },
    #[error("particle {index} left the finite domain (position {position}, velocity {velocity})")]
    NonFiniteParticle {
        index: usize,
        position: Vec2,
        velocity: Vec2,
    },
    #[error("rigid disc left the finite domain (position {position}, velocity {velocity})")]
    NonFiniteDisc {
        position: Vec2,
        velocity: Vec2,
    },
}
