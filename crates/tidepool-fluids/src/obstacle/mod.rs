pub mod circle;
pub mod ramp;

/// A solid shape that particles are kept out of.
pub trait Obstacle<const D: usize> {
    fn sdf(&self, p: [f32; D]) -> Sdf<D>;
}

/// Signed distance to an obstacle surface (negative inside) and the outward surface normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sdf<const D: usize> {
    pub distance: f32,
    pub gradient: [f32; D],
}

impl<const D: usize> Sdf<D> {
    pub fn new(distance: f32, gradient: [f32; D]) -> Sdf<D> {
        Sdf { distance, gradient }
    }
}
