use glam::Vec2;

use super::{Obstacle, Sdf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub position: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Circle {
            position: pos,
            radius,
        }
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.position = pos;
    }
}

impl Obstacle<2> for Circle {
    /// At the exact center the gradient is zero; callers pick their own direction there.
    fn sdf(&self, p: [f32; 2]) -> Sdf<2> {
        let p: Vec2 = p.into();
        let offset = p - self.position;
        let d = offset.length();

        Sdf::new(d - self.radius, offset.normalize_or_zero().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdf_is_signed() {
        let c = Circle::new(Vec2::new(1.0, 1.0), 0.5);

        let inside = c.sdf([1.25, 1.0]);
        assert!((inside.distance + 0.25).abs() < 1e-6);
        assert_eq!(inside.gradient, [1.0, 0.0]);

        let outside = c.sdf([1.0, 3.0]);
        assert!((outside.distance - 1.5).abs() < 1e-6);
        assert_eq!(outside.gradient, [0.0, 1.0]);
    }

    #[test]
    fn sdf_at_center_has_no_direction() {
        let c = Circle::new(Vec2::ZERO, 1.0);
        let sdf = c.sdf([0.0, 0.0]);

        assert_eq!(sdf.distance, -1.0);
        assert_eq!(sdf.gradient, [0.0, 0.0]);
    }
}
