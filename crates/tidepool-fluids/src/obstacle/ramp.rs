use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec2;

/// Diagonal wall cutting off the bottom-left corner of an axis-aligned tank.
///
/// The excluded region is the triangle between the tank corner and the two ramp endpoints
/// `(min.x, min.y + size)` and `(min.x + size, min.y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub corner: Vec2,
    pub size: f32,
}

impl Ramp {
    /// Outward normal of the ramp surface.
    pub const NORMAL: Vec2 = Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2);

    pub fn new(corner: Vec2, size: f32) -> Self {
        Self { corner, size }
    }

    #[inline]
    pub fn start(&self) -> Vec2 {
        self.corner + Vec2::new(0.0, self.size)
    }

    #[inline]
    pub fn end(&self) -> Vec2 {
        self.corner + Vec2::new(self.size, 0.0)
    }

    /// Whether `p` lies in the cut-off triangle (edges included).
    pub fn contains(&self, p: Vec2) -> bool {
        let (a, b, c) = (self.corner, self.start(), self.end());

        let d1 = (p - b).perp_dot(a - b);
        let d2 = (p - c).perp_dot(b - c);
        let d3 = (p - a).perp_dot(c - a);

        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

        !(has_neg && has_pos)
    }

    /// Closest point to `p` on the ramp segment.
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let (a, b) = (self.start(), self.end());
        let ab = b - a;
        let t = ((p - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);

        a + ab * t
    }
}
