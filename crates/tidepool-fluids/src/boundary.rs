use glam::Vec2;

use crate::obstacle::ramp::Ramp;

/// Axis-aligned tank centered on the origin, optionally with a ramp in its bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tank {
    pub half_size: Vec2,
    pub ramp: Option<Ramp>,
}

impl Tank {
    /// A `ramp_size` of zero means no ramp.
    pub fn new(width: f32, height: f32, ramp_size: f32) -> Self {
        let half_size = 0.5 * Vec2::new(width, height);
        let ramp = (ramp_size > 0.0).then(|| Ramp::new(-half_size, ramp_size));

        Self { half_size, ramp }
    }

    /// Allowed range for the center of a body of the given `radius`.
    pub fn bounds(&self, radius: f32) -> (Vec2, Vec2) {
        let min = -self.half_size + radius;
        let max = self.half_size - radius;

        (min, max)
    }

    /// Moves a body of the given `radius` back inside the tank, bouncing its velocity off
    /// whatever wall it crossed. Returns whether any correction was applied.
    pub fn confine(&self, p: &mut Vec2, v: &mut Vec2, radius: f32, damping: f32) -> bool {
        let (min, max) = self.bounds(radius);
        let mut hit = clamp_axes(p, v, min, max, damping);

        if let Some(ramp) = &self.ramp {
            if ramp.contains(*p) {
                *p = ramp.closest_point(*p) + Ramp::NORMAL * radius;

                let vn = v.dot(Ramp::NORMAL);
                if vn < 0.0 {
                    *v -= (1.0 + damping) * vn * Ramp::NORMAL;
                }

                // A ramp longer than the tank projects past the opposite walls.
                clamp_axes(p, v, min, max, damping);
                hit = true;
            }
        }

        hit
    }
}

fn clamp_axes(p: &mut Vec2, v: &mut Vec2, min: Vec2, max: Vec2, damping: f32) -> bool {
    let mut hit = false;

    if p.x < min.x {
        p.x = min.x;
        v.x *= -damping;
        hit = true;
    } else if p.x > max.x {
        p.x = max.x;
        v.x *= -damping;
        hit = true;
    }

    if p.y < min.y {
        p.y = min.y;
        v.y *= -damping;
        hit = true;
    } else if p.y > max.y {
        p.y = max.y;
        v.y *= -damping;
        hit = true;
    }

    hit
}
