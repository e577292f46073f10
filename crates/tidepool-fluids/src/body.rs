use glam::Vec2;

use crate::obstacle::{circle::Circle, Obstacle};

/// A dynamic disc that particles collide with and push around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidDisc {
    pub shape: Circle,
    pub velocity: Vec2,
    pub mass: f32,
}

/// A particle touching the disc during a collision pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Pre-collision particle velocity projected on the contact normal.
    pub normal_velocity: Vec2,
}

impl RigidDisc {
    pub fn new(position: Vec2, radius: f32, mass: f32) -> Self {
        Self {
            shape: Circle::new(position, radius),
            velocity: Vec2::ZERO,
            mass,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.shape.position
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.shape.radius
    }

    /// Keeps a particle of radius `r` outside the disc.
    ///
    /// The approaching part of the velocity is reflected about the contact normal and scaled by
    /// `damping`. When `position` is given it is also pushed out onto the disc boundary.
    /// `fallback` supplies the normal for a particle sitting exactly on the center.
    pub fn collide(
        &self,
        p: Vec2,
        velocity: &mut Vec2,
        position: Option<&mut Vec2>,
        r: f32,
        damping: f32,
        fallback: impl FnOnce() -> Vec2,
    ) -> Option<Contact> {
        let sdf = self.shape.sdf(p.into());
        if sdf.distance >= r {
            return None;
        }

        let mut normal = Vec2::from(sdf.gradient);
        if normal == Vec2::ZERO {
            normal = fallback();
        }

        let vn = velocity.dot(normal);
        let contact = Contact {
            normal_velocity: vn * normal,
        };

        if let Some(position) = position {
            *position = self.position() + normal * (self.radius() + r);
        }

        if vn < 0.0 {
            *velocity -= (1.0 + damping) * vn * normal;
        }

        Some(contact)
    }

    /// Applies gravity and the summed reaction of the particles that hit the disc, then moves it.
    pub fn integrate(&mut self, dt: f32, gravity: f32, reaction: Vec2) {
        self.velocity += Vec2::NEG_Y * gravity * dt + reaction / self.mass;
        let position = self.position() + self.velocity * dt;
        self.shape.set_position(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distant_particles_are_untouched() {
        let disc = RigidDisc::new(Vec2::ZERO, 1.0, 1.0);
        let mut v = Vec2::new(-1.0, 0.0);
        let mut p = Vec2::new(2.0, 0.0);

        assert!(disc.collide(p, &mut v, Some(&mut p), 0.1, 0.5, || Vec2::Y).is_none());
        assert_eq!(p, Vec2::new(2.0, 0.0));
        assert_eq!(v, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn penetrating_particle_is_pushed_out_and_bounced() {
        let disc = RigidDisc::new(Vec2::ZERO, 1.0, 1.0);
        let mut p = Vec2::new(0.9, 0.0);
        let mut v = Vec2::new(-2.0, 1.0);

        let contact = disc.collide(p, &mut v, Some(&mut p), 0.1, 0.5, || Vec2::Y).unwrap();

        assert!((p - Vec2::new(1.1, 0.0)).length() < 1e-6);
        assert!((v - Vec2::new(1.0, 1.0)).length() < 1e-6);
        assert_eq!(contact.normal_velocity, Vec2::new(-2.0, 0.0));
    }

    #[test]
    fn prediction_pass_leaves_position_alone() {
        let disc = RigidDisc::new(Vec2::ZERO, 1.0, 1.0);
        let p = Vec2::new(0.0, 1.05);
        let mut v = Vec2::new(0.0, -3.0);

        assert!(disc.collide(p, &mut v, None, 0.1, 0.0, || Vec2::Y).is_some());
        assert_eq!(v, Vec2::ZERO);
    }

    #[test]
    fn separating_velocity_is_kept() {
        let disc = RigidDisc::new(Vec2::ZERO, 1.0, 1.0);
        let mut p = Vec2::new(0.0, 0.5);
        let mut v = Vec2::new(0.0, 2.0);

        disc.collide(p, &mut v, Some(&mut p), 0.1, 0.3, || Vec2::Y);
        assert_eq!(v, Vec2::new(0.0, 2.0));
    }

    #[test]
    fn centered_particle_uses_fallback_normal() {
        let disc = RigidDisc::new(Vec2::new(1.0, 1.0), 0.5, 1.0);
        let mut p = Vec2::new(1.0, 1.0);
        let mut v = Vec2::ZERO;

        assert!(disc.collide(p, &mut v, Some(&mut p), 0.1, 0.5, || Vec2::X).is_some());

        assert!((p - Vec2::new(1.6, 1.0)).length() < 1e-6);
        assert!(p.is_finite() && v.is_finite());
    }

    #[test]
    fn reaction_is_scaled_by_mass() {
        let mut disc = RigidDisc::new(Vec2::ZERO, 1.0, 4.0);
        disc.integrate(0.5, 0.0, Vec2::new(8.0, 0.0));

        assert_eq!(disc.velocity, Vec2::new(2.0, 0.0));
        assert_eq!(disc.position(), Vec2::new(1.0, 0.0));
    }
}
