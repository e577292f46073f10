use glam::Vec2;

/// Per-particle state, stored as parallel arrays.
#[derive(Debug, Clone, Default)]
pub struct ParticleState {
    /// Particle positions.
    pub positions: Vec<Vec2>,
    /// Particle velocities.
    pub velocities: Vec<Vec2>,
    /// One-step-ahead position estimates the neighbor search runs on.
    pub predicted: Vec<Vec2>,
    /// Particle densities. Strictly positive after the first density pass.
    pub densities: Vec<f32>,
}

impl ParticleState {
    /// Lays out `count` resting particles on a square grid with the given `spacing`, centered on
    /// `center`.
    pub fn packed(count: usize, center: Vec2, spacing: f32) -> Self {
        let per_row = (count as f32).sqrt().ceil() as usize;
        let rows = if per_row == 0 { 0 } else { count.div_ceil(per_row) };
        let extent = Vec2::new(
            per_row.saturating_sub(1) as f32,
            rows.saturating_sub(1) as f32,
        ) * spacing;
        let origin = center - 0.5 * extent;

        let positions: Vec<Vec2> = (0..count)
            .map(|i| {
                let x = (i % per_row) as f32;
                let y = (i / per_row) as f32;
                origin + Vec2::new(x, y) * spacing
            })
            .collect();

        Self {
            predicted: positions.clone(),
            velocities: vec![Vec2::ZERO; count],
            densities: vec![0.0; count],
            positions,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter_positions(&self) -> impl Iterator<Item = &Vec2> {
        self.positions.iter()
    }

    /// Position, velocity and density of each particle.
    pub fn iter_particles(&self) -> impl Iterator<Item = (&Vec2, &Vec2, &f32)> {
        self.positions
            .iter()
            .zip(self.velocities.iter())
            .zip(self.densities.iter())
            .map(|((p, v), d)| (p, v, d))
    }
}
