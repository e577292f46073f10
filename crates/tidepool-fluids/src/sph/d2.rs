use std::f32::consts::TAU;

use glam::Vec2;
use log::{debug, trace, warn};
use ndarray::azip;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    body::RigidDisc,
    boundary::Tank,
    grid::SpatialHashGrid,
    kernel::SmoothingKernels,
    particles::ParticleState,
    Fluid,
    Interaction,
    SimulationError,
};

/// Stand-in neighbor index used when drawing a tie-break direction against the disc.
const DISC_INDEX: usize = u32::MAX as usize;

/// Weakly compressible SPH fluid in a 2D tank, optionally coupled with a rigid disc.
#[derive(Debug, Clone)]
pub struct SphFluid2D {
    particles: ParticleState,
    /// Neighbor lookup over predicted positions, rebuilt every step.
    grid: SpatialHashGrid,
    disc: Option<RigidDisc>,
    particle_radius: f32,
    /// Per-particle accelerations of the force pass.
    accelerations: Vec<Vec2>,
}

impl SphFluid2D {
    pub fn new(params: &SphFluid2DParams) -> Self {
        let mut fluid = Self {
            particles: ParticleState::default(),
            grid: SpatialHashGrid::new(),
            disc: None,
            particle_radius: params.particle_radius,
            accelerations: Vec::new(),
        };

        fluid.reset(params);
        fluid
    }

    /// Builds a fluid from explicit particle positions, all at rest.
    pub fn from_positions(positions: Vec<Vec2>, params: &SphFluid2DParams) -> Self {
        let n = positions.len();

        Self {
            particles: ParticleState {
                predicted: positions.clone(),
                velocities: vec![Vec2::ZERO; n],
                densities: vec![0.0; n],
                positions,
            },
            grid: SpatialHashGrid::new(),
            disc: params.apply_ball_physics.then(|| params.spawn_disc()),
            particle_radius: params.particle_radius,
            accelerations: vec![Vec2::ZERO; n],
        }
    }

    pub fn particles(&self) -> &ParticleState {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleState {
        &mut self.particles
    }

    pub fn iter_positions(&self) -> impl Iterator<Item = &Vec2> {
        self.particles.iter_positions()
    }

    pub fn iter_particles(&self) -> impl Iterator<Item = (&Vec2, &Vec2, &f32)> {
        self.particles.iter_particles()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn disc(&self) -> Option<&RigidDisc> {
        self.disc.as_ref()
    }

    /// Drags the disc to `pos`, dropping whatever velocity it had. Does nothing without a disc.
    pub fn set_disc_position(&mut self, pos: Vec2) {
        if let Some(disc) = &mut self.disc {
            disc.shape.set_position(pos);
            disc.velocity = Vec2::ZERO;
        }
    }

    /// Spawns or removes the disc to match `params`, and picks up any mass/radius change.
    fn sync_disc(&mut self, params: &SphFluid2DParams) {
        if !params.apply_ball_physics {
            self.disc = None;
        } else if let Some(disc) = &mut self.disc {
            disc.mass = params.ball_mass;
            disc.shape.radius = params.disc_radius;
        } else {
            debug!("spawning rigid disc at {}", params.disc_spawn);
            self.disc = Some(params.spawn_disc());
        }
    }

    /// Applies gravity and extrapolates positions by the prediction lookahead. Particles about to
    /// hit the disc only get their velocity corrected here.
    fn predict(&mut self, dt: f32, params: &SphFluid2DParams) {
        let gravity = Vec2::NEG_Y * params.gravity;
        let lookahead = params.prediction_lookahead;

        let ParticleState { positions, velocities, predicted, .. } = &mut self.particles;

        azip!((p in &*positions, v in &mut *velocities, q in &mut *predicted) {
            *v += gravity * dt;
            *q = *p + *v * lookahead;
        });

        if let Some(disc) = &self.disc {
            let seed = params.tie_break_seed;

            for (i, (q, v)) in predicted.iter().zip(velocities.iter_mut()).enumerate() {
                disc.collide(
                    *q,
                    v,
                    None,
                    params.particle_radius,
                    params.collision_damping,
                    || tie_break_direction(seed, i, DISC_INDEX),
                );
            }
        }
    }

    fn update_densities(&mut self, params: &SphFluid2DParams, kernels: &SmoothingKernels) {
        let ParticleState { predicted, densities, .. } = &mut self.particles;
        let predicted: &[Vec2] = predicted;
        let grid = &self.grid;
        let h2 = kernels.h * kernels.h;

        for (&p, density) in predicted.iter().zip(densities.iter_mut()) {
            let sum: f32 = neighbors(grid, predicted, p, h2)
                .map(|(_, _, d)| kernels.density(d))
                .sum();

            *density = sum * params.particle_mass;
        }
    }

    /// Pressure, viscosity and pointer accelerations, integrated into velocities.
    fn apply_forces(
        &mut self,
        dt: f32,
        params: &SphFluid2DParams,
        kernels: &SmoothingKernels,
        interaction: Option<Vec2>,
    ) {
        let ParticleState { predicted, velocities, densities, .. } = &self.particles;
        let h2 = kernels.h * kernels.h;
        let seed = params.tie_break_seed;

        self.accelerations.resize(predicted.len(), Vec2::ZERO);

        for (i, acceleration) in self.accelerations.iter_mut().enumerate() {
            let p = predicted[i];
            let v = velocities[i];
            let density = densities[i];
            let pressure = params.pressure(density);

            let mut pressure_force = Vec2::ZERO;
            let mut viscosity_force = Vec2::ZERO;

            for (j, offset, d) in neighbors(&self.grid, predicted, p, h2) {
                if j == i {
                    continue;
                }

                let dir = if d > 0.0 {
                    offset / d
                } else {
                    tie_break_direction(seed, i, j)
                };

                let shared_pressure = 0.5 * (pressure + params.pressure(densities[j]));
                let slope = kernels.density_derivative(d);
                pressure_force += dir * shared_pressure * slope * params.particle_mass / densities[j];

                viscosity_force += (velocities[j] - v) * kernels.viscosity(d);
            }

            let mut force = pressure_force + viscosity_force * params.viscosity_strength;

            if let Some(point) = interaction {
                force += params.interaction_force(point, p, v);
            }

            *acceleration = force / density;
        }

        azip!((v in &mut self.particles.velocities, a in &self.accelerations) {
            *v += *a * dt;
        });
    }

    /// Moves particles, settles them against the disc and the tank, and returns the summed
    /// reaction the disc picks up from the particles it displaced.
    fn integrate_particles(&mut self, dt: f32, params: &SphFluid2DParams, tank: &Tank) -> Vec2 {
        let r = params.particle_radius;
        let damping = params.collision_damping;
        let seed = params.tie_break_seed;
        let disc = self.disc;

        let mut reaction = Vec2::ZERO;
        let mut contacts = 0;

        let ParticleState { positions, velocities, .. } = &mut self.particles;

        for (i, (p, v)) in positions.iter_mut().zip(velocities.iter_mut()).enumerate() {
            *p += *v * dt;

            if let Some(disc) = &disc {
                let contact = disc.collide(*p, v, Some(&mut *p), r, damping, || {
                    tie_break_direction(seed, i, DISC_INDEX)
                });

                if let Some(contact) = contact {
                    reaction += contact.normal_velocity;
                    contacts += 1;
                }
            }

            tank.confine(p, v, r, damping);
        }

        if contacts > 0 {
            trace!("{contacts} particles in contact with the disc");
        }

        reaction
    }

    fn update_disc(&mut self, dt: f32, params: &SphFluid2DParams, tank: &Tank, reaction: Vec2) {
        if let Some(disc) = &mut self.disc {
            disc.integrate(dt, params.gravity, reaction);

            let mut position = disc.position();
            let radius = disc.radius();
            tank.confine(&mut position, &mut disc.velocity, radius, params.collision_damping);
            disc.shape.set_position(position);
        }
    }

    fn check_finite(&self) -> Result<(), SimulationError> {
        let ParticleState { positions, velocities, .. } = &self.particles;

        let bad = positions
            .iter()
            .zip(velocities.iter())
            .position(|(p, v)| !p.is_finite() || !v.is_finite());

        if let Some(index) = bad {
            return Err(SimulationError::NonFiniteParticle {
                index,
                position: positions[index],
                velocity: velocities[index],
            });
        }

        if let Some(disc) = &self.disc {
            if !disc.position().is_finite() || !disc.velocity.is_finite() {
                return Err(SimulationError::NonFiniteDisc {
                    position: disc.position(),
                    velocity: disc.velocity,
                });
            }
        }

        Ok(())
    }
}

/// Neighbors of `p` within the smoothing radius, as `(index, offset from p, distance)`.
///
/// Grid candidates are re-checked against the true distance since buckets may be shared by
/// distant cells.
fn neighbors<'a>(
    grid: &'a SpatialHashGrid,
    points: &'a [Vec2],
    p: Vec2,
    h2: f32,
) -> impl Iterator<Item = (usize, Vec2, f32)> + 'a {
    grid.query(p).filter_map(move |j| {
        let offset = points[j] - p;
        let d2 = offset.length_squared();

        (d2 < h2).then(|| (j, offset, d2.sqrt()))
    })
}

/// Pseudo-random unit vector for a pair of coincident particles.
///
/// Depends only on the seed and the unordered pair, and flips sign with the order, so the two
/// particles of a pair are pushed in exactly opposite directions.
fn tie_break_direction(seed: u64, i: usize, j: usize) -> Vec2 {
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let key = ((lo as u64) << 32) | (hi as u64 & 0xffff_ffff);

    let mut rng = SmallRng::seed_from_u64(seed ^ key);
    let dir = Vec2::from_angle(rng.gen::<f32>() * TAU);

    if i <= j {
        dir
    } else {
        -dir
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SphFluid2DParams {
    /// Number of equal substeps each step is split into. `1` runs the prediction, density,
    /// force and collision passes once per step.
    pub num_substeps: usize,
    /// Downward gravitational acceleration.
    pub gravity: f32,
    /// Fraction of the normal velocity kept after bouncing off a wall, the ramp or the disc.
    pub collision_damping: f32,
    /// Support radius of the smoothing kernels, also the spatial grid cell size.
    pub smoothing_radius: f32,
    pub particle_mass: f32,
    /// Rest density of the fluid.
    pub target_density: f32,
    /// Stiffness of the linear equation of state.
    pub pressure_multiplier: f32,
    pub viscosity_strength: f32,
    /// Pull strength of the pointer. Negative values push particles away.
    pub interaction_strength: f32,
    pub interaction_radius: f32,
    /// Tank width, centered on the origin.
    pub bounds_width: f32,
    /// Tank height, centered on the origin.
    pub bounds_height: f32,
    /// Leg length of the ramp cutting the bottom-left corner. `0` disables the ramp.
    pub ramp_size: f32,
    pub ball_mass: f32,
    /// Whether the rigid disc takes part in the simulation.
    pub apply_ball_physics: bool,

    /// Number of particles seeded on reset.
    pub particle_count: usize,
    /// Collision radius of a particle.
    pub particle_radius: f32,
    /// Center of the initial particle block.
    pub spawn_center: Vec2,
    /// Distance between neighboring particles of the initial block.
    pub spawn_spacing: f32,
    pub disc_radius: f32,
    /// Position the disc is placed at on reset.
    pub disc_spawn: Vec2,
    /// How far ahead (in seconds) positions are extrapolated for the neighbor search. Fixed,
    /// independent of the step size.
    pub prediction_lookahead: f32,
    /// Seed for the directions chosen between coincident particles.
    pub tie_break_seed: u64,
}

impl SphFluid2DParams {
    /// Linear equation of state. Negative below the target density.
    #[inline]
    pub fn pressure(&self, density: f32) -> f32 {
        self.pressure_multiplier * (density - self.target_density)
    }

    /// Pointer force on a particle at `p` moving with velocity `v`.
    pub fn interaction_force(&self, point: Vec2, p: Vec2, v: Vec2) -> Vec2 {
        let offset = point - p;
        let d = offset.length();

        if d >= self.interaction_radius {
            return Vec2::ZERO;
        }

        let falloff = 1.0 - d / self.interaction_radius;
        offset.normalize_or_zero() * self.interaction_strength * falloff - v
    }

    pub fn tank(&self) -> Tank {
        Tank::new(self.bounds_width, self.bounds_height, self.ramp_size)
    }

    pub fn spawn_disc(&self) -> RigidDisc {
        RigidDisc::new(self.disc_spawn, self.disc_radius, self.ball_mass)
    }

    /// Rejects snapshots that cannot produce a finite step.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |name, value| Err(SimulationError::InvalidParameter { name, value });

        let all = [
            ("gravity", self.gravity),
            ("collision_damping", self.collision_damping),
            ("smoothing_radius", self.smoothing_radius),
            ("particle_mass", self.particle_mass),
            ("target_density", self.target_density),
            ("pressure_multiplier", self.pressure_multiplier),
            ("viscosity_strength", self.viscosity_strength),
            ("interaction_strength", self.interaction_strength),
            ("interaction_radius", self.interaction_radius),
            ("bounds_width", self.bounds_width),
            ("bounds_height", self.bounds_height),
            ("ramp_size", self.ramp_size),
            ("ball_mass", self.ball_mass),
            ("particle_radius", self.particle_radius),
            ("spawn_center.x", self.spawn_center.x),
            ("spawn_center.y", self.spawn_center.y),
            ("spawn_spacing", self.spawn_spacing),
            ("disc_radius", self.disc_radius),
            ("disc_spawn.x", self.disc_spawn.x),
            ("disc_spawn.y", self.disc_spawn.y),
            ("prediction_lookahead", self.prediction_lookahead),
        ];

        for (name, value) in all {
            if !value.is_finite() {
                return invalid(name, value);
            }
        }

        let positive = [
            ("smoothing_radius", self.smoothing_radius),
            ("particle_mass", self.particle_mass),
            ("bounds_width", self.bounds_width),
            ("bounds_height", self.bounds_height),
            ("ball_mass", self.ball_mass),
            ("disc_radius", self.disc_radius),
        ];

        for (name, value) in positive {
            if value <= 0.0 {
                return invalid(name, value);
            }
        }

        let non_negative = [
            ("interaction_radius", self.interaction_radius),
            ("ramp_size", self.ramp_size),
            ("particle_radius", self.particle_radius),
            ("spawn_spacing", self.spawn_spacing),
            ("prediction_lookahead", self.prediction_lookahead),
        ];

        for (name, value) in non_negative {
            if value < 0.0 {
                return invalid(name, value);
            }
        }

        if self.num_substeps == 0 {
            return invalid("num_substeps", 0.0);
        }

        if !(0.0..=1.0).contains(&self.collision_damping) {
            return invalid("collision_damping", self.collision_damping);
        }

        let narrow_side = self.bounds_width.min(self.bounds_height);

        if 2.0 * self.particle_radius >= narrow_side {
            return invalid("particle_radius", self.particle_radius);
        }

        if self.apply_ball_physics && 2.0 * self.disc_radius >= narrow_side {
            return invalid("disc_radius", self.disc_radius);
        }

        let bucket_count = SpatialHashGrid::bucket_count(
            self.bounds_width,
            self.bounds_height,
            self.smoothing_radius,
        );

        if !SpatialHashGrid::supports_bucket_count(bucket_count) {
            return invalid("smoothing_radius", self.smoothing_radius);
        }

        Ok(())
    }
}

impl Default for SphFluid2DParams {
    fn default() -> Self {
        Self {
            num_substeps: 3,
            gravity: 9.8,
            collision_damping: 0.5,
            smoothing_radius: 0.35,
            particle_mass: 1.0,
            target_density: 55.0,
            pressure_multiplier: 200.0,
            viscosity_strength: 0.06,
            interaction_strength: 90.0,
            interaction_radius: 2.0,
            bounds_width: 17.1,
            bounds_height: 9.3,
            ramp_size: 0.0,
            ball_mass: 50.0,
            apply_ball_physics: false,
            particle_count: 1600,
            particle_radius: 0.05,
            spawn_center: Vec2::ZERO,
            spawn_spacing: 0.14,
            disc_radius: 0.8,
            disc_spawn: Vec2::new(5.0, 2.0),
            prediction_lookahead: 1.0 / 30.0,
            tie_break_seed: 0x5eed,
        }
    }
}

impl Fluid<2> for SphFluid2D {
    type Params = SphFluid2DParams;

    fn step(
        &mut self,
        dt: f32,
        params: &Self::Params,
        interaction: Option<Interaction<2>>,
    ) -> Result<(), SimulationError> {
        if let Err(err) = params.validate() {
            warn!("rejecting parameter snapshot: {err}");
            return Err(err);
        }

        let kernels = SmoothingKernels::new(params.smoothing_radius);
        let tank = params.tank();
        let bucket_count = SpatialHashGrid::bucket_count(
            params.bounds_width,
            params.bounds_height,
            params.smoothing_radius,
        );

        self.particle_radius = params.particle_radius;
        self.sync_disc(params);

        let sdt = dt / params.num_substeps as f32;

        for _step in 0..params.num_substeps {
            self.predict(sdt, params);

            self.grid.rebuild(&self.particles.predicted, params.smoothing_radius, bucket_count);

            self.update_densities(params, &kernels);

            self.apply_forces(sdt, params, &kernels, interaction.map(|i| Vec2::from(i.point)));

            let reaction = self.integrate_particles(sdt, params, &tank);

            self.update_disc(sdt, params, &tank, reaction);
        }

        trace!("stepped {} particles by {dt}s", self.particles.len());

        self.check_finite()
    }

    fn reset(&mut self, params: &Self::Params) {
        self.particles = ParticleState::packed(
            params.particle_count,
            params.spawn_center,
            params.spawn_spacing,
        );
        self.accelerations = vec![Vec2::ZERO; params.particle_count];
        self.particle_radius = params.particle_radius;
        self.disc = params.apply_ball_physics.then(|| params.spawn_disc());

        debug!(
            "seeded {} particles around {}{}",
            params.particle_count,
            params.spawn_center,
            if self.disc.is_some() { " with a rigid disc" } else { "" },
        );
    }

    fn domain_size(params: &Self::Params) -> [f32; 2] {
        [params.bounds_width, params.bounds_height]
    }

    fn particle_radius(&self) -> f32 {
        self.particle_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_break_is_antisymmetric_and_unit() {
        for (i, j) in [(0, 1), (3, 17), (1599, 2)] {
            let a = tie_break_direction(7, i, j);
            let b = tie_break_direction(7, j, i);

            assert!((a.length() - 1.0).abs() < 1e-5);
            assert_eq!(a, -b);
        }
    }

    #[test]
    fn tie_break_is_seeded() {
        assert_eq!(tie_break_direction(1, 4, 5), tie_break_direction(1, 4, 5));
        assert_ne!(tie_break_direction(1, 4, 5), tie_break_direction(2, 4, 5));
    }

    #[test]
    fn pressure_is_linear_and_signed() {
        let params = SphFluid2DParams {
            target_density: 10.0,
            pressure_multiplier: 2.0,
            ..Default::default()
        };

        assert_eq!(params.pressure(10.0), 0.0);
        assert_eq!(params.pressure(12.0), 4.0);
        assert_eq!(params.pressure(7.0), -6.0);
    }

    #[test]
    fn interaction_pulls_toward_point_and_fades_out() {
        let params = SphFluid2DParams {
            interaction_strength: 10.0,
            interaction_radius: 2.0,
            ..Default::default()
        };

        let f = params.interaction_force(Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::ZERO);
        assert!((f - Vec2::new(-5.0, 0.0)).length() < 1e-6);

        let none = params.interaction_force(Vec2::ZERO, Vec2::new(3.0, 0.0), Vec2::ONE);
        assert_eq!(none, Vec2::ZERO);

        let on_point = params.interaction_force(Vec2::ZERO, Vec2::ZERO, Vec2::ZERO);
        assert!(on_point.is_finite());
    }

    #[test]
    fn default_params_are_valid() {
        assert!(SphFluid2DParams::default().validate().is_ok());
    }

    #[test]
    fn degenerate_params_are_rejected() {
        let cases = [
            SphFluid2DParams { smoothing_radius: 0.0, ..Default::default() },
            SphFluid2DParams { num_substeps: 0, ..Default::default() },
            SphFluid2DParams { particle_mass: -1.0, ..Default::default() },
            SphFluid2DParams { gravity: f32::NAN, ..Default::default() },
            SphFluid2DParams { collision_damping: 1.5, ..Default::default() },
            SphFluid2DParams { particle_radius: 5.0, ..Default::default() },
            SphFluid2DParams { apply_ball_physics: true, disc_radius: 5.0, ..Default::default() },
            SphFluid2DParams {
                smoothing_radius: 1e-4,
                bounds_width: 1e6,
                bounds_height: 1e6,
                ..Default::default()
            },
        ];

        for params in cases {
            assert!(matches!(
                params.validate(),
                Err(SimulationError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn disc_follows_ball_physics_toggle() {
        let mut params = SphFluid2DParams { particle_count: 4, ..Default::default() };
        let mut fluid = SphFluid2D::new(&params);
        assert!(fluid.disc().is_none());

        params.apply_ball_physics = true;
        fluid.step(1.0 / 60.0, &params, None).unwrap();
        assert!(fluid.disc().is_some());

        params.apply_ball_physics = false;
        fluid.step(1.0 / 60.0, &params, None).unwrap();
        assert!(fluid.disc().is_none());
    }
}
