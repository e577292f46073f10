use log::debug;

use super::{Fluid, Interaction, SimulationError};

/// Whether the host should keep stepping the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

pub struct Scene<const D: usize, F, P> {
    /// The fluid for this scene.
    pub fluid: F,
    /// The parameters for this scene's fluid. Only changes between steps.
    params: P,
    run_state: RunState,
    /// Pointer input applied on the next steps, if any.
    interaction: Option<Interaction<D>>,
    /// The number of steps taken since the last reset.
    n_steps: u64,
}

impl<const D: usize, F: Fluid<D, Params = P>, P> Scene<D, F, P> {
    #[inline(always)]
    pub fn new(fluid: F, params: P) -> Self {
        Self {
            fluid,
            params,
            run_state: RunState::Idle,
            interaction: None,
            n_steps: 0,
        }
    }

    #[inline(always)]
    pub fn size(&self) -> [f32; D] {
        F::domain_size(&self.params)
    }

    #[inline(always)]
    pub fn params(&self) -> &P {
        &self.params
    }

    /// Mutable access to the parameters. The borrow ends before the next step can start, so a
    /// step always sees one consistent snapshot.
    #[inline(always)]
    pub fn params_mut(&mut self) -> &mut P {
        &mut self.params
    }

    #[inline(always)]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    #[inline(always)]
    pub fn steps(&self) -> u64 {
        self.n_steps
    }

    pub fn play(&mut self) {
        self.run_state = RunState::Running;
    }

    pub fn pause(&mut self) {
        self.run_state = RunState::Idle;
    }

    /// Switches between running and idle, returning the new state.
    pub fn toggle_play(&mut self) -> RunState {
        self.run_state = match self.run_state {
            RunState::Idle => RunState::Running,
            RunState::Running => RunState::Idle,
        };

        debug!("scene is now {:?}", self.run_state);
        self.run_state
    }

    /// Re-seeds the fluid. The run state is left as is.
    pub fn reset(&mut self) {
        self.fluid.reset(&self.params);
        self.n_steps = 0;
    }

    /// Sets (or clears, with `None`) the pointer position used by the following steps.
    pub fn set_interaction(&mut self, point: Option<[f32; D]>) {
        self.interaction = point.map(Interaction::new);
    }

    #[inline(always)]
    pub fn interaction(&self) -> Option<Interaction<D>> {
        self.interaction
    }

    /// Steps the fluid by `dt` if the scene is running. Returns whether a step was taken.
    pub fn advance(&mut self, dt: f32) -> Result<bool, SimulationError> {
        if !self.is_running() {
            return Ok(false);
        }

        self.step(dt)?;
        Ok(true)
    }

    /// Steps the fluid by `dt` regardless of the run state.
    pub fn step(&mut self, dt: f32) -> Result<(), SimulationError> {
        self.fluid.step(
            dt,
            &self.params,
            self.interaction,
        )?;

        self.n_steps += 1;
        Ok(())
    }
}
