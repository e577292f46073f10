use glam::Vec2;
use tidepool_fluids::{
    scene::{RunState, Scene},
    sph::d2::{SphFluid2D, SphFluid2DParams},
};

const DT: f32 = 1.0 / 60.0;

fn scene() -> Scene<2, SphFluid2D, SphFluid2DParams> {
    let params = SphFluid2DParams {
        particle_count: 100,
        ..Default::default()
    };

    Scene::new(SphFluid2D::new(&params), params)
}

#[test]
fn idle_scene_does_not_step() {
    let mut scene = scene();
    let before = scene.fluid.particles().positions.clone();

    assert_eq!(scene.run_state(), RunState::Idle);
    assert!(!scene.advance(DT).unwrap());
    assert_eq!(scene.steps(), 0);
    assert_eq!(scene.fluid.particles().positions, before);
}

#[test]
fn toggling_play_starts_and_stops_stepping() {
    let mut scene = scene();

    assert_eq!(scene.toggle_play(), RunState::Running);
    assert!(scene.advance(DT).unwrap());
    assert!(scene.advance(DT).unwrap());
    assert_eq!(scene.steps(), 2);

    assert_eq!(scene.toggle_play(), RunState::Idle);
    assert!(!scene.advance(DT).unwrap());
    assert_eq!(scene.steps(), 2);
}

#[test]
fn reset_reseeds_without_touching_run_state() {
    let mut scene = scene();
    let initial = scene.fluid.particles().positions.clone();

    scene.play();
    for _ in 0..5 {
        scene.advance(DT).unwrap();
    }
    assert_ne!(scene.fluid.particles().positions, initial);

    scene.reset();
    assert_eq!(scene.fluid.particles().positions, initial);
    assert_eq!(scene.steps(), 0);
    assert!(scene.is_running());
}

#[test]
fn parameter_changes_apply_from_the_next_step() {
    let mut scene = scene();
    scene.params_mut().apply_ball_physics = true;
    assert!(scene.fluid.disc().is_none());

    scene.step(DT).unwrap();
    assert!(scene.fluid.disc().is_some());
    assert_eq!(scene.size(), [17.1, 9.3]);
}

#[test]
fn interaction_is_held_until_cleared() {
    let mut scene = scene();
    scene.params_mut().gravity = 0.0;

    scene.set_interaction(Some([0.0, 1.5]));
    scene.step(DT).unwrap();
    scene.step(DT).unwrap();
    assert!(scene.interaction().is_some());

    let mean: Vec2 = scene.fluid.particles().velocities.iter().copied().sum::<Vec2>() / 100.0;
    assert!(mean.y > 0.0, "pointer above the block should pull it up, got {mean}");

    scene.set_interaction(None);
    assert!(scene.interaction().is_none());
}

#[test]
fn invalid_parameters_stop_the_step() {
    let mut scene = scene();
    scene.params_mut().smoothing_radius = -1.0;

    assert!(scene.step(DT).is_err());
    assert_eq!(scene.steps(), 0);
}
