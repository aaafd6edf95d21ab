use super::clips::{AnimationBank, ClipControl};
use super::collision::check_collision;
use super::config::ControllerConfig;
use super::direction::{camera_yaw, direction_offset, facing_rotation, movement_vector};
use super::follow::follow_avatar;
use super::ground::resolve_ground_height;
use super::state::{LocomotionState, select_state};
use crate::input::InputSnapshot;
use crate::scene_runtime::camera::OrbitCamera;
use crate::scene_runtime::obstacles::{ObstacleId, ObstacleQuery};
use bevy::prelude::*;

/// Per-avatar control state: locomotion state, run toggle and tuning.
#[derive(Component, Debug, Clone)]
pub struct CharacterController {
    pub config: ControllerConfig,
    state: LocomotionState,
    run_toggle: bool,
    avatar_obstacle: Option<ObstacleId>,
}

/// Borrowed world the controller works on for one tick.
pub struct ControlContext<'a, Q: ObstacleQuery + ?Sized, C: ClipControl> {
    /// `None` until the avatar exists; the tick is then a no-op.
    pub avatar: Option<&'a mut Transform>,
    pub camera: &'a mut Transform,
    pub orbit: &'a mut OrbitCamera,
    pub obstacles: &'a Q,
    pub clips: &'a mut AnimationBank<C>,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    pub transition: Option<(LocomotionState, LocomotionState)>,
    /// Displacement actually applied to the avatar.
    pub step: Vec3,
    pub blocked: bool,
}

impl CharacterController {
    pub fn new(config: ControllerConfig, run_by_default: bool) -> Self {
        Self {
            config,
            state: LocomotionState::Idle,
            run_toggle: run_by_default,
            avatar_obstacle: None,
        }
    }

    pub fn state(&self) -> LocomotionState {
        self.state
    }

    pub fn run_mode(&self) -> bool {
        self.run_toggle
    }

    /// Flip between running and walking. Returns the new run flag.
    pub fn toggle_run_mode(&mut self) -> bool {
        self.run_toggle = !self.run_toggle;
        self.run_toggle
    }

    pub fn set_config(&mut self, config: ControllerConfig) {
        self.config = config;
    }

    /// Obstacle that represents the avatar itself, skipped by every ray query.
    pub fn set_avatar_obstacle(&mut self, id: Option<ObstacleId>) {
        self.avatar_obstacle = id;
    }

    /// Advance the controller by one frame.
    pub fn update<Q, C>(
        &mut self,
        delta_secs: f32,
        input: &InputSnapshot,
        ctx: ControlContext<'_, Q, C>,
    ) -> TickOutcome
    where
        Q: ObstacleQuery + ?Sized,
        C: ClipControl,
    {
        let mut outcome = TickOutcome::default();
        let Some(avatar) = ctx.avatar else {
            return outcome;
        };
        let tuning = self.config.tuning;

        let next = select_state(input, self.run_toggle);
        if next != self.state {
            ctx.clips.transition(self.state, next, tuning.fade_duration);
            debug!("Locomotion {} -> {}", self.state, next);
            outcome.transition = Some((self.state, next));
            self.state = next;
        }

        if !(delta_secs > 0.0) {
            return outcome;
        }

        let previous = avatar.translation;
        if self.state.is_moving() {
            let offset = direction_offset(input);
            let target = facing_rotation(camera_yaw(ctx.camera.translation, previous), offset);
            avatar.rotation = self
                .config
                .turn_mode
                .apply(avatar.rotation, target, delta_secs);

            let step = movement_vector(
                *ctx.camera.forward(),
                offset,
                self.state.velocity(&tuning),
                delta_secs,
            );
            let mut candidate = previous + step;
            candidate.z = self.config.avatar_corridor.clamp(candidate.z);
            candidate.y =
                resolve_ground_height(ctx.obstacles, candidate, &tuning, self.avatar_obstacle);

            if check_collision(ctx.obstacles, Some(candidate), &tuning, self.avatar_obstacle) {
                debug!("Move blocked at {:?}", candidate);
                avatar.translation = previous;
                outcome.blocked = true;
            } else {
                avatar.translation = candidate;
                outcome.step = candidate - previous;
                follow_avatar(
                    ctx.camera,
                    ctx.orbit,
                    outcome.step.x,
                    outcome.step.z,
                    candidate,
                    &self.config,
                );
            }
        } else {
            avatar.translation.y =
                resolve_ground_height(ctx.obstacles, previous, &tuning, self.avatar_obstacle);
        }

        avatar.translation.z = self.config.avatar_corridor.clamp(avatar.translation.z);
        // Orbit and zoom can push the camera out between ticks.
        ctx.camera.translation.z = self.config.camera_corridor.clamp(ctx.camera.translation.z);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::clips::tests::RecordingClip;
    use crate::character::config::{CharacterTuning, TurnMode};
    use crate::input::ControlKey;
    use crate::scene_runtime::obstacles::{
        Bounds, MeshSurface, Obstacle, ObstacleCategory, ObstacleNode, ObstacleSet,
        PlacedSurface, Triangle,
    };
    use bevy::math::Affine3A;

    const DT: f32 = 1.0 / 60.0;

    struct Rig {
        avatar: Transform,
        camera: Transform,
        orbit: OrbitCamera,
        obstacles: ObstacleSet,
        clips: AnimationBank<RecordingClip>,
        controller: CharacterController,
    }

    impl Rig {
        /// Avatar at the origin, camera 5 units behind it on +z.
        fn new() -> Self {
            let config = ControllerConfig::new(CharacterTuning::default(), TurnMode::Instant);
            let mut clips = AnimationBank::default();
            for state in LocomotionState::ALL {
                clips.register(*state, RecordingClip::default(), LocomotionState::Walk);
            }
            Self {
                avatar: Transform::default(),
                camera: Transform::from_xyz(0.0, 0.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
                orbit: OrbitCamera::new(Vec3::Y),
                obstacles: ObstacleSet::new(),
                clips,
                controller: CharacterController::new(config, true),
            }
        }

        fn add_box(&mut self, id: u64, min: Vec3, max: Vec3) {
            self.obstacles.insert(Obstacle {
                id: ObstacleId(id),
                category: ObstacleCategory::Prop,
                root: ObstacleNode::cuboid(Bounds::new(min, max)),
            });
        }

        fn tick(&mut self, delta_secs: f32, keys: &[ControlKey]) -> TickOutcome {
            let input = InputSnapshot::with_keys(keys);
            self.controller.update(
                delta_secs,
                &input,
                ControlContext {
                    avatar: Some(&mut self.avatar),
                    camera: &mut self.camera,
                    orbit: &mut self.orbit,
                    obstacles: &self.obstacles,
                    clips: &mut self.clips,
                },
            )
        }
    }

    #[test]
    fn idle_input_never_moves() {
        let mut rig = Rig::new();
        let outcome = rig.tick(DT, &[ControlKey::Shift]);
        assert_eq!(rig.controller.state(), LocomotionState::Idle);
        assert_eq!(outcome.step, Vec3::ZERO);
        assert_eq!(rig.avatar.translation, Vec3::ZERO);
        assert_eq!(rig.avatar.rotation, Quat::IDENTITY);
    }

    #[test]
    fn run_scenario_moves_away_from_camera() {
        let mut rig = Rig::new();
        let outcome = rig.tick(DT, &[ControlKey::W]);

        assert_eq!(rig.controller.state(), LocomotionState::Run);
        let expected = 150.0 / 60.0;
        assert!((outcome.step.length() - expected).abs() < 1e-4);
        assert!((rig.avatar.translation - Vec3::new(0.0, 0.0, -expected)).length() < 1e-4);
        // Camera trails by the same delta and the pivot sits at eye height.
        assert!((rig.camera.translation.z - (5.0 - expected)).abs() < 1e-4);
        assert!((rig.orbit.target - Vec3::new(0.0, 1.0, -expected)).length() < 1e-4);
    }

    #[test]
    fn walk_uses_walk_velocity() {
        let mut rig = Rig::new();
        rig.controller.toggle_run_mode();
        let outcome = rig.tick(0.5, &[ControlKey::W]);
        assert_eq!(rig.controller.state(), LocomotionState::Walk);
        assert!((outcome.step.length() - 35.0).abs() < 1e-3);
    }

    #[test]
    fn zero_delta_is_idempotent() {
        let mut rig = Rig::new();
        rig.avatar.translation = Vec3::new(1.0, 0.7, 2.0);
        rig.add_box(1, Vec3::new(-10.0, -1.0, -10.0), Vec3::new(10.0, 0.0, 10.0));
        for _ in 0..5 {
            rig.tick(0.0, &[ControlKey::W, ControlKey::A]);
        }
        assert_eq!(rig.avatar.translation, Vec3::new(1.0, 0.7, 2.0));
        assert_eq!(rig.avatar.rotation, Quat::IDENTITY);
    }

    #[test]
    fn idle_snaps_to_ground() {
        let mut rig = Rig::new();
        rig.add_box(1, Vec3::new(-10.0, -1.0, -10.0), Vec3::new(10.0, 1.25, 10.0));
        rig.avatar.translation = Vec3::new(0.0, 0.5, 0.0);
        rig.tick(DT, &[]);
        assert!((rig.avatar.translation.y - 1.25).abs() < 1e-4);
    }

    #[test]
    fn ground_below_minimum_snaps_to_minimum() {
        let mut rig = Rig::new();
        rig.controller.config.tuning.min_height = 0.5;
        rig.add_box(1, Vec3::new(-10.0, -3.0, -10.0), Vec3::new(10.0, -1.0, 10.0));
        rig.tick(DT, &[]);
        assert_eq!(rig.avatar.translation.y, 0.5);
    }

    #[test]
    fn tall_obstacle_ahead_rolls_back_move() {
        let mut rig = Rig::new();
        rig.add_box(1, Vec3::new(-2.0, 0.0, -4.5), Vec3::new(2.0, 8.0, -3.4));
        rig.avatar.translation = Vec3::new(0.0, 0.0, -0.5);
        rig.camera.translation = Vec3::new(0.0, 0.0, 4.5);
        let camera_before = rig.camera.translation;

        let outcome = rig.tick(DT, &[ControlKey::W]);

        assert!(outcome.blocked);
        assert_eq!(outcome.step, Vec3::ZERO);
        assert_eq!(rig.avatar.translation, Vec3::new(0.0, 0.0, -0.5));
        assert_eq!(rig.camera.translation, camera_before);
        assert_eq!(rig.orbit.target, Vec3::Y);
    }

    #[test]
    fn short_obstacle_never_blocks() {
        let mut rig = Rig::new();
        // Top at 2.5: below the blocking height of 3.0 but crossing the collision ray
        // height, so the forward ray hits it within collision distance.
        rig.add_box(1, Vec3::new(-2.0, 0.0, -4.5), Vec3::new(2.0, 2.5, -3.4));
        rig.avatar.translation = Vec3::new(0.0, 0.0, -0.5);

        let outcome = rig.tick(DT, &[ControlKey::W]);

        assert!(!outcome.blocked);
        assert!(rig.avatar.translation.z < -0.5);
    }

    #[test]
    fn idle_to_run_fades_once() {
        let mut rig = Rig::new();
        rig.clips = AnimationBank::default();
        for state in LocomotionState::ALL {
            rig.clips
                .register(*state, RecordingClip::default(), LocomotionState::Run);
        }

        let outcome = rig.tick(DT, &[ControlKey::W]);

        assert_eq!(
            outcome.transition,
            Some((LocomotionState::Idle, LocomotionState::Run))
        );
        let idle = rig.clips.get(LocomotionState::Idle).unwrap();
        let run = rig.clips.get(LocomotionState::Run).unwrap();
        assert_eq!(idle.fade_outs, vec![0.2]);
        assert!(idle.fade_ins.is_empty());
        // One catch-up start from registration plus the transition fade.
        assert_eq!(run.fade_ins, vec![0.0, 0.2]);
        assert!(run.fade_outs.is_empty());

        let outcome = rig.tick(DT, &[ControlKey::W]);
        assert_eq!(outcome.transition, None);
        assert_eq!(rig.clips.get(LocomotionState::Run).unwrap().fade_ins.len(), 2);
    }

    #[test]
    fn missing_clips_do_not_stop_state_changes() {
        let mut rig = Rig::new();
        rig.clips = AnimationBank::default();
        rig.tick(DT, &[ControlKey::D]);
        assert_eq!(rig.controller.state(), LocomotionState::Run);
    }

    #[test]
    fn absent_avatar_is_a_noop() {
        let mut rig = Rig::new();
        let input = InputSnapshot::with_keys(&[ControlKey::W]);
        let outcome = rig.controller.update(
            DT,
            &input,
            ControlContext {
                avatar: None,
                camera: &mut rig.camera,
                orbit: &mut rig.orbit,
                obstacles: &rig.obstacles,
                clips: &mut rig.clips,
            },
        );
        assert_eq!(outcome, TickOutcome::default());
        assert_eq!(rig.controller.state(), LocomotionState::Idle);
    }

    #[test]
    fn avatar_depth_stays_in_corridor() {
        let mut rig = Rig::new();
        rig.avatar.translation = Vec3::new(0.0, 0.0, -49.5);
        rig.camera.translation = Vec3::new(0.0, 0.0, -44.5);
        rig.tick(1.0, &[ControlKey::W]);
        assert_eq!(rig.avatar.translation.z, -50.0);
        assert_eq!(rig.camera.translation.z, -42.0);
    }

    #[test]
    fn camera_depth_is_clamped_while_idle() {
        let mut rig = Rig::new();
        rig.camera.translation = Vec3::new(0.0, 3.0, 70.0);
        rig.tick(DT, &[]);
        assert_eq!(rig.camera.translation, Vec3::new(0.0, 3.0, 58.0));

        rig.camera.translation.z = -60.0;
        rig.tick(DT, &[]);
        assert_eq!(rig.camera.translation.z, -42.0);
    }

    #[test]
    fn camera_depth_is_clamped_on_blocked_move() {
        let mut rig = Rig::new();
        rig.add_box(1, Vec3::new(-2.0, 0.0, -3.5), Vec3::new(2.0, 8.0, -2.9));
        rig.camera.translation = Vec3::new(0.0, 0.0, 64.0);
        let outcome = rig.tick(DT, &[ControlKey::W]);
        assert!(outcome.blocked);
        assert_eq!(rig.camera.translation.z, 58.0);
    }

    #[test]
    fn ground_follows_slope_under_avatar() {
        let mut rig = Rig::new();
        // Ramp rising 0.15 per unit of x across the whole corridor.
        let ramp = MeshSurface::from_triangles(vec![
            Triangle::new(
                Vec3::new(-10.0, 0.0, -10.0),
                Vec3::new(10.0, 3.0, -10.0),
                Vec3::new(10.0, 3.0, 10.0),
            ),
            Triangle::new(
                Vec3::new(-10.0, 0.0, -10.0),
                Vec3::new(10.0, 3.0, 10.0),
                Vec3::new(-10.0, 0.0, 10.0),
            ),
        ])
        .unwrap();
        rig.obstacles.insert(Obstacle {
            id: ObstacleId(2),
            category: ObstacleCategory::Terrain,
            root: ObstacleNode::mesh(PlacedSurface::new(ramp, Affine3A::IDENTITY)),
        });
        rig.avatar.translation = Vec3::new(-8.0, 0.0, 0.0);

        rig.tick(DT, &[]);
        assert!((rig.avatar.translation.y - 0.3).abs() < 1e-4);
    }

    #[test]
    fn trunk_inside_merged_scenery_blocks() {
        let mut rig = Rig::new();
        // One scenery mesh whose bounds contain the ray origin: a trunk
        // behind the avatar and one just ahead of the next step.
        let mut triangles = Vec::new();
        for min_z in [5.0, -3.9] {
            let trunk = MeshSurface::cuboid(Bounds::new(
                Vec3::new(-1.0, 0.0, min_z),
                Vec3::new(1.0, 10.0, min_z + 1.0),
            ));
            triangles.extend(trunk.triangles());
        }
        rig.obstacles.insert(Obstacle {
            id: ObstacleId(3),
            category: ObstacleCategory::Prop,
            root: ObstacleNode::mesh(PlacedSurface::new(
                MeshSurface::from_triangles(triangles).unwrap(),
                Affine3A::IDENTITY,
            )),
        });
        rig.avatar.translation = Vec3::new(0.0, 0.0, -0.3);

        let outcome = rig.tick(DT, &[ControlKey::W]);

        assert!(outcome.blocked);
        assert_eq!(rig.avatar.translation, Vec3::new(0.0, 0.0, -0.3));
    }

    #[test]
    fn avatar_obstacle_is_ignored() {
        let mut rig = Rig::new();
        // Avatar bounds that would otherwise act as ground.
        rig.add_box(7, Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 1.5, 0.5));
        rig.controller.set_avatar_obstacle(Some(ObstacleId(7)));
        rig.tick(DT, &[]);
        assert_eq!(rig.avatar.translation.y, 0.0);
    }

    #[test]
    fn strafe_faces_and_moves_sideways() {
        let mut rig = Rig::new();
        let outcome = rig.tick(DT, &[ControlKey::A]);
        assert!(outcome.step.x < 0.0);
        assert!(outcome.step.z.abs() < 1e-4);
        let facing = rig.avatar.rotation * Vec3::Z;
        assert!((facing - Vec3::NEG_X).length() < 1e-4);
    }
}
