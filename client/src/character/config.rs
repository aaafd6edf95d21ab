use bevy::prelude::*;
use common::{AVATAR_CORRIDOR, CAMERA_CORRIDOR, DepthCorridor};
use serde::{Deserialize, Serialize};

/// Physical tuning of the avatar, stored in the `character` section of the
/// settings file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterTuning {
    pub walk_velocity: f32,
    pub run_velocity: f32,
    /// Cross-fade time between locomotion clips, in seconds.
    pub fade_duration: f32,
    pub character_height: f32,
    /// Horizontal clearance below which a tall obstacle blocks a move.
    pub collision_distance: f32,
    /// Obstacles shorter than this fraction of the character height can be
    /// walked over.
    pub blocking_height_ratio: f32,
    /// How far above the avatar the ground ray starts.
    pub ground_ray_height: f32,
    pub min_height: f32,
    /// Orbit pivot height above the avatar origin.
    pub camera_eye_offset: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            walk_velocity: 70.0,
            run_velocity: 150.0,
            fade_duration: 0.2,
            character_height: 4.0,
            collision_distance: 0.8,
            blocking_height_ratio: 0.75,
            ground_ray_height: 2.0,
            min_height: 0.0,
            camera_eye_offset: 1.0,
        }
    }
}

impl CharacterTuning {
    pub fn blocking_height(&self) -> f32 {
        self.character_height * self.blocking_height_ratio
    }
}

/// How the avatar turns toward its movement direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnMode {
    /// Face the target direction immediately.
    Instant,
    /// Slerp toward the target; `rate` is the per-second blend factor.
    Smoothed { rate: f32 },
}

impl Default for TurnMode {
    fn default() -> Self {
        Self::Smoothed { rate: 10.0 }
    }
}

impl TurnMode {
    pub fn apply(self, current: Quat, target: Quat, delta_secs: f32) -> Quat {
        match self {
            Self::Instant => target,
            Self::Smoothed { rate } => current.slerp(target, (rate * delta_secs).clamp(0.0, 1.0)),
        }
    }
}

/// Everything the character controller needs besides its inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub tuning: CharacterTuning,
    pub turn_mode: TurnMode,
    pub avatar_corridor: DepthCorridor,
    pub camera_corridor: DepthCorridor,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tuning: CharacterTuning::default(),
            turn_mode: TurnMode::default(),
            avatar_corridor: AVATAR_CORRIDOR,
            camera_corridor: CAMERA_CORRIDOR,
        }
    }
}

impl ControllerConfig {
    pub fn new(tuning: CharacterTuning, turn_mode: TurnMode) -> Self {
        Self {
            tuning,
            turn_mode,
            ..Default::default()
        }
    }
}
