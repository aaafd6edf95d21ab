use super::config::CharacterTuning;
use crate::input::InputSnapshot;
use common::WorldAsset;

/// Locomotion state of the avatar. Each state owns one looping clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocomotionState {
    #[default]
    Idle,
    Walk,
    Run,
}

impl LocomotionState {
    pub const ALL: &'static [LocomotionState] = &[
        LocomotionState::Idle,
        LocomotionState::Walk,
        LocomotionState::Run,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LocomotionState::Idle => "idle",
            LocomotionState::Walk => "walk",
            LocomotionState::Run => "run",
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self, LocomotionState::Walk | LocomotionState::Run)
    }

    pub fn clip_asset(&self) -> WorldAsset {
        match self {
            LocomotionState::Idle => WorldAsset::IdleClip,
            LocomotionState::Walk => WorldAsset::WalkClip,
            LocomotionState::Run => WorldAsset::RunClip,
        }
    }

    /// Ground speed in world units per second.
    pub fn velocity(&self, tuning: &CharacterTuning) -> f32 {
        match self {
            LocomotionState::Idle => 0.0,
            LocomotionState::Walk => tuning.walk_velocity,
            LocomotionState::Run => tuning.run_velocity,
        }
    }
}

impl std::fmt::Display for LocomotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the locomotion state for this frame.
pub fn select_state(input: &InputSnapshot, run_toggle: bool) -> LocomotionState {
    match (input.any_direction(), run_toggle) {
        (true, true) => LocomotionState::Run,
        (true, false) => LocomotionState::Walk,
        (false, _) => LocomotionState::Idle,
    }
}
