pub mod animation;
pub mod clips;
pub mod collision;
pub mod config;
pub mod controller;
pub mod direction;
pub mod factory;
pub mod follow;
pub mod ground;
pub mod movement;
pub mod state;
pub mod types;

pub use animation::{
    AvatarAnimationBank, LocomotionClipAssets, bind_avatar_animation_player,
    drive_avatar_animation_transitions, initialize_locomotion_clips, register_loaded_clips,
};
pub use clips::{AnimationBank, ClipControl, ClipRequest, LocomotionClip, PlaybackPlan};
pub use collision::check_collision;
pub use config::{CharacterTuning, ControllerConfig, TurnMode};
pub use controller::{CharacterController, ControlContext, TickOutcome};
pub use factory::AvatarFactory;
pub use ground::resolve_ground_height;
pub use movement::advance_character_control;
pub use state::{LocomotionState, select_state};
pub use types::{AvatarAnimationBound, PlayerAvatar};
