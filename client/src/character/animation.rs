use super::clips::{AnimationBank, LocomotionClip};
use super::controller::CharacterController;
use super::state::LocomotionState;
use super::types::{AvatarAnimationBound, PlayerAvatar};
use bevy::asset::LoadState;
use bevy::prelude::*;
use common::WorldAsset;
use std::time::Duration;

/// Animation bank driving the avatar's animation graph.
pub type AvatarAnimationBank = AnimationBank<LocomotionClip>;

struct LocomotionClipEntry {
    state: LocomotionState,
    asset: WorldAsset,
    clip: Handle<AnimationClip>,
    node: AnimationNodeIndex,
    settled: bool,
}

/// Animation graph holding one clip node per locomotion state.
#[derive(Resource)]
pub struct LocomotionClipAssets {
    pub graph: Handle<AnimationGraph>,
    entries: Vec<LocomotionClipEntry>,
}

impl LocomotionClipAssets {
    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.settled).count()
    }
}

/// Request every locomotion clip and build the shared graph around them.
pub fn initialize_locomotion_clips(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
) {
    let mut graph = AnimationGraph::new();
    let mut entries = Vec::with_capacity(LocomotionState::ALL.len());

    for &state in LocomotionState::ALL {
        let asset = state.clip_asset();
        let clip: Handle<AnimationClip> =
            asset_server.load(GltfAssetLabel::Animation(0).from_asset(asset.asset_path()));
        let node = graph.add_clip(clip.clone(), 1.0, graph.root);
        entries.push(LocomotionClipEntry {
            state,
            asset,
            clip,
            node,
            settled: false,
        });
    }

    commands.insert_resource(LocomotionClipAssets {
        graph: graphs.add(graph),
        entries,
    });
}

/// Move clips that finished loading into the animation bank.
pub fn register_loaded_clips(
    asset_server: Res<AssetServer>,
    clip_assets: Option<ResMut<LocomotionClipAssets>>,
    mut bank: ResMut<AvatarAnimationBank>,
    controllers: Query<&CharacterController, With<PlayerAvatar>>,
) {
    let Some(mut clip_assets) = clip_assets else {
        return;
    };
    if clip_assets.pending() == 0 {
        return;
    }

    let current = controllers
        .iter()
        .next()
        .map(CharacterController::state)
        .unwrap_or_default();

    for entry in clip_assets.entries.iter_mut().filter(|entry| !entry.settled) {
        match asset_server.load_state(entry.clip.id()) {
            LoadState::Loaded => {
                let time_scale = entry.asset.clip_time_scale().unwrap_or(1.0);
                bank.register(
                    entry.state,
                    LocomotionClip::new(entry.node, time_scale),
                    current,
                );
                entry.settled = true;
                info!(
                    "Animation '{}' ready for {} ({} of {})",
                    entry.asset,
                    entry.state,
                    bank.len(),
                    LocomotionState::ALL.len()
                );
            }
            LoadState::Failed(_) => {
                // The loading tracker reports the failure; the state keeps
                // whatever clip was playing before.
                entry.settled = true;
                debug!("Animation for {} unavailable", entry.state);
            }
            _ => {}
        }
    }
}

/// Attach the locomotion graph to the avatar's animation player once the
/// avatar scene has spawned it, starting the current state's clip.
pub fn bind_avatar_animation_player(
    mut commands: Commands,
    clip_assets: Option<Res<LocomotionClipAssets>>,
    mut bank: ResMut<AvatarAnimationBank>,
    controllers: Query<&CharacterController, With<PlayerAvatar>>,
    parents: Query<&ChildOf>,
    avatars: Query<(), With<PlayerAvatar>>,
    mut players: Query<(Entity, &mut AnimationPlayer), Without<AvatarAnimationBound>>,
) {
    let Some(clip_assets) = clip_assets else {
        return;
    };
    let current = controllers
        .iter()
        .next()
        .map(CharacterController::state)
        .unwrap_or_default();

    for (player_entity, mut player) in &mut players {
        // Scene hierarchy is attached asynchronously; retry on next frames.
        if !has_avatar_ancestor(player_entity, &parents, &avatars) {
            continue;
        }

        let mut transitions = AnimationTransitions::new();
        if let Some(clip) = bank.get_mut(current) {
            clip.take_request();
            transitions
                .play(&mut player, clip.node, Duration::ZERO)
                .set_speed(clip.time_scale.max(0.001))
                .repeat();
        }

        commands.entity(player_entity).insert((
            AnimationGraphHandle(clip_assets.graph.clone()),
            transitions,
            AvatarAnimationBound,
        ));
        info!("Avatar animation graph bound to {player_entity}");
    }
}

fn has_avatar_ancestor(
    start: Entity,
    parents: &Query<&ChildOf>,
    avatars: &Query<(), With<PlayerAvatar>>,
) -> bool {
    let mut current = start;
    loop {
        if avatars.contains(current) {
            return true;
        }
        let Ok(child_of) = parents.get(current) else {
            return false;
        };
        current = child_of.parent();
    }
}

/// Play the bank's queued clip changes on the bound animation players.
pub fn drive_avatar_animation_transitions(
    mut bank: ResMut<AvatarAnimationBank>,
    mut players: Query<(&mut AnimationPlayer, &mut AnimationTransitions), With<AvatarAnimationBound>>,
) {
    // Requests stay queued until a player is bound.
    if bank.is_empty() || players.is_empty() {
        return;
    }

    let plan = bank.drain_requests();
    if plan.is_empty() {
        return;
    }

    for (mut player, mut transitions) in &mut players {
        match plan.start {
            Some(start) => {
                transitions
                    .play(&mut player, start.node, start.fade)
                    .set_speed(start.speed.max(0.001))
                    .repeat();
            }
            None => {
                for node in &plan.stop {
                    player.stop(*node);
                }
            }
        }
    }
}
