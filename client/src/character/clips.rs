use super::state::LocomotionState;
use bevy::animation::graph::AnimationNodeIndex;
use bevy::prelude::Resource;
use std::collections::HashMap;
use std::time::Duration;

/// Playback handle for one locomotion clip.
pub trait ClipControl {
    /// Blend the clip out over `duration` seconds, then stop it.
    fn fade_out(&mut self, duration: f32);
    /// Rewind the clip, start it and blend it in over `duration` seconds.
    fn fade_in(&mut self, duration: f32);
}

/// Playback change waiting for the animation player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipRequest {
    /// Restart the clip and fade the others out over the duration.
    Start { fade: Duration },
    Stop,
}

/// Clip node in the avatar animation graph. Fades are queued here and played
/// through the player's `AnimationTransitions`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocomotionClip {
    pub node: AnimationNodeIndex,
    pub time_scale: f32,
    request: Option<ClipRequest>,
}

impl LocomotionClip {
    pub fn new(node: AnimationNodeIndex, time_scale: f32) -> Self {
        Self {
            node,
            time_scale,
            request: None,
        }
    }

    pub fn pending(&self) -> Option<ClipRequest> {
        self.request
    }

    pub fn take_request(&mut self) -> Option<ClipRequest> {
        self.request.take()
    }
}

impl ClipControl for LocomotionClip {
    fn fade_out(&mut self, _duration: f32) {
        // The incoming clip's transition blends this one out; a bare stop only
        // applies when nothing replaces it.
        self.request = Some(ClipRequest::Stop);
    }

    fn fade_in(&mut self, duration: f32) {
        self.request = Some(ClipRequest::Start {
            fade: Duration::from_secs_f32(duration.max(0.0)),
        });
    }
}

/// Locomotion clips keyed by state. States whose clip has not loaded yet are
/// simply absent and are skipped by transitions.
#[derive(Resource, Debug)]
pub struct AnimationBank<C = LocomotionClip> {
    clips: HashMap<LocomotionState, C>,
}

impl<C> Default for AnimationBank<C> {
    fn default() -> Self {
        Self {
            clips: HashMap::new(),
        }
    }
}

impl<C: ClipControl> AnimationBank<C> {
    /// Add a clip that finished loading. A clip for the state the controller
    /// is already in starts playing immediately.
    pub fn register(&mut self, state: LocomotionState, mut clip: C, current: LocomotionState) {
        if state == current {
            clip.fade_in(0.0);
        }
        self.clips.insert(state, clip);
    }

    pub fn get(&self, state: LocomotionState) -> Option<&C> {
        self.clips.get(&state)
    }

    pub fn get_mut(&mut self, state: LocomotionState) -> Option<&mut C> {
        self.clips.get_mut(&state)
    }

    pub fn is_ready(&self, state: LocomotionState) -> bool {
        self.clips.contains_key(&state)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LocomotionState, &mut C)> {
        self.clips.iter_mut().map(|(state, clip)| (*state, clip))
    }

    /// Cross-fade from one state's clip to another's.
    pub fn transition(&mut self, from: LocomotionState, to: LocomotionState, fade_secs: f32) {
        if let Some(clip) = self.clips.get_mut(&from) {
            clip.fade_out(fade_secs);
        }
        if let Some(clip) = self.clips.get_mut(&to) {
            clip.fade_in(fade_secs);
        }
    }
}

impl AnimationBank<LocomotionClip> {
    /// Collect queued requests: the clip to start, if any, and clips to stop.
    pub fn drain_requests(&mut self) -> PlaybackPlan {
        let mut plan = PlaybackPlan::default();
        for clip in self.clips.values_mut() {
            match clip.take_request() {
                Some(ClipRequest::Start { fade }) => {
                    plan.start = Some(ClipStart {
                        node: clip.node,
                        fade,
                        speed: clip.time_scale,
                    });
                }
                Some(ClipRequest::Stop) => plan.stop.push(clip.node),
                None => {}
            }
        }
        plan
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipStart {
    pub node: AnimationNodeIndex,
    pub fade: Duration,
    pub speed: f32,
}

/// What the animation players should do this frame. A start already blends
/// out whatever was playing, so stops only matter without one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackPlan {
    pub start: Option<ClipStart>,
    pub stop: Vec<AnimationNodeIndex>,
}

impl PlaybackPlan {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.stop.is_empty()
    }
}
