use crate::character::CharacterController;
use bevy::prelude::*;

/// Keys the character controller reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    W,
    A,
    S,
    D,
    Shift,
}

impl ControlKey {
    pub const ALL: [ControlKey; 5] = [
        ControlKey::W,
        ControlKey::A,
        ControlKey::S,
        ControlKey::D,
        ControlKey::Shift,
    ];

    pub const DIRECTIONS: [ControlKey; 4] =
        [ControlKey::W, ControlKey::A, ControlKey::S, ControlKey::D];

    pub fn key_codes(self) -> &'static [KeyCode] {
        match self {
            ControlKey::W => &[KeyCode::KeyW],
            ControlKey::A => &[KeyCode::KeyA],
            ControlKey::S => &[KeyCode::KeyS],
            ControlKey::D => &[KeyCode::KeyD],
            ControlKey::Shift => &[KeyCode::ShiftLeft, KeyCode::ShiftRight],
        }
    }

    fn index(self) -> usize {
        match self {
            ControlKey::W => 0,
            ControlKey::A => 1,
            ControlKey::S => 2,
            ControlKey::D => 3,
            ControlKey::Shift => 4,
        }
    }
}

/// Pressed state of the control keys, written by the input layer once per
/// frame and read by the character controller.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pressed: [bool; 5],
}

impl InputSnapshot {
    pub fn with_keys(keys: &[ControlKey]) -> Self {
        let mut snapshot = Self::default();
        for key in keys {
            snapshot.set(*key, true);
        }
        snapshot
    }

    pub fn set(&mut self, key: ControlKey, pressed: bool) {
        self.pressed[key.index()] = pressed;
    }

    pub fn is_pressed(&self, key: ControlKey) -> bool {
        self.pressed[key.index()]
    }

    pub fn any_direction(&self) -> bool {
        ControlKey::DIRECTIONS
            .iter()
            .any(|key| self.is_pressed(*key))
    }

    pub fn clear(&mut self) {
        self.pressed = [false; 5];
    }
}

/// Blocks gameplay input while an overlay owns the screen.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputGate {
    pub loading: bool,
    pub modal_open: bool,
}

impl Default for InputGate {
    fn default() -> Self {
        Self {
            loading: true,
            modal_open: false,
        }
    }
}

impl InputGate {
    pub fn is_open(&self) -> bool {
        !self.loading && !self.modal_open
    }
}

/// Lift the loading gate once the world is ready.
pub fn open_gate_after_loading(mut gate: ResMut<InputGate>) {
    gate.loading = false;
    info!("World ready, input enabled");
}

/// Copy the keyboard state into the input snapshot.
pub fn capture_movement_input(
    keys: Res<ButtonInput<KeyCode>>,
    gate: Res<InputGate>,
    mut snapshot: ResMut<InputSnapshot>,
) {
    if !gate.is_open() {
        // Keys held while the overlay was up must not leak into the world.
        if *snapshot != InputSnapshot::default() {
            snapshot.clear();
        }
        return;
    }

    let mut next = InputSnapshot::default();
    for key in ControlKey::ALL {
        next.set(key, keys.any_pressed(key.key_codes().iter().copied()));
    }
    if *snapshot != next {
        *snapshot = next;
    }
}

/// Shift flips between running and walking.
pub fn toggle_run_mode_on_shift(
    keys: Res<ButtonInput<KeyCode>>,
    gate: Res<InputGate>,
    mut controllers: Query<&mut CharacterController>,
) {
    if !gate.is_open() || !keys.any_just_pressed(ControlKey::Shift.key_codes().iter().copied()) {
        return;
    }

    for mut controller in &mut controllers {
        let running = controller.toggle_run_mode();
        info!("Run mode {}", if running { "on" } else { "off" });
    }
}
