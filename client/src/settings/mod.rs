use crate::character::{CharacterController, CharacterTuning, ControllerConfig, TurnMode};
use crate::scene_runtime::camera::OrbitCamera;
use crate::world::RuntimeSunLight;
use bevy::light::{
    CascadeShadowConfig, CascadeShadowConfigBuilder, DirectionalLightShadowMap,
    ShadowFilteringMethod,
};
use bevy::prelude::*;
use bevy::window::{MonitorSelection, PresentMode, PrimaryWindow, WindowMode, WindowResolution};
use bevy::winit::{UpdateMode, WinitSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const SETTINGS_FILE_PATH: &str = "./settings.yaml";

const RESOLUTION_PRESETS: [ResolutionSetting; 4] = [
    ResolutionSetting {
        width: 1280,
        height: 720,
    },
    ResolutionSetting {
        width: 1600,
        height: 900,
    },
    ResolutionSetting {
        width: 1920,
        height: 1080,
    },
    ResolutionSetting {
        width: 2560,
        height: 1440,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowModeSetting {
    #[default]
    Windowed,
    Fullscreen,
}

impl WindowModeSetting {
    pub const ALL: [Self; 2] = [Self::Windowed, Self::Fullscreen];

    pub fn to_bevy(self) -> WindowMode {
        match self {
            Self::Windowed => WindowMode::Windowed,
            Self::Fullscreen => WindowMode::BorderlessFullscreen(MonitorSelection::Current),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Windowed => "Windowed",
            Self::Fullscreen => "Fullscreen",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowQualitySetting {
    Off,
    #[default]
    Low,
    Medium,
    High,
}

impl ShadowQualitySetting {
    pub const ALL: [Self; 4] = [Self::Off, Self::Low, Self::Medium, Self::High];

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    fn profile(self) -> Option<ShadowProfile> {
        let (map_size, cascades, filtering) = match self {
            Self::Off => return None,
            Self::Low => (1024, 1, ShadowFilteringMethod::Hardware2x2),
            Self::Medium => (2048, 2, ShadowFilteringMethod::Gaussian),
            Self::High => (4096, 3, ShadowFilteringMethod::Gaussian),
        };
        Some(ShadowProfile {
            map_size,
            cascades,
            filtering,
        })
    }
}

/// Sun shadow parameters for one quality level.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ShadowProfile {
    map_size: usize,
    cascades: usize,
    filtering: ShadowFilteringMethod,
}

impl ShadowProfile {
    /// The walkable forest is about a hundred units across.
    const REACH: f32 = 150.0;

    fn cascade_config(&self) -> CascadeShadowConfig {
        CascadeShadowConfigBuilder {
            num_cascades: self.cascades,
            minimum_distance: 0.1,
            maximum_distance: Self::REACH,
            first_cascade_far_bound: Self::REACH / self.cascades as f32,
            overlap_proportion: 0.15,
        }
        .into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FpsLimitSetting {
    #[default]
    Default60,
    Monitor,
    Unlimited,
}

impl FpsLimitSetting {
    pub const ALL: [Self; 3] = [Self::Default60, Self::Monitor, Self::Unlimited];

    pub fn to_update_mode(self) -> UpdateMode {
        match self {
            Self::Default60 => UpdateMode::reactive(Duration::from_secs_f64(1.0 / 60.0)),
            Self::Monitor | Self::Unlimited => UpdateMode::Continuous,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Default60 => "60 FPS",
            Self::Monitor => "Monitor",
            Self::Unlimited => "Unlimited",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionSetting {
    pub width: u32,
    pub height: u32,
}

impl Default for ResolutionSetting {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl ResolutionSetting {
    pub fn presets() -> &'static [Self] {
        &RESOLUTION_PRESETS
    }

    pub fn label(self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    pub window_mode: WindowModeSetting,
    pub resolution: ResolutionSetting,
    pub shadow_quality: ShadowQualitySetting,
    pub vsync: bool,
    pub fps_limit: FpsLimitSetting,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            window_mode: WindowModeSetting::Windowed,
            resolution: ResolutionSetting::default(),
            shadow_quality: ShadowQualitySetting::Low,
            vsync: true,
            fps_limit: FpsLimitSetting::Default60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnModeSetting {
    Instant,
    #[default]
    Smoothed,
}

impl TurnModeSetting {
    pub const ALL: [Self; 2] = [Self::Smoothed, Self::Instant];

    pub fn label(self) -> &'static str {
        match self {
            Self::Instant => "Instant",
            Self::Smoothed => "Smooth",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Whether the avatar starts in run mode. Shift toggles at runtime.
    pub run_by_default: bool,
    pub turn_mode: TurnModeSetting,
    /// Per-second blend factor for smoothed turning.
    pub turn_rate: f32,
    pub orbit_sensitivity: f32,
    pub zoom_sensitivity: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            run_by_default: true,
            turn_mode: TurnModeSetting::Smoothed,
            turn_rate: 10.0,
            orbit_sensitivity: 0.005,
            zoom_sensitivity: 1.0,
        }
    }
}

impl ControlsSettings {
    pub fn turn_mode(&self) -> TurnMode {
        match self.turn_mode {
            TurnModeSetting::Instant => TurnMode::Instant,
            TurnModeSetting::Smoothed => TurnMode::Smoothed {
                rate: self.turn_rate.max(0.0),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct GameSettings {
    pub graphics: GraphicsSettings,
    pub controls: ControlsSettings,
    pub character: CharacterTuning,
}

impl GameSettings {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::new(self.character, self.controls.turn_mode())
    }
}

#[derive(Debug, Error)]
pub enum SettingsIoError {
    #[error("failed to read settings file: {0}")]
    Read(std::io::Error),
    #[error("failed to write settings file: {0}")]
    Write(std::io::Error),
    #[error("failed to decode YAML settings: {0}")]
    Deserialize(serde_yaml::Error),
    #[error("failed to encode YAML settings: {0}")]
    Serialize(serde_yaml::Error),
}

#[derive(Resource, Clone)]
pub struct SettingsResource {
    pub current: GameSettings,
    path: PathBuf,
}

impl SettingsResource {
    pub fn new(current: GameSettings) -> Self {
        Self {
            current,
            path: PathBuf::from(SETTINGS_FILE_PATH),
        }
    }

    pub fn save_to_disk(&self) -> Result<(), SettingsIoError> {
        write_settings(&self.current, &self.path)
    }
}

pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                apply_window_settings,
                apply_sun_shadows,
                apply_controller_settings,
            ),
        );
    }
}

/// Reads `./settings.yaml`; a missing or unreadable file yields defaults.
pub fn load_settings_or_default() -> GameSettings {
    let path = Path::new(SETTINGS_FILE_PATH);
    if !path.exists() {
        return GameSettings::default();
    }

    read_settings(path).unwrap_or_else(|error| {
        eprintln!("Ignoring settings in '{SETTINGS_FILE_PATH}' ({error}), using defaults");
        GameSettings::default()
    })
}

pub fn ensure_settings_file_exists(settings: &GameSettings) -> Result<(), SettingsIoError> {
    let path = Path::new(SETTINGS_FILE_PATH);
    match path.exists() {
        true => Ok(()),
        false => write_settings(settings, path),
    }
}

pub fn present_mode_for(graphics: &GraphicsSettings) -> PresentMode {
    let vsync = graphics.vsync && graphics.fps_limit != FpsLimitSetting::Unlimited;
    if vsync {
        PresentMode::AutoVsync
    } else {
        PresentMode::AutoNoVsync
    }
}

pub fn parse_settings(raw: &str) -> Result<GameSettings, SettingsIoError> {
    serde_yaml::from_str(raw).map_err(SettingsIoError::Deserialize)
}

fn read_settings(path: &Path) -> Result<GameSettings, SettingsIoError> {
    fs::read_to_string(path)
        .map_err(SettingsIoError::Read)
        .and_then(|raw| parse_settings(&raw))
}

fn write_settings(settings: &GameSettings, path: &Path) -> Result<(), SettingsIoError> {
    let yaml = serde_yaml::to_string(settings).map_err(SettingsIoError::Serialize)?;
    fs::write(path, yaml).map_err(SettingsIoError::Write)
}

fn apply_window_settings(
    settings: Res<SettingsResource>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    winit: Option<ResMut<WinitSettings>>,
    mut applied: Local<Option<GraphicsSettings>>,
) {
    let graphics = &settings.current.graphics;
    if applied.as_ref() == Some(graphics) {
        return;
    }

    if let Ok(mut window) = windows.single_mut() {
        window.mode = graphics.window_mode.to_bevy();
        // Borderless fullscreen keeps the monitor size.
        if graphics.window_mode == WindowModeSetting::Windowed {
            window.resolution =
                WindowResolution::new(graphics.resolution.width, graphics.resolution.height);
        }
        window.present_mode = present_mode_for(graphics);
    }

    if let Some(mut winit) = winit {
        let mode = graphics.fps_limit.to_update_mode();
        winit.focused_mode = mode;
        winit.unfocused_mode = mode;
    }

    *applied = Some(graphics.clone());
}

/// Re-applies shadow quality on change and whenever a sun or camera spawns.
fn apply_sun_shadows(
    settings: Res<SettingsResource>,
    new_suns: Query<(), Added<RuntimeSunLight>>,
    new_cameras: Query<(), Added<Camera3d>>,
    mut suns: Query<(&mut DirectionalLight, &mut CascadeShadowConfig), With<RuntimeSunLight>>,
    cameras: Query<Entity, With<Camera3d>>,
    shadow_map: Option<ResMut<DirectionalLightShadowMap>>,
    mut commands: Commands,
    mut applied: Local<Option<ShadowQualitySetting>>,
) {
    let quality = settings.current.graphics.shadow_quality;
    if *applied == Some(quality) && new_suns.is_empty() && new_cameras.is_empty() {
        return;
    }
    *applied = Some(quality);

    let profile = quality.profile();
    for (mut sun, mut cascades) in &mut suns {
        sun.shadows_enabled = profile.is_some();
        if let Some(profile) = profile {
            *cascades = profile.cascade_config();
        }
    }

    let Some(profile) = profile else {
        return;
    };
    if let Some(mut shadow_map) = shadow_map {
        shadow_map.size = profile.map_size;
    }
    for camera in &cameras {
        commands.entity(camera).insert(profile.filtering);
    }
    debug!("Shadow quality set to {}", quality.label());
}

/// Push control settings into the controller and the orbit camera. Newly
/// spawned controllers pick up the current values too.
pub fn apply_controller_settings(
    settings: Res<SettingsResource>,
    added_controllers: Query<(), Added<CharacterController>>,
    mut controllers: Query<&mut CharacterController>,
    mut orbit_cameras: Query<&mut OrbitCamera>,
    mut last_applied: Local<Option<(ControlsSettings, CharacterTuning)>>,
) {
    let current = (settings.current.controls.clone(), settings.current.character);
    if last_applied.as_ref() == Some(&current) && added_controllers.is_empty() {
        return;
    }

    let config = settings.current.controller_config();
    for mut controller in &mut controllers {
        controller.set_config(config);
    }
    for mut orbit in &mut orbit_cameras {
        orbit.orbit_sensitivity = current.0.orbit_sensitivity;
        orbit.zoom_sensitivity = current.0.zoom_sensitivity;
    }

    debug!("Controller settings applied: {:?}", config.turn_mode);
    *last_applied = Some(current);
}
