use crate::AppState;
use crate::character::{AvatarFactory, CharacterController, ControllerConfig};
use crate::scene_runtime::camera::OrbitCamera;
use crate::scene_runtime::obstacle_sync::SceneObstacle;
use crate::settings::SettingsResource;
use bevy::asset::RecursiveDependencyLoadState;
use bevy::camera::{PerspectiveProjection, Projection};
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::gltf::Gltf;
use bevy::light::GlobalAmbientLight;
use bevy::prelude::*;
use bevy::state::prelude::{NextState, in_state};
use common::{AVATAR_SCALE, AVATAR_SPAWN, CAMERA_SPAWN, FOREST_SCALE, WorldAsset};

/// Directional light whose shadows follow the graphics settings.
#[derive(Component)]
pub struct RuntimeSunLight;

#[derive(Component)]
pub struct WorldCamera;

#[derive(Component)]
pub struct ForestRoot;

/// How many world assets have settled (loaded or failed).
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingProgress {
    pub total: usize,
    pub settled: usize,
    pub failed: usize,
}

impl LoadingProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        (self.settled.min(self.total) * 100 / self.total) as u32
    }

    pub fn is_complete(&self) -> bool {
        self.settled >= self.total
    }
}

struct TrackedAsset {
    asset: WorldAsset,
    handle: Handle<Gltf>,
    settled: bool,
}

#[derive(Resource, Default)]
struct WorldLoadTracker {
    assets: Vec<TrackedAsset>,
}

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GlobalAmbientLight {
            color: Color::srgb_u8(0x40, 0x40, 0x40),
            brightness: 600.0,
            affects_lightmapped_meshes: true,
        })
        .insert_resource(LoadingProgress::new(WorldAsset::ALL.len()))
        .init_resource::<WorldLoadTracker>()
        .add_systems(Startup, (spawn_world, track_world_assets))
        .add_systems(
            Update,
            advance_loading_progress.run_if(in_state(AppState::Loading)),
        );
    }
}

fn spawn_world(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Option<Res<SettingsResource>>,
) {
    let avatar_position = Vec3::from_array(AVATAR_SPAWN);
    let (config, run_by_default) = settings
        .as_deref()
        .map(|settings| {
            (
                settings.current.controller_config(),
                settings.current.controls.run_by_default,
            )
        })
        .unwrap_or_else(|| (ControllerConfig::default(), true));
    let pivot = avatar_position + Vec3::Y * config.tuning.camera_eye_offset;

    commands.spawn((
        WorldCamera,
        Camera3d::default(),
        Tonemapping::None,
        Projection::Perspective(PerspectiveProjection {
            fov: 75.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        Transform::from_translation(Vec3::from_array(CAMERA_SPAWN)).looking_at(pivot, Vec3::Y),
        OrbitCamera::new(pivot),
    ));

    commands.spawn((
        RuntimeSunLight,
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(100.0, 100.0, 100.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let forest: Handle<Scene> =
        asset_server.load(GltfAssetLabel::Scene(0).from_asset(WorldAsset::Forest.asset_path()));
    commands.spawn((
        ForestRoot,
        SceneRoot(forest),
        Transform::from_scale(Vec3::splat(FOREST_SCALE)),
        SceneObstacle::terrain(),
    ));
    info!("Spawning world: {}", WorldAsset::Forest);

    AvatarFactory::spawn(
        &mut commands,
        &asset_server,
        avatar_position,
        AVATAR_SCALE,
        CharacterController::new(config, run_by_default),
    );
}

fn track_world_assets(asset_server: Res<AssetServer>, mut tracker: ResMut<WorldLoadTracker>) {
    tracker.assets = WorldAsset::ALL
        .iter()
        .map(|asset| TrackedAsset {
            asset: *asset,
            handle: asset_server.load(asset.asset_path()),
            settled: false,
        })
        .collect();
}

fn advance_loading_progress(
    asset_server: Res<AssetServer>,
    mut tracker: ResMut<WorldLoadTracker>,
    mut progress: ResMut<LoadingProgress>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    for tracked in tracker.assets.iter_mut().filter(|tracked| !tracked.settled) {
        match asset_server.recursive_dependency_load_state(tracked.handle.id()) {
            RecursiveDependencyLoadState::Loaded => {
                tracked.settled = true;
                progress.settled += 1;
                debug!("Loaded {} ({}%)", tracked.asset, progress.percent());
            }
            RecursiveDependencyLoadState::Failed(error) => {
                tracked.settled = true;
                progress.settled += 1;
                progress.failed += 1;
                warn!(
                    "Failed to load {} from '{}': {}",
                    tracked.asset,
                    tracked.asset.asset_path(),
                    error
                );
            }
            _ => {}
        }
    }

    if progress.is_complete() {
        if progress.failed > 0 {
            warn!("World ready with {} missing asset(s)", progress.failed);
        }
        next_state.set(AppState::Exploring);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_counts_settled_assets() {
        let mut progress = LoadingProgress::new(5);
        assert_eq!(progress.percent(), 0);
        progress.settled = 2;
        assert_eq!(progress.percent(), 40);
        assert!(!progress.is_complete());
        progress.settled = 5;
        assert_eq!(progress.percent(), 100);
        assert!(progress.is_complete());
    }

    #[test]
    fn empty_progress_is_complete() {
        let progress = LoadingProgress::new(0);
        assert_eq!(progress.percent(), 100);
        assert!(progress.is_complete());
    }
}
