//! Forest World Layout Definitions
//!
//! This crate defines the static layout of the forest world: which assets make
//! up the world, where the avatar and camera start, and the depth corridors
//! that bound movement along the z axis.
//!
//! Values are plain `f32` arrays so the crate stays free of any math or engine
//! dependency; the client converts them into its own vector types.

/// Every asset the forest world needs before it can be explored.
///
/// Paths are relative to the client's asset root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldAsset {
    // ==================== Scenery ====================
    /// The forest scene with terrain, trees and rocks.
    Forest,

    // ==================== Avatar ====================
    /// The player avatar model (skinned, carries the animation player).
    Avatar,

    // ==================== Locomotion clips ====================
    /// Idle loop.
    IdleClip,

    /// Walking loop.
    WalkClip,

    /// Running loop.
    RunClip,
}

impl WorldAsset {
    pub const ALL: &'static [WorldAsset] = &[
        WorldAsset::Forest,
        WorldAsset::Avatar,
        WorldAsset::IdleClip,
        WorldAsset::WalkClip,
        WorldAsset::RunClip,
    ];

    /// Asset path as understood by the client's asset server.
    pub fn asset_path(&self) -> &'static str {
        match self {
            WorldAsset::Forest => "world/mystical_forest.glb",
            WorldAsset::Avatar => "avatar/my_avatar.glb",
            WorldAsset::IdleClip => "avatar/animations/idle.glb",
            WorldAsset::WalkClip => "avatar/animations/walking.glb",
            WorldAsset::RunClip => "avatar/animations/running.glb",
        }
    }

    /// Returns the asset name
    pub fn name(&self) -> &'static str {
        match self {
            WorldAsset::Forest => "Mystical Forest",
            WorldAsset::Avatar => "Avatar",
            WorldAsset::IdleClip => "Idle",
            WorldAsset::WalkClip => "Walking",
            WorldAsset::RunClip => "Running",
        }
    }

    /// Whether this asset is a locomotion animation clip.
    pub fn is_clip(&self) -> bool {
        matches!(
            self,
            WorldAsset::IdleClip | WorldAsset::WalkClip | WorldAsset::RunClip
        )
    }

    /// Playback speed multiplier for clips. The running clip is authored slow
    /// and plays at six times its recorded rate.
    pub fn clip_time_scale(&self) -> Option<f32> {
        match self {
            WorldAsset::IdleClip | WorldAsset::WalkClip => Some(1.0),
            WorldAsset::RunClip => Some(6.0),
            WorldAsset::Forest | WorldAsset::Avatar => None,
        }
    }
}

impl std::fmt::Display for WorldAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Closed range of allowed values along the world z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthCorridor {
    pub min_z: f32,
    pub max_z: f32,
}

impl DepthCorridor {
    pub const fn new(min_z: f32, max_z: f32) -> Self {
        Self { min_z, max_z }
    }

    pub fn clamp(&self, z: f32) -> f32 {
        z.clamp(self.min_z, self.max_z)
    }

    pub fn contains(&self, z: f32) -> bool {
        (self.min_z..=self.max_z).contains(&z)
    }
}

/// Corridor the avatar may walk in.
pub const AVATAR_CORRIDOR: DepthCorridor = DepthCorridor::new(-50.0, 50.0);

/// Corridor the follow camera may travel in. Offset from the avatar corridor
/// because the camera trails behind the avatar.
pub const CAMERA_CORRIDOR: DepthCorridor = DepthCorridor::new(-42.0, 58.0);

/// Where the avatar is placed when the world spawns.
pub const AVATAR_SPAWN: [f32; 3] = [-3.0, 0.0, 45.0];

/// Uniform scale applied to the avatar model.
pub const AVATAR_SCALE: f32 = 2.0;

/// Where the camera starts, slightly above and behind the avatar.
pub const CAMERA_SPAWN: [f32; 3] = [-3.0, 3.0, 50.0];

/// Uniform scale applied to the forest scene (authored in centimetres).
pub const FOREST_SCALE: f32 = 0.01;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_assets_listed_once() {
        let mut seen = std::collections::HashSet::new();
        for asset in WorldAsset::ALL {
            assert!(seen.insert(*asset), "{asset} listed twice");
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_clip_time_scale_only_for_clips() {
        for asset in WorldAsset::ALL {
            assert_eq!(asset.is_clip(), asset.clip_time_scale().is_some());
        }
        assert_eq!(WorldAsset::RunClip.clip_time_scale(), Some(6.0));
    }

    #[test]
    fn test_asset_paths_are_glb() {
        for asset in WorldAsset::ALL {
            assert!(asset.asset_path().ends_with(".glb"));
        }
    }

    #[test]
    fn test_corridor_clamp() {
        assert_eq!(AVATAR_CORRIDOR.clamp(-80.0), -50.0);
        assert_eq!(AVATAR_CORRIDOR.clamp(51.0), 50.0);
        assert_eq!(AVATAR_CORRIDOR.clamp(12.5), 12.5);
        assert_eq!(CAMERA_CORRIDOR.clamp(-45.0), -42.0);
        assert_eq!(CAMERA_CORRIDOR.clamp(60.0), 58.0);
    }

    #[test]
    fn test_spawn_points_inside_corridors() {
        assert!(AVATAR_CORRIDOR.contains(AVATAR_SPAWN[2]));
        assert!(CAMERA_CORRIDOR.contains(CAMERA_SPAWN[2]));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", WorldAsset::Forest), "Mystical Forest");
        assert_eq!(format!("{}", WorldAsset::RunClip), "Running");
    }
}
