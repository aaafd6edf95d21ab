use bevy::prelude::*;

#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ExplorePipelineSet {
    AssetLoad,
    ObstacleSync,
    Input,
    Control,
    Animation,
    Camera,
    UiSync,
}
