pub mod camera;
pub mod obstacle_sync;
pub mod obstacles;
pub mod pipeline;
pub mod registration;
