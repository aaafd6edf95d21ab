#![allow(clippy::too_many_arguments, clippy::type_complexity)]

pub mod app;
pub mod character;
pub mod composition;
pub mod input;
pub mod scene_runtime;
pub mod settings;
pub mod ui;
pub mod world;

pub use app::state::AppState;
