//! Host process: owns the native window and menu, supervises the renderer

mod app;
pub mod controller;
mod listener;
pub mod readiness;
pub mod shutdown;

pub use app::run_host;

use std::path::PathBuf;

/// Startup settings for the host process
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Directory holding `config.json`, shared with the renderer
    pub user_data_path: PathBuf,
    /// Show the window even if the renderer never reports ready
    pub dev_mode: bool,
}
