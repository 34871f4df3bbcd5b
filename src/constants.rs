//! Application-wide constants
//!
//! Timing values, file names and user-facing strings shared by the host and
//! renderer processes.

/// Application identity
pub mod app {
    /// Directory name under the per-user data/runtime directories
    pub const DIR_NAME: &str = "duoshell";

    /// Window title and menu name
    pub const TITLE: &str = "Duoshell";
}

/// Config persistence constants
pub mod config {
    /// Config file name inside the user data directory
    pub const FILENAME: &str = "config.json";

    /// Alert shown by the renderer when its config copy failed to load
    pub const LOAD_FAILED_ALERT: &str =
        "Config file failed to load. It will not be written to. You should fix this.";
}

/// Host/renderer handshake timing
pub mod timing {
    /// How long the host waits for `terminate` after sending `quit`
    pub const QUIT_TIMEOUT_MS: u64 = 3000;

    /// Dev-mode grace period before the window is shown without `renderer_ready`
    pub const READY_GRACE_MS: u64 = 1000;

    /// How long the renderer child gets to exit after SIGTERM before SIGKILL
    pub const CHILD_REAP_MS: u64 = 500;
}

/// IPC socket constants
pub mod ipc {
    /// Maximum message size (10 MB) to prevent DoS via memory exhaustion
    pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
}

/// Host window defaults used before the config is consulted
pub mod window {
    pub const MIN_WIDTH: f32 = 320.0;
    pub const MIN_HEIGHT: f32 = 240.0;
}
