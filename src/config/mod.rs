//! Configuration persistence shared by the host and renderer processes
//!
//! Both processes own a separate [`ConfigStore`] and load it independently.
//! There is no live synchronization between them; whichever saves last wins.

pub mod store;

pub use store::ConfigStore;

use std::path::PathBuf;

use crate::constants;

/// Per-user data directory holding `config.json`
pub fn default_user_data_path() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(constants::app::DIR_NAME);
    path
}
