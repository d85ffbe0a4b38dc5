//! Subcommand implementations.

pub mod admin;
pub mod lab;
pub mod session;

use pulse_lab::storage::FileStore;
use pulse_lab::{Lab, LabConfig};

/// Open the lab over the file store in the configured state directory.
pub fn open_lab(config: &LabConfig) -> Lab<FileStore> {
    tracing::debug!(dir = %config.state_dir.display(), "Opening state directory");
    Lab::load(FileStore::new(&config.state_dir))
}
