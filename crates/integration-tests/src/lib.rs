//! Scenario tests for the Pulse lab.
//!
//! Every test gets its own temporary state directory, so reopening the lab
//! through [`TestContext::lab`] behaves like a fresh process start.
//!
//! ```bash
//! cargo test -p pulse-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io;
use std::path::Path;

use pulse_lab::storage::FileStore;
use pulse_lab::{Lab, LabConfig};
use tempfile::TempDir;

/// Temporary state directory plus zero-latency configuration.
pub struct TestContext {
    dir: TempDir,
    pub config: LabConfig,
}

impl TestContext {
    /// Create a context over a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = LabConfig::instant(dir.path());
        Ok(Self { dir, config })
    }

    #[must_use]
    pub fn state_dir(&self) -> &Path {
        self.dir.path()
    }

    /// A file store over the state directory.
    #[must_use]
    pub fn store(&self) -> FileStore {
        FileStore::new(self.dir.path())
    }

    /// Open the lab as a newly started process would.
    #[must_use]
    pub fn lab(&self) -> Lab<FileStore> {
        Lab::load(self.store())
    }
}
