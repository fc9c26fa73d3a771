//! Snapshot Persistence
//!
//! Whole-ledger JSON snapshots. `save` writes to a temp file in the target
//! directory and renames it into place, so a crash mid-write never leaves a
//! torn snapshot behind.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::LedgerError;
use crate::ledger::hierarchy::Ledger;

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` if no file exists yet. A present but
    /// unparseable file is an error, not an empty ledger.
    pub fn load(&self) -> Result<Option<Ledger>, LedgerError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let ledger = serde_json::from_str(&raw)?;
        Ok(Some(ledger))
    }

    pub fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(ledger)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "saved ledger snapshot");
        Ok(())
    }
}
