use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Ids of every project seen by a successful cycle.
pub type SeenSet = BTreeSet<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorState {
    pub seen: SeenSet,
    pub first_run: bool,
}

impl PriorState {
    pub fn first_run() -> Self {
        Self {
            seen: SeenSet::new(),
            first_run: true,
        }
    }

    pub fn existing(seen: SeenSet) -> Self {
        Self {
            seen,
            first_run: false,
        }
    }
}

/// The seen set on disk, stored as a JSON array of id strings.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing, unreadable or corrupt file is a first run.
    pub fn load(&self) -> PriorState {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no state file at {}", self.path.display());
                return PriorState::first_run();
            }
            Err(e) => {
                warn!(
                    "state file {} unreadable, starting fresh: {}",
                    self.path.display(),
                    e
                );
                return PriorState::first_run();
            }
        };

        match serde_json::from_str::<SeenSet>(&data) {
            Ok(seen) => PriorState::existing(seen),
            Err(e) => {
                warn!(
                    "state file {} is corrupt, starting fresh: {}",
                    self.path.display(),
                    e
                );
                PriorState::first_run()
            }
        }
    }

    /// `<file name>.tmp` next to the state file.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Replace the whole file with `seen`. Written to a sibling temp file
    /// and renamed into place so a crash never leaves a truncated file.
    pub fn save(&self, seen: &SeenSet) -> Result<(), StoreError> {
        let data = serde_json::to_string(seen)?;
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let tmp = self.temp_path();
        std::fs::write(&tmp, data).map_err(write_err)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(write_err(e));
        }
        Ok(())
    }
}
