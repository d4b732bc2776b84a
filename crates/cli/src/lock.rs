//! Per-source run lock.
//!
//! Two syncs of the same source against the same database would read the
//! same snapshot and race on its mutations. A lock file next to the database
//! (`<database>.<source>.lock`) is created exclusively and removed on drop.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("source '{source_tag}' is already being synced (lock {})", path.display())]
    Held {
        source_tag: String,
        path: PathBuf,
        holder: Option<LockContent>,
    },

    #[error("cannot create lock {}: {cause}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },
}

/// Lock file content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockContent {
    pub pid: u32,
    pub started_at: String,
}

/// Held for the duration of one sync run.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn path_for(database: &Path, source: &str) -> PathBuf {
        let mut name = database.as_os_str().to_owned();
        name.push(format!(".{source}.lock"));
        PathBuf::from(name)
    }

    /// Acquire the lock for `source`. With `break_existing`, a leftover lock
    /// (e.g. from a killed run) is removed first.
    pub fn acquire(database: &Path, source: &str, break_existing: bool) -> Result<Self, LockError> {
        let path = Self::path_for(database, source);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|cause| LockError::Io {
                path: path.clone(),
                cause,
            })?;
        }

        if break_existing && path.exists() {
            warn!(path = %path.display(), "breaking existing run lock");
            fs::remove_file(&path).map_err(|cause| LockError::Io {
                path: path.clone(),
                cause,
            })?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .ok()
                    .and_then(|s| serde_json::from_str(&s).ok());
                return Err(LockError::Held {
                    source_tag: source.to_string(),
                    path,
                    holder,
                });
            }
            Err(cause) => return Err(LockError::Io { path, cause }),
        };

        let content = LockContent {
            pid: std::process::id(),
            started_at: chrono::Utc::now().to_rfc3339(),
        };
        let serialized = serde_json::to_string(&content).unwrap_or_default();
        if let Err(cause) = file.write_all(serialized.as_bytes()) {
            let _ = fs::remove_file(&path);
            return Err(LockError::Io { path, cause });
        }

        debug!(path = %path.display(), "acquired run lock");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove run lock");
        }
    }
}
