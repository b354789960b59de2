//! Working-directory baseline captured once at startup.
//!
//! Tests may delete or leave the process in a directory that no longer
//! exists. Recording re-enters the baseline before any path-dependent work.

use std::env;
use std::path::{Path, PathBuf};

use corejet_error::Result;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirBaseline {
    path: PathBuf,
}

impl WorkingDirBaseline {
    /// Capture the process's current directory.
    pub fn capture() -> Result<Self> {
        Ok(Self {
            path: env::current_dir()?,
        })
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return to the baseline if the current directory has become invalid.
    ///
    /// Returns `true` when a reset happened.
    pub fn ensure_current(&self) -> Result<bool> {
        match env::current_dir() {
            Ok(current) if current.is_dir() => Ok(false),
            Ok(current) => {
                warn!(
                    current = %current.display(),
                    baseline = %self.path.display(),
                    "working directory vanished; restoring baseline"
                );
                env::set_current_dir(&self.path)?;
                Ok(true)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    baseline = %self.path.display(),
                    "working directory unavailable; restoring baseline"
                );
                env::set_current_dir(&self.path)?;
                Ok(true)
            }
        }
    }
}
