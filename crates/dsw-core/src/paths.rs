use crate::error::{DswError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File name constants
// ---------------------------------------------------------------------------

pub const DSW_DIR: &str = ".dsw";
pub const CONFIG_FILE: &str = "configuration.yaml";
pub const PID_FILE: &str = "dsw.pid";
pub const LOG_FILE: &str = "dsw.log";

// ---------------------------------------------------------------------------
// DswPaths
// ---------------------------------------------------------------------------

/// Per-user locations for the action store, PID file and daemon log.
///
/// Constructed once at startup and handed to every component that touches
/// the filesystem; nothing in the core looks these up on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DswPaths {
    home: PathBuf,
}

impl DswPaths {
    /// Use `dir` as the dsw home directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { home: dir.into() }
    }

    /// Resolve the dsw home directory.
    ///
    /// Priority:
    /// 1. `explicit` (the `--home` flag / `DSW_HOME` env var)
    /// 2. `~/.dsw`
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Ok(Self::new(p));
        }
        let home = home::home_dir().ok_or(DswError::HomeNotFound)?;
        Ok(Self::new(home.join(DSW_DIR)))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join(CONFIG_FILE)
    }

    pub fn pid_path(&self) -> PathBuf {
        self.home.join(PID_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.home.join(LOG_FILE)
    }

    /// Create the home directory (0700 on Unix), idempotent.
    pub fn ensure_home(&self) -> Result<()> {
        crate::io::ensure_private_dir(&self.home)
    }
}
