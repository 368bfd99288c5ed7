//! Per-run artifact namespace.
//!
//! Every research run gets its own folder under the reports base directory,
//! so reports and chart images from different runs never interleave. The
//! store is a plain value passed through the call chain; there is no
//! process-global session state.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Allocates and resolves per-session artifact paths.
#[derive(Debug, Clone)]
pub struct SessionStore {
    base_dir: PathBuf,
    namespace: Option<String>,
}

impl SessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            namespace: None,
        }
    }

    /// Allocate a fresh namespace for a new run, replacing any previous one.
    ///
    /// The identifier is a second-granularity timestamp plus a random
    /// suffix, so two sessions started within the same second still get
    /// distinct folders.
    pub fn begin_session(&mut self) -> &str {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        self.namespace = Some(format!("{}_{}", timestamp, &suffix[..8]));
        self.namespace.as_deref().unwrap_or_default()
    }

    /// Restore a previously allocated namespace, e.g. when resuming a run
    /// from a checkpoint, so resumed artifacts land in the original folder.
    pub fn resume_session(&mut self, namespace: impl Into<String>) {
        self.namespace = Some(namespace.into());
    }

    /// The active namespace identifier, if a session has begun.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Directory holding the active session's artifacts.
    pub fn session_dir(&self) -> Result<PathBuf> {
        let namespace = self
            .namespace
            .as_deref()
            .ok_or_else(|| anyhow!("no active session; call begin_session first"))?;
        Ok(self.base_dir.join(namespace))
    }

    /// Resolve `file_name` inside the session folder, creating intermediate
    /// directories as needed.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        let dir = self.session_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create session directory {}", dir.display()))?;
        Ok(dir.join(file_name))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
