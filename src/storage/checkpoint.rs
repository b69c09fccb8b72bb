// src/storage/checkpoint.rs

//! Durable per-project resume offsets.
//!
//! The checkpoint file is a single JSON object:
//!
//! ```text
//! { "projects": { "KAFKA": 150, "BEAM": 0 } }
//! ```
//!
//! Every advance rewrites the whole file synchronously, so on-disk state
//! always matches the last durably processed page. A torn write can leave
//! the file unparseable; `load` treats that as an empty state and the run
//! restarts affected projects from offset 0.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CheckpointState {
    projects: HashMap<String, u64>,
}

/// Store for per-project resume offsets.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    state: CheckpointState,
}

impl CheckpointStore {
    /// Load the checkpoint file, never failing.
    ///
    /// A missing file yields an empty state; an unparseable file is logged
    /// and also yields an empty state.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = Self::read_state(&path);
        Self { path, state }
    }

    fn read_state(path: &Path) -> CheckpointState {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => {
                    log::info!("Loaded checkpoint from {}", path.display());
                    state
                }
                Err(e) => {
                    log::warn!(
                        "Corrupted checkpoint at {}: {}. Starting fresh.",
                        path.display(),
                        e
                    );
                    CheckpointState::default()
                }
            },
            Err(_) => CheckpointState::default(),
        }
    }

    /// Next unprocessed offset for a project, 0 when unseen.
    pub fn progress(&self, project: &str) -> u64 {
        self.state.projects.get(project).copied().unwrap_or(0)
    }

    /// All known projects and their offsets.
    pub fn projects(&self) -> &HashMap<String, u64> {
        &self.state.projects
    }

    /// Record a new offset and rewrite the whole file before returning.
    pub fn advance(&mut self, project: &str, offset: u64) -> Result<()> {
        self.state.projects.insert(project.to_string(), offset);
        let json = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.path, json)?;
        log::debug!("Checkpoint saved: {project} at {offset}");
        Ok(())
    }
}
