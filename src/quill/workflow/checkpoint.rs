// SPDX-License-Identifier: MIT

//! Checkpoint storage for paused runs
//!
//! A checkpoint is the full [`BlogState`] plus the node the run is paused
//! at, keyed by session id. Sessions never share a checkpoint.

use super::graph::NodeId;
use super::state::BlogState;
use crate::adk::error::{Result, WorkflowError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Snapshot of a paused run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,
    pub state: BlogState,
    /// Node the run is suspended at
    pub node: NodeId,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(session_id: impl Into<String>, state: BlogState, node: NodeId) -> Self {
        Self {
            session_id: session_id.into(),
            state,
            node,
            updated_at: Utc::now(),
        }
    }
}

/// Persistence for checkpoints
#[async_trait]
pub trait Checkpointer: Send + Sync {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>>;

    /// Remove and return a checkpoint in one step
    ///
    /// At most one of several concurrent callers gets `Some`.
    async fn take(&self, session_id: &str) -> Result<Option<Checkpoint>>;

    /// Remove a checkpoint; returns whether one existed
    async fn delete(&self, session_id: &str) -> Result<bool>;

    /// All stored session ids
    async fn list(&self) -> Result<Vec<String>>;
}

/// Session ids double as file names, so keep them to a safe alphabet
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(WorkflowError::InvalidSessionId(session_id.to_string()).into())
    }
}

/// Process-local checkpoint store
#[derive(Clone, Default)]
pub struct MemoryCheckpointer {
    checkpoints: Arc<RwLock<HashMap<String, Checkpoint>>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        validate_session_id(&checkpoint.session_id)?;
        let mut checkpoints = self.checkpoints.write().await;
        checkpoints.insert(checkpoint.session_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let checkpoints = self.checkpoints.read().await;
        Ok(checkpoints.get(session_id).cloned())
    }

    async fn take(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let mut checkpoints = self.checkpoints.write().await;
        Ok(checkpoints.remove(session_id))
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let mut checkpoints = self.checkpoints.write().await;
        Ok(checkpoints.remove(session_id).is_some())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let checkpoints = self.checkpoints.read().await;
        let mut ids: Vec<String> = checkpoints.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// One JSON file per session under a directory
///
/// Lets a run pause in one process and resume in another.
#[derive(Debug, Clone)]
pub struct FileCheckpointer {
    dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{}.json", session_id)))
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let path = self.path_for(&checkpoint.session_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write to a temporary file first so a crash never leaves half a checkpoint
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(checkpoint)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        log::debug!("Saved checkpoint {}", path.display());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let path = self.path_for(session_id)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn take(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let path = self.path_for(session_id)?;

        // The rename succeeds for exactly one process
        let claimed = path.with_extension("json.claimed");
        match tokio::fs::rename(&path, &claimed).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let data = tokio::fs::read(&claimed).await?;
        match serde_json::from_slice(&data) {
            Ok(checkpoint) => {
                tokio::fs::remove_file(&claimed).await?;
                Ok(Some(checkpoint))
            }
            Err(e) => {
                tokio::fs::rename(&claimed, &path).await?;
                Err(e.into())
            }
        }
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let path = self.path_for(session_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
