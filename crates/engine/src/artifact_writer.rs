// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact read/write/list interface, grounded in the original
//! `artifact_writer_v2.py`. The graph ticker's `noop`-only dispatch never
//! calls this — the original's `tick_run` accepted an artifact writer in its
//! constructor but never invoked it either — but the trait exists so a
//! future step kind can record outputs into a run's `artifacts` map without
//! changing the ticker's public contract.

use async_trait::async_trait;
use av_core::RunId;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact {0} not found for run {1}")]
    NotFound(String, RunId),
}

#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn write(&self, run_id: &RunId, name: &str, bytes: &[u8]) -> Result<(), ArtifactError>;
    async fn read(&self, run_id: &RunId, name: &str) -> Result<Vec<u8>, ArtifactError>;
    async fn list(&self, run_id: &RunId) -> Result<Vec<String>, ArtifactError>;
}

/// Writes artifacts to `base_dir/<run_id>/<name>` on the local filesystem.
pub struct FsArtifactWriter {
    base_dir: PathBuf,
}

impl FsArtifactWriter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.base_dir.join(run_id.as_str())
    }
}

#[async_trait]
impl ArtifactWriter for FsArtifactWriter {
    async fn write(&self, run_id: &RunId, name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let dir = self.run_dir(run_id);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(name), bytes).await?;
        Ok(())
    }

    async fn read(&self, run_id: &RunId, name: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = self.run_dir(run_id).join(name);
        tokio::fs::read(&path)
            .await
            .map_err(|_| ArtifactError::NotFound(name.to_string(), run_id.clone()))
    }

    async fn list(&self, run_id: &RunId) -> Result<Vec<String>, ArtifactError> {
        let dir = self.run_dir(run_id);
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(_) => return Ok(names),
        };
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
#[path = "artifact_writer_tests.rs"]
mod tests;
