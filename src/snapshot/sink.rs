//! Snapshot Sinks
//!
//! Destinations for finished snapshot documents.

use crate::model::SnapshotDocument;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Accepts one completed snapshot document per collection run
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write(&self, document: &SnapshotDocument) -> Result<()>;
}

/// Writes each document to `<dir>/<id>.json`
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a document will be written to
    pub fn document_path(&self, document: &SnapshotDocument) -> PathBuf {
        self.dir.join(format!("{}.json", document.id))
    }
}

#[async_trait]
impl SnapshotSink for DirectorySink {
    async fn write(&self, document: &SnapshotDocument) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create output directory {:?}", self.dir))?;

        let content = serde_json::to_string_pretty(document)?;

        // Write under a temporary name first so readers never see half a file
        let path = self.document_path(document);
        let partial = path.with_extension("json.partial");
        tokio::fs::write(&partial, content)
            .await
            .with_context(|| format!("Failed to write {:?}", partial))?;
        tokio::fs::rename(&partial, &path)
            .await
            .with_context(|| format!("Failed to move snapshot into place at {:?}", path))?;

        tracing::debug!("Wrote snapshot {} to {:?}", document.id, path);
        Ok(())
    }
}

/// Prints each document as one JSON line on stdout
#[derive(Debug, Clone, Default)]
pub struct StdoutSink;

#[async_trait]
impl SnapshotSink for StdoutSink {
    async fn write(&self, document: &SnapshotDocument) -> Result<()> {
        let mut line = serde_json::to_vec(document)?;
        line.push(b'\n');

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&line).await.context("Failed to write to stdout")?;
        stdout.flush().await.context("Failed to flush stdout")?;
        Ok(())
    }
}
