//! JSON persistence for intermediate pipeline output

use std::path::PathBuf;

use crate::error::Result;
use crate::types::Document;

/// Filesystem store holding one JSON file per pipeline step.
///
/// Steps are decoupled through these files: a fetch step writes its documents
/// and the matching embed step reads them back, so either side can be rerun
/// alone.
pub struct DocumentStore {
    base_dir: PathBuf,
}

impl DocumentStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Persist a document list under the step's file
    pub async fn save(&self, step: &str, documents: &[Document]) -> Result<()> {
        let path = self.step_path(step);
        let json = serde_json::to_string_pretty(documents)?;
        tokio::fs::write(&path, json).await?;

        tracing::info!("Saved {} documents to {}", documents.len(), path.display());
        Ok(())
    }

    /// Load a step's document list; a missing file reads as an empty list
    pub async fn load(&self, step: &str) -> Result<Vec<Document>> {
        let path = self.step_path(step);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    fn step_path(&self, step: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", step))
    }
}
