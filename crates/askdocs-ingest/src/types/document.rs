//! Normalized document types shared across ingestion sources

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A normalized unit of retrievable content.
///
/// Every source (issues, discussions, scraped pages) reduces to the same two
/// fields so the embedding and upsert steps never care where a document came
/// from. `metadata` always carries a `"source"` entry identifying the origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Plain-text body fed to the embedder
    pub page_content: String,

    /// Source-specific metadata stored alongside the vector
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    pub fn new(page_content: String, metadata: HashMap<String, serde_json::Value>) -> Self {
        Self {
            page_content,
            metadata,
        }
    }

    /// Content origin: `"github_issue"`, `"github_discussion"`, or the URL of
    /// a scraped page
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|value| value.as_str())
    }
}

/// Outcome of a conversion step: the documents that normalized cleanly plus a
/// count of records dropped along the way. Dropped records are logged at the
/// point of failure, never propagated as errors.
#[derive(Debug, Clone, Default)]
pub struct DocumentBatch {
    pub documents: Vec<Document>,
    pub skipped: usize,
}

impl DocumentBatch {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
