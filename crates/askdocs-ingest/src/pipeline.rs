//! Sequential ingestion steps wiring fetch, normalize, persist, embed, upsert

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::IngestConfig;
use crate::error::Result;
use crate::ingestion::github::normalize::{self, SOURCE_DISCUSSION, SOURCE_ISSUE};
use crate::ingestion::github::query::DateRange;
use crate::ingestion::github::GithubClient;
use crate::ingestion::scrape::SiteScraper;
use crate::providers::embedding::EmbeddingProvider;
use crate::providers::openai::OpenAiEmbedder;
use crate::providers::pinecone::{PineconeIndex, VectorRecord};
use crate::storage::DocumentStore;
use crate::types::{Document, DocumentBatch};

/// Step names; fetch steps double as persisted file names
pub const GITHUB_ISSUES_RAW: &str = "github_issues_raw";
pub const GITHUB_DISCUSSIONS_RAW: &str = "github_discussions_raw";
pub const DOCS_SCRAPE_RAW: &str = "docs_scrape_raw";
pub const GITHUB_ISSUES_EMBEDDINGS: &str = "github_issues_embeddings";
pub const GITHUB_DISCUSSIONS_EMBEDDINGS: &str = "github_discussions_embeddings";
pub const DOCS_EMBEDDINGS: &str = "docs_embeddings";

const NAMESPACE_ISSUES: &str = "github_issues";
const NAMESPACE_DISCUSSIONS: &str = "github_discussions";
const NAMESPACE_DOCS: &str = "docs";

/// Documents per embedding request
const EMBED_BATCH: usize = 100;

/// Summary of one completed pipeline step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: &'static str,
    pub produced: usize,
    pub skipped: usize,
}

/// The ingestion pipeline.
///
/// Steps run sequentially and talk through the document store, never through
/// memory, so any fetch or embed step can be rerun on its own.
pub struct IngestPipeline {
    github: GithubClient,
    scraper: SiteScraper,
    store: DocumentStore,
    embedder: Arc<dyn EmbeddingProvider>,
    index: PineconeIndex,
}

impl IngestPipeline {
    /// Build the pipeline and its clients from configuration
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let github = GithubClient::new(&config.github)?;
        let scraper = SiteScraper::new(&config.scraper)?;
        let store = DocumentStore::new(config.storage.base_dir.clone())?;
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbedder::new(&config.openai)?);
        let index = PineconeIndex::new(&config.pinecone)?;

        Ok(Self {
            github,
            scraper,
            store,
            embedder,
            index,
        })
    }

    /// Replace the embedding provider
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = embedder;
        self
    }

    /// Fetch issues updated in the range, normalize, and persist them
    pub async fn fetch_issues(&self, range: &DateRange) -> Result<StepReport> {
        let records = self.github.fetch_issues(range).await?;
        let batch = normalize::issues_to_documents(records);
        self.persist_batch(GITHUB_ISSUES_RAW, batch).await
    }

    /// Fetch discussions updated in the range, normalize, and persist them
    pub async fn fetch_discussions(&self, range: &DateRange) -> Result<StepReport> {
        let records = self.github.fetch_discussions(range).await?;
        let batch = normalize::discussions_to_documents(records);
        self.persist_batch(GITHUB_DISCUSSIONS_RAW, batch).await
    }

    /// Scrape every sitemap URL and persist the resulting documents.
    ///
    /// An unreachable sitemap is fatal; an unreachable page is counted and
    /// skipped.
    pub async fn scrape_docs(&self) -> Result<StepReport> {
        let urls = self.scraper.sitemap_urls().await?;

        let mut batch = DocumentBatch::default();
        for url in &urls {
            match self.scraper.scrape_url(url).await {
                Some(document) => batch.documents.push(document),
                None => batch.skipped += 1,
            }
        }

        self.persist_batch(DOCS_SCRAPE_RAW, batch).await
    }

    /// Embed persisted issue documents and upsert them
    pub async fn embed_issues(&self) -> Result<StepReport> {
        self.embed_step(GITHUB_ISSUES_RAW, GITHUB_ISSUES_EMBEDDINGS, NAMESPACE_ISSUES)
            .await
    }

    /// Embed persisted discussion documents and upsert them
    pub async fn embed_discussions(&self) -> Result<StepReport> {
        self.embed_step(
            GITHUB_DISCUSSIONS_RAW,
            GITHUB_DISCUSSIONS_EMBEDDINGS,
            NAMESPACE_DISCUSSIONS,
        )
        .await
    }

    /// Embed persisted scraped documents and upsert them
    pub async fn embed_docs(&self) -> Result<StepReport> {
        self.embed_step(DOCS_SCRAPE_RAW, DOCS_EMBEDDINGS, NAMESPACE_DOCS).await
    }

    /// Run the GitHub half of the pipeline
    pub async fn run_github(&self, range: &DateRange) -> Result<Vec<StepReport>> {
        self.index.ensure_index().await?;

        let mut reports = Vec::new();
        reports.push(self.fetch_issues(range).await?);
        reports.push(self.embed_issues().await?);
        reports.push(self.fetch_discussions(range).await?);
        reports.push(self.embed_discussions().await?);
        Ok(reports)
    }

    /// Run the documentation half of the pipeline
    pub async fn run_docs(&self) -> Result<Vec<StepReport>> {
        self.index.ensure_index().await?;

        Ok(vec![self.scrape_docs().await?, self.embed_docs().await?])
    }

    /// Run everything
    pub async fn run_all(&self, range: &DateRange) -> Result<Vec<StepReport>> {
        let mut reports = self.run_github(range).await?;
        reports.extend(self.run_docs().await?);
        Ok(reports)
    }

    async fn persist_batch(&self, step: &'static str, batch: DocumentBatch) -> Result<StepReport> {
        self.store.save(step, &batch.documents).await?;

        let report = StepReport {
            step,
            produced: batch.documents.len(),
            skipped: batch.skipped,
        };
        tracing::info!(
            "Step {}: {} documents ({} skipped)",
            report.step,
            report.produced,
            report.skipped
        );
        Ok(report)
    }

    async fn embed_step(
        &self,
        source_step: &str,
        step: &'static str,
        namespace: &str,
    ) -> Result<StepReport> {
        let documents = self.store.load(source_step).await?;

        let mut upserted = 0;
        let mut skipped = 0;

        for chunk in documents.chunks(EMBED_BATCH) {
            let mut kept = Vec::with_capacity(chunk.len());
            let mut texts = Vec::with_capacity(chunk.len());

            for document in chunk {
                match vector_id(document) {
                    Some(id) => {
                        texts.push(document.page_content.clone());
                        kept.push((id, document));
                    }
                    None => {
                        skipped += 1;
                        tracing::warn!(
                            "Skipping document with no usable vector id (source: {})",
                            document.source().unwrap_or("unknown")
                        );
                    }
                }
            }

            if kept.is_empty() {
                continue;
            }

            let embeddings = self.embedder.embed_batch(&texts).await?;
            let records: Vec<VectorRecord> = kept
                .into_iter()
                .zip(embeddings)
                .map(|((id, document), values)| VectorRecord {
                    id,
                    values,
                    metadata: vector_metadata(document),
                })
                .collect();

            upserted += self.index.upsert(Some(namespace), &records).await?;
        }

        let report = StepReport {
            step,
            produced: upserted,
            skipped,
        };
        tracing::info!(
            "Step {}: {} vectors upserted into namespace {} ({} skipped)",
            report.step,
            report.produced,
            namespace,
            report.skipped
        );
        Ok(report)
    }
}

/// Vector id preference: the source record id, else the url, else a
/// source-prefixed number; scraped pages fall back to their own URL.
fn vector_id(document: &Document) -> Option<String> {
    let metadata = &document.metadata;
    if let Some(id) = metadata.get("id").and_then(|value| value.as_str()) {
        return Some(id.to_string());
    }
    if let Some(url) = metadata.get("url").and_then(|value| value.as_str()) {
        return Some(url.to_string());
    }

    match document.source() {
        Some(SOURCE_ISSUE) => metadata
            .get("number")
            .and_then(|value| value.as_i64())
            .map(|number| format!("{}-{}", SOURCE_ISSUE, number)),
        Some(SOURCE_DISCUSSION) => metadata
            .get("number")
            .and_then(|value| value.as_i64())
            .map(|number| format!("{}-{}", SOURCE_DISCUSSION, number)),
        Some(url) => Some(url.to_string()),
        None => None,
    }
}

/// Index metadata: the document metadata plus the page text, with JSON nulls
/// dropped since the index rejects them
fn vector_metadata(document: &Document) -> HashMap<String, serde_json::Value> {
    let mut metadata: HashMap<String, serde_json::Value> = document
        .metadata
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    metadata.insert("text".to_string(), serde_json::json!(document.page_content));
    metadata
}
