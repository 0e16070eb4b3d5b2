//! askdocs-ingest: the ingestion pipeline feeding the AskDocs assistant
//!
//! Pulls GitHub issues and discussions through the GraphQL search API,
//! scrapes documentation pages listed in a sitemap feed, normalizes both
//! into plain-text documents, and embeds them into a Pinecone index.
//!
//! The pipeline runs as discrete steps persisted through a document store,
//! so fetching and embedding can be rerun independently.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod storage;
pub mod types;

pub use config::IngestConfig;
pub use error::{Error, Result};
pub use pipeline::{IngestPipeline, StepReport};
pub use types::{Document, DocumentBatch};
