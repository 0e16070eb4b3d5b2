//! Error types for the ingestion pipeline

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ingestion pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// GraphQL error reported by the server or a malformed response body
    #[error("GraphQL error: {0}")]
    Graphql(String),

    /// Pagination hit the configured page cap before the server reported the
    /// last page
    #[error("Pagination exceeded the {limit} page cap before completing")]
    PageLimit { limit: u32 },

    /// Page scrape error
    #[error("Scrape error: {0}")]
    Scrape(String),

    /// Embedding generation error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector database error
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Create a GraphQL error
    pub fn graphql(message: impl Into<String>) -> Self {
        Error::Graphql(message.into())
    }

    /// Create a scrape error
    pub fn scrape(message: impl Into<String>) -> Self {
        Error::Scrape(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Error::Embedding(message.into())
    }

    /// Create a vector database error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Error::VectorDb(message.into())
    }

    /// True for transport-level failures worth one more attempt: connection
    /// errors and 5xx statuses, never 4xx or GraphQL-level errors.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => match e.status() {
                Some(status) => status.is_server_error(),
                None => !e.is_builder() && !e.is_decode(),
            },
            _ => false,
        }
    }
}
