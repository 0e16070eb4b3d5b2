//! Core types for the ingestion pipeline

pub mod document;

pub use document::{Document, DocumentBatch};
