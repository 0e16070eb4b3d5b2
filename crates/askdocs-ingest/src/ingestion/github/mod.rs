//! GitHub issue and discussion ingestion over the GraphQL search API

pub mod client;
pub mod normalize;
pub mod pages;
pub mod query;

pub use client::{GithubClient, RawRecord};
pub use pages::SearchPages;
pub use query::{DateRange, ObjectType};
