//! Content ingestion from GitHub and documentation sites

pub mod github;
pub mod scrape;
pub mod sitemap;

pub use scrape::SiteScraper;
