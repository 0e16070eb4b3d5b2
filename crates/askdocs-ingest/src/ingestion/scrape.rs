//! Documentation page scraping with visible-text extraction

use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{HashMap, HashSet};

use crate::config::ScraperConfig;
use crate::error::{Error, Result};
use crate::types::Document;

use super::sitemap;

/// Tags whose subtrees never contribute visible content
const STRIP_TAGS: [&str; 5] = ["script", "style", "nav", "footer", "header"];

/// Content regions tried in preference order
const CONTENT_REGIONS: [&str; 3] = ["main", "article", "body"];

/// Documentation site scraper.
///
/// Enumerates pages from a sitemap feed and reduces each page to its visible
/// text. Sitemap failures are fatal; per-page failures are absorbed so one
/// broken page never sinks a crawl.
pub struct SiteScraper {
    client: Client,
    sitemap_url: String,
}

impl SiteScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self {
            client,
            sitemap_url: config.sitemap_url.clone(),
        })
    }

    /// Fetch the sitemap feed and return its deduplicated URL set
    pub async fn sitemap_urls(&self) -> Result<HashSet<String>> {
        let response = self
            .client
            .get(&self.sitemap_url)
            .send()
            .await?
            .error_for_status()?;
        let xml = response.text().await?;

        let urls = sitemap::parse(&xml);
        tracing::info!("Sitemap {} listed {} urls", self.sitemap_url, urls.len());
        Ok(urls)
    }

    /// Scrape one URL, absorbing any failure into an absent result
    pub async fn scrape_url(&self, url: &str) -> Option<Document> {
        match self.try_scrape(url).await {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::error!("Error scraping {}: {}", url, e);
                None
            }
        }
    }

    /// Scrape one URL, surfacing the failure to the caller
    pub async fn try_scrape(&self, url: &str) -> Result<Document> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::scrape(format!(
                "HTTP {} fetching {}",
                response.status(),
                url
            )));
        }
        let html = response.text().await?;
        let page = extract_page(&html);
        tracing::info!("Scraped url: {}", url);

        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), serde_json::json!(url));
        metadata.insert("title".to_string(), serde_json::json!(page.title));
        Ok(Document::new(page.text, metadata))
    }
}

struct ExtractedPage {
    title: String,
    text: String,
}

/// Reduce a page to its title and visible text.
///
/// Text comes from the first `main`, `article`, or `body` element, falling
/// back to the whole document; stripped-tag subtrees contribute nothing, and
/// the surviving text nodes are trimmed and joined with newlines.
fn extract_page(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").unwrap();
    let title = document
        .select(&title_selector)
        .find(|element| !inside_stripped(*element))
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let region = content_region(&document).unwrap_or_else(|| document.root_element());
    let mut parts = Vec::new();
    collect_text(region, &mut parts);

    ExtractedPage {
        title,
        text: parts.join("\n"),
    }
}

fn content_region(document: &Html) -> Option<ElementRef<'_>> {
    for tag in CONTENT_REGIONS {
        let selector = Selector::parse(tag).unwrap();
        if let Some(region) = document
            .select(&selector)
            .find(|element| !inside_stripped(*element))
        {
            return Some(region);
        }
    }
    None
}

// A candidate region nested inside a stripped tag counts as stripped too.
fn inside_stripped(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| STRIP_TAGS.contains(&ancestor.value().name()))
}

fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Element(el) if STRIP_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, parts);
                }
            }
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
            }
            _ => {}
        }
    }
}
