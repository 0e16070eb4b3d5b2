//! Authenticated GraphQL transport with bounded retry

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::GithubConfig;
use crate::error::{Error, Result};

use super::pages::SearchPages;
use super::query::{DateRange, ObjectType, SearchRequest};

/// A search result node, left untyped until normalization
pub type RawRecord = serde_json::Value;

/// GitHub GraphQL client.
///
/// Owns authentication and retry; pagination lives in [`SearchPages`].
pub struct GithubClient {
    client: Client,
    graphql_url: String,
    token: String,
    repo: String,
    max_retries: u32,
    max_pages: Option<u32>,
}

impl GithubClient {
    /// Create a new client from configuration
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("askdocs-ingest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            graphql_url: config.graphql_url.clone(),
            token: config.token.clone(),
            repo: config.repo.clone(),
            max_retries: config.max_retries,
            max_pages: config.max_pages,
        })
    }

    /// Start a lazy page traversal over issues updated in the range
    pub fn issues(&self, range: &DateRange) -> SearchPages<'_> {
        let query = ObjectType::Issues.search_query(&self.repo, range);
        SearchPages::new(self, ObjectType::Issues, query)
    }

    /// Start a lazy page traversal over discussions updated in the range
    pub fn discussions(&self, range: &DateRange) -> SearchPages<'_> {
        let query = ObjectType::Discussions.search_query(&self.repo, range);
        SearchPages::new(self, ObjectType::Discussions, query)
    }

    /// Fetch every issue in the range, driving the traversal to completion
    pub async fn fetch_issues(&self, range: &DateRange) -> Result<Vec<RawRecord>> {
        self.issues(range).collect_records().await
    }

    /// Fetch every discussion in the range, driving the traversal to completion
    pub async fn fetch_discussions(&self, range: &DateRange) -> Result<Vec<RawRecord>> {
        self.discussions(range).collect_records().await
    }

    pub(crate) fn max_pages(&self) -> Option<u32> {
        self.max_pages
    }

    /// Execute one search request, retrying transient transport failures with
    /// exponential backoff. GraphQL-level errors are never retried.
    pub(crate) async fn execute(&self, request: &SearchRequest) -> Result<SearchResultPage> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match self.send(request).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Search request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    last_error = Some(e);
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::graphql("search request failed")))
    }

    async fn send(&self, request: &SearchRequest) -> Result<SearchResultPage> {
        let response = self
            .client
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let envelope: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| Error::graphql(format!("malformed search response: {}", e)))?;

        if let Some(error) = envelope.errors.first() {
            return Err(Error::graphql(format!(
                "server returned errors: {}",
                error.message
            )));
        }

        let data = envelope
            .data
            .ok_or_else(|| Error::graphql("search response carried no data"))?;

        Ok(SearchResultPage {
            records: data.search.edges.into_iter().map(|edge| edge.node).collect(),
            page_info: data.search.page_info,
        })
    }
}

/// One fetched page: the records plus the server's pagination state
#[derive(Debug)]
pub(crate) struct SearchResultPage {
    pub records: Vec<RawRecord>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<SearchData>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    search: SearchConnection,
}

#[derive(Debug, Deserialize)]
struct SearchConnection {
    edges: Vec<SearchEdge>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct SearchEdge {
    node: RawRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(url: String, max_retries: u32) -> GithubClient {
        GithubClient::new(&GithubConfig {
            token: "test-token".to_string(),
            repo: "acme/docs".to_string(),
            graphql_url: url,
            max_retries,
            max_pages: None,
        })
        .unwrap()
    }

    fn search_request() -> SearchRequest {
        SearchRequest::new(ObjectType::Issues, "repo:acme/docs".to_string(), None)
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(502);
            })
            .await;

        let client = test_client(server.url("/graphql"), 1);
        let result = client.execute(&search_request()).await;

        assert!(result.is_err());
        mock.assert_hits_async(2).await; // initial attempt plus one retry
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(401);
            })
            .await;

        let client = test_client(server.url("/graphql"), 3);
        let result = client.execute(&search_request()).await;

        assert!(result.is_err());
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_graphql_errors_are_fatal() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200)
                    .json_body(json!({"errors": [{"message": "rate limited"}]}));
            })
            .await;

        let client = test_client(server.url("/graphql"), 3);
        let error = client.execute(&search_request()).await.unwrap_err();

        assert!(matches!(error, Error::Graphql(_)));
        assert!(error.to_string().contains("rate limited"));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .header("authorization", "Bearer test-token");
                then.status(200).json_body(json!({
                    "data": {
                        "search": {
                            "edges": [],
                            "pageInfo": {"hasNextPage": false, "endCursor": null}
                        }
                    }
                }));
            })
            .await;

        let client = test_client(server.url("/graphql"), 0);
        let page = client.execute(&search_request()).await.unwrap();

        assert!(page.records.is_empty());
        assert!(!page.page_info.has_next_page);
        mock.assert_async().await;
    }
}
