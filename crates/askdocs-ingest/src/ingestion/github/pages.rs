//! Lazy cursor traversal of the search endpoint

use crate::error::{Error, Result};

use super::client::{GithubClient, RawRecord};
use super::query::{ObjectType, SearchRequest};

/// Lazy producer of search result pages.
///
/// Each value starts a fresh traversal from the first page and advances one
/// cursor step per [`next_page`](SearchPages::next_page) call. Cursors are
/// forward-only, so an advanced traversal cannot be rewound; a consumer that
/// stops early simply never fetches the remaining pages. The traversal ends
/// exactly when the server reports `hasNextPage: false`.
pub struct SearchPages<'a> {
    client: &'a GithubClient,
    object_type: ObjectType,
    search_query: String,
    cursor: Option<String>,
    exhausted: bool,
    pages_fetched: u32,
}

impl<'a> SearchPages<'a> {
    pub(crate) fn new(client: &'a GithubClient, object_type: ObjectType, search_query: String) -> Self {
        Self {
            client,
            object_type,
            search_query,
            cursor: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page of records, or `None` once the traversal is
    /// complete.
    ///
    /// With a page cap configured, needing to fetch past the cap while the
    /// server still reports more pages is a hard [`Error::PageLimit`], never a
    /// silent truncation.
    pub async fn next_page(&mut self) -> Result<Option<Vec<RawRecord>>> {
        if self.exhausted {
            return Ok(None);
        }

        if let Some(limit) = self.client.max_pages() {
            if self.pages_fetched >= limit {
                return Err(Error::PageLimit { limit });
            }
        }

        tracing::info!(
            "Fetching {} page {} (cursor: {})",
            self.object_type.label(),
            self.pages_fetched + 1,
            self.cursor.as_deref().unwrap_or("start")
        );

        let request = SearchRequest::new(
            self.object_type,
            self.search_query.clone(),
            self.cursor.clone(),
        );
        let page = self.client.execute(&request).await?;
        self.pages_fetched += 1;

        if page.page_info.has_next_page {
            self.cursor = page.page_info.end_cursor;
        } else {
            self.exhausted = true;
        }

        Ok(Some(page.records))
    }

    /// Drive the traversal to completion, concatenating pages in fetch order
    pub async fn collect_records(mut self) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page);
        }

        tracing::info!(
            "Fetched {} {} in {} pages",
            records.len(),
            self.object_type.label(),
            self.pages_fetched
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GithubConfig;
    use crate::ingestion::github::query::DateRange;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use httpmock::Mock;
    use serde_json::json;

    fn test_client(url: String, max_pages: Option<u32>) -> GithubClient {
        GithubClient::new(&GithubConfig {
            token: "test-token".to_string(),
            repo: "acme/docs".to_string(),
            graphql_url: url,
            max_retries: 0,
            max_pages,
        })
        .unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        )
    }

    fn page_body(numbers: &[i64], end_cursor: Option<&str>, has_next: bool) -> serde_json::Value {
        json!({
            "data": {
                "search": {
                    "edges": numbers
                        .iter()
                        .map(|n| json!({"node": {"number": n}}))
                        .collect::<Vec<_>>(),
                    "pageInfo": {"hasNextPage": has_next, "endCursor": end_cursor}
                }
            }
        })
    }

    async fn mock_page<'a>(
        server: &'a MockServer,
        cursor_marker: &str,
        body: serde_json::Value,
    ) -> Mock<'a> {
        let marker = cursor_marker.to_string();
        server
            .mock_async(move |when, then| {
                when.method(POST).path("/graphql").body_contains(marker);
                then.status(200).json_body(body);
            })
            .await
    }

    #[tokio::test]
    async fn test_pages_concatenate_in_fetch_order() {
        let server = MockServer::start_async().await;
        let first = mock_page(
            &server,
            r#""cursor":null"#,
            page_body(&[1, 2], Some("c1"), true),
        )
        .await;
        let second = mock_page(
            &server,
            r#""cursor":"c1""#,
            page_body(&[3], None, false),
        )
        .await;

        let client = test_client(server.url("/graphql"), None);
        let records = client.issues(&range()).collect_records().await.unwrap();

        let numbers: Vec<i64> = records.iter().filter_map(|r| r["number"].as_i64()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        first.assert_hits_async(1).await;
        second.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_traversal_is_lazy() {
        let server = MockServer::start_async().await;
        let first = mock_page(
            &server,
            r#""cursor":null"#,
            page_body(&[1], Some("c1"), true),
        )
        .await;
        let second = mock_page(
            &server,
            r#""cursor":"c1""#,
            page_body(&[2], None, false),
        )
        .await;

        let client = test_client(server.url("/graphql"), None);
        let range = range();
        let mut pages = client.issues(&range);

        let page = pages.next_page().await.unwrap().unwrap();
        assert_eq!(page.len(), 1);
        first.assert_hits_async(1).await;
        second.assert_hits_async(0).await; // second page not requested yet

        let page = pages.next_page().await.unwrap().unwrap();
        assert_eq!(page.len(), 1);
        second.assert_hits_async(1).await;

        assert!(pages.next_page().await.unwrap().is_none());
        assert!(pages.next_page().await.unwrap().is_none());
        second.assert_hits_async(1).await; // exhausted traversals never hit the server
    }

    #[tokio::test]
    async fn test_single_page_traversal_terminates() {
        let server = MockServer::start_async().await;
        let mock = mock_page(
            &server,
            r#""cursor":null"#,
            page_body(&[7], None, false),
        )
        .await;

        let client = test_client(server.url("/graphql"), None);
        let records = client.issues(&range()).collect_records().await.unwrap();

        assert_eq!(records.len(), 1);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_page_cap_is_a_hard_error() {
        let server = MockServer::start_async().await;
        // Server always claims more pages exist.
        let _mock = mock_page(
            &server,
            r#""searchQuery""#,
            page_body(&[1], Some("c1"), true),
        )
        .await;

        let client = test_client(server.url("/graphql"), Some(2));
        let error = client.issues(&range()).collect_records().await.unwrap_err();

        assert!(matches!(error, Error::PageLimit { limit: 2 }));
    }

    #[tokio::test]
    async fn test_completing_within_the_cap_is_fine() {
        let server = MockServer::start_async().await;
        let first = mock_page(
            &server,
            r#""cursor":null"#,
            page_body(&[1], Some("c1"), true),
        )
        .await;
        let second = mock_page(
            &server,
            r#""cursor":"c1""#,
            page_body(&[2], None, false),
        )
        .await;

        let client = test_client(server.url("/graphql"), Some(2));
        let records = client.issues(&range()).collect_records().await.unwrap();

        assert_eq!(records.len(), 2);
        first.assert_hits_async(1).await;
        second.assert_hits_async(1).await;
    }
}
