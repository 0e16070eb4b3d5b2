//! GraphQL search documents and typed request bodies

use chrono::NaiveDate;
use serde::Serialize;

/// Search query for issues; `$cursor` is null on the first page
const ISSUES_QUERY: &str = r#"
query SearchIssues($searchQuery: String!, $cursor: String) {
    search(query: $searchQuery, type: ISSUE, first: 100, after: $cursor) {
        edges {
            node {
                ... on Issue {
                    id
                    number
                    title
                    url
                    bodyText
                    state
                    stateReason
                    createdAt
                    closedAt
                    reactions {
                        totalCount
                    }
                    labels(first: 100) {
                        nodes {
                            name
                        }
                    }
                    comments(first: 100) {
                        nodes {
                            body
                        }
                    }
                }
            }
        }
        pageInfo {
            hasNextPage
            endCursor
        }
    }
}
"#;

/// Search query for discussions; comments expose `bodyText` rather than `body`
const DISCUSSIONS_QUERY: &str = r#"
query SearchDiscussions($searchQuery: String!, $cursor: String) {
    search(query: $searchQuery, type: DISCUSSION, first: 100, after: $cursor) {
        edges {
            node {
                ... on Discussion {
                    id
                    number
                    title
                    url
                    bodyText
                    createdAt
                    isAnswered
                    upvoteCount
                    category {
                        name
                    }
                    answer {
                        bodyText
                    }
                    labels(first: 100) {
                        nodes {
                            name
                        }
                    }
                    comments(first: 100) {
                        nodes {
                            bodyText
                        }
                    }
                }
            }
        }
        pageInfo {
            hasNextPage
            endCursor
        }
    }
}
"#;

/// Searchable object kind a traversal targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Issues,
    Discussions,
}

impl ObjectType {
    /// GraphQL document for this object kind
    pub(crate) fn query_document(&self) -> &'static str {
        match self {
            ObjectType::Issues => ISSUES_QUERY,
            ObjectType::Discussions => DISCUSSIONS_QUERY,
        }
    }

    /// Search qualifier string for a repository and date window.
    ///
    /// `is:issue` keeps pull requests out of issue results; discussion search
    /// needs no such qualifier.
    pub(crate) fn search_query(&self, repo: &str, range: &DateRange) -> String {
        match self {
            ObjectType::Issues => {
                format!("repo:{} is:issue updated:{}..{}", repo, range.start, range.end)
            }
            ObjectType::Discussions => {
                format!("repo:{} updated:{}..{}", repo, range.start, range.end)
            }
        }
    }

    /// Label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            ObjectType::Issues => "issues",
            ObjectType::Discussions => "discussions",
        }
    }
}

/// Inclusive date window compiled into the `updated:` search qualifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// POST body for one search page
#[derive(Debug, Serialize)]
pub struct SearchRequest {
    pub query: &'static str,
    pub variables: SearchVariables,
}

/// Typed query variables.
///
/// Serialization renders an absent cursor as JSON `null` and a present one as
/// a quoted string, so cursor values never touch the query text itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchVariables {
    pub search_query: String,
    pub cursor: Option<String>,
}

impl SearchRequest {
    pub fn new(object_type: ObjectType, search_query: String, cursor: Option<String>) -> Self {
        Self {
            query: object_type.query_document(),
            variables: SearchVariables {
                search_query,
                cursor,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        )
    }

    #[test]
    fn test_absent_cursor_serializes_as_null() {
        let request = SearchRequest::new(ObjectType::Issues, "repo:acme/docs".to_string(), None);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""cursor":null"#));
    }

    #[test]
    fn test_present_cursor_serializes_as_quoted_string() {
        let request = SearchRequest::new(
            ObjectType::Issues,
            "repo:acme/docs".to_string(),
            Some("Y3Vyc29yOjEwMA==".to_string()),
        );
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""cursor":"Y3Vyc29yOjEwMA==""#));
    }

    #[test]
    fn test_cursor_with_quotes_is_escaped() {
        let request = SearchRequest::new(
            ObjectType::Issues,
            "repo:acme/docs".to_string(),
            Some(r#"cu"rs"or"#.to_string()),
        );
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""cursor":"cu\"rs\"or""#));
    }

    #[test]
    fn test_issue_search_query_excludes_pull_requests() {
        let query = ObjectType::Issues.search_query("acme/docs", &range());
        assert_eq!(query, "repo:acme/docs is:issue updated:2024-03-01..2024-03-02");
    }

    #[test]
    fn test_discussion_search_query() {
        let query = ObjectType::Discussions.search_query("acme/docs", &range());
        assert_eq!(query, "repo:acme/docs updated:2024-03-01..2024-03-02");
    }

    #[test]
    fn test_query_documents_target_their_object_type() {
        assert!(ObjectType::Issues.query_document().contains("type: ISSUE"));
        assert!(ObjectType::Discussions.query_document().contains("type: DISCUSSION"));
    }
}
