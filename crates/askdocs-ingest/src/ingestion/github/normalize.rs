//! Raw search records to normalized documents
//!
//! Conversion is per-record fault isolated: a record whose shape does not
//! deserialize is logged and counted, and every other record still converts.
//! Sparse-but-well-formed records always convert; absent fields fall back to
//! empty text in the body and JSON null in the metadata.

use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::types::{Document, DocumentBatch};

use super::client::RawRecord;

/// Metadata source tag for issue documents
pub const SOURCE_ISSUE: &str = "github_issue";

/// Metadata source tag for discussion documents
pub const SOURCE_DISCUSSION: &str = "github_discussion";

/// Convert raw issue records into documents, skipping records that fail
pub fn issues_to_documents(records: Vec<RawRecord>) -> DocumentBatch {
    convert_records(records, "issue", issue_to_document)
}

/// Convert raw discussion records into documents, skipping records that fail
pub fn discussions_to_documents(records: Vec<RawRecord>) -> DocumentBatch {
    convert_records(records, "discussion", discussion_to_document)
}

fn convert_records(
    records: Vec<RawRecord>,
    kind: &str,
    convert: fn(RawRecord) -> serde_json::Result<Document>,
) -> DocumentBatch {
    let mut batch = DocumentBatch::default();

    for record in records {
        let number = record.get("number").and_then(|n| n.as_i64());
        match convert(record) {
            Ok(document) => batch.documents.push(document),
            Err(e) => {
                batch.skipped += 1;
                match number {
                    Some(number) => tracing::error!("Skipping {} #{}: {}", kind, number, e),
                    None => tracing::error!("Skipping {} with no usable number: {}", kind, e),
                }
            }
        }
    }

    batch
}

fn issue_to_document(record: RawRecord) -> serde_json::Result<Document> {
    let issue: RawIssue = serde_json::from_value(record)?;

    let mut blocks = vec![
        format!("Title: {}", issue.title.as_deref().unwrap_or_default()),
        format!("State: {}", issue.state.as_deref().unwrap_or_default()),
        format!("Description: {}", issue.body_text.as_deref().unwrap_or_default()),
    ];

    let labels = issue.labels.unwrap_or_default().nodes;
    if !labels.is_empty() {
        let names: Vec<&str> = labels.iter().map(|label| label.name.as_str()).collect();
        blocks.push(format!("Labels: {}", names.join(", ")));
    }

    for comment in issue.comments.unwrap_or_default().nodes.into_iter().flatten() {
        if let Some(body) = comment.body {
            blocks.push(format!("Comment: {}", body));
        }
    }

    let reaction_count = issue.reactions.unwrap_or_default().total_count;
    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), json!(SOURCE_ISSUE));
    metadata.insert("id".to_string(), json!(issue.id));
    metadata.insert("url".to_string(), json!(issue.url));
    metadata.insert("title".to_string(), json!(issue.title));
    metadata.insert("number".to_string(), json!(issue.number));
    metadata.insert("state".to_string(), json!(issue.state));
    metadata.insert("created_at".to_string(), json!(issue.created_at));
    metadata.insert("closed_at".to_string(), json!(issue.closed_at));
    metadata.insert("state_reason".to_string(), json!(issue.state_reason));
    metadata.insert("reaction_count".to_string(), json!(reaction_count));

    Ok(Document::new(blocks.join("\n\n"), metadata))
}

fn discussion_to_document(record: RawRecord) -> serde_json::Result<Document> {
    let discussion: RawDiscussion = serde_json::from_value(record)?;

    let category_name = discussion
        .category
        .as_ref()
        .and_then(|category| category.name.as_deref());
    let answer_text = discussion
        .answer
        .as_ref()
        .and_then(|answer| answer.body_text.as_deref());

    let mut blocks = vec![
        format!("Title: {}", discussion.title.as_deref().unwrap_or_default()),
        format!("Category: {}", category_name.unwrap_or("Uncategorized")),
        format!("Question: {}", discussion.body_text.as_deref().unwrap_or_default()),
    ];

    if discussion.answer.is_some() {
        blocks.push(format!("Accepted Answer: {}", answer_text.unwrap_or_default()));
    }

    for comment in discussion
        .comments
        .unwrap_or_default()
        .nodes
        .into_iter()
        .flatten()
    {
        if let Some(body) = comment.body_text {
            // A comment repeating the accepted answer verbatim adds nothing.
            if answer_text != Some(body.as_str()) {
                blocks.push(format!("Comment: {}", body));
            }
        }
    }

    let labels = discussion.labels.unwrap_or_default().nodes;
    if !labels.is_empty() {
        let names: Vec<&str> = labels.iter().map(|label| label.name.as_str()).collect();
        blocks.push(format!("Labels: {}", names.join(", ")));
    }

    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), json!(SOURCE_DISCUSSION));
    metadata.insert("id".to_string(), json!(discussion.id));
    metadata.insert("url".to_string(), json!(discussion.url));
    metadata.insert("created_at".to_string(), json!(discussion.created_at));
    metadata.insert("title".to_string(), json!(discussion.title));
    metadata.insert("number".to_string(), json!(discussion.number));
    metadata.insert(
        "category".to_string(),
        json!(discussion.category.and_then(|category| category.name)),
    );
    metadata.insert(
        "is_answered".to_string(),
        json!(discussion.is_answered.unwrap_or(false)),
    );
    metadata.insert(
        "upvote_count".to_string(),
        json!(discussion.upvote_count.unwrap_or(0)),
    );

    Ok(Document::new(blocks.join("\n\n"), metadata))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIssue {
    id: Option<String>,
    number: Option<i64>,
    url: Option<String>,
    title: Option<String>,
    state: Option<String>,
    state_reason: Option<String>,
    created_at: Option<String>,
    closed_at: Option<String>,
    body_text: Option<String>,
    reactions: Option<ReactionGroup>,
    labels: Option<LabelConnection>,
    comments: Option<IssueCommentConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDiscussion {
    id: Option<String>,
    number: Option<i64>,
    url: Option<String>,
    title: Option<String>,
    created_at: Option<String>,
    body_text: Option<String>,
    is_answered: Option<bool>,
    upvote_count: Option<i64>,
    category: Option<DiscussionCategory>,
    answer: Option<DiscussionAnswer>,
    labels: Option<LabelConnection>,
    comments: Option<DiscussionCommentConnection>,
}

#[derive(Debug, Default, Deserialize)]
struct ReactionGroup {
    #[serde(rename = "totalCount", default)]
    total_count: i64,
}

#[derive(Debug, Default, Deserialize)]
struct LabelConnection {
    #[serde(default)]
    nodes: Vec<RawLabel>,
}

// A label without a name is a malformed record, not a sparse one.
#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct IssueCommentConnection {
    #[serde(default)]
    nodes: Vec<Option<RawIssueComment>>,
}

#[derive(Debug, Deserialize)]
struct RawIssueComment {
    body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscussionCommentConnection {
    #[serde(default)]
    nodes: Vec<Option<RawDiscussionComment>>,
}

// Discussion comments expose bodyText where issue comments expose body;
// the search queries request exactly those fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDiscussionComment {
    body_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscussionCategory {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscussionAnswer {
    body_text: Option<String>,
}
