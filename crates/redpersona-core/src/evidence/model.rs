//! Evidence domain model.
//!
//! `RawPost` and `RawComment` mirror what an activity source hands over, with
//! every field optional. `EvidenceItem` is the normalized, immutable shape
//! the rest of the pipeline works on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sentiment::Sentiment;

/// Whether a piece of evidence is a submission or a comment.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Post,
    Comment,
}

impl EvidenceKind {
    pub fn label(&self) -> &'static str {
        match self {
            EvidenceKind::Post => "post",
            EvidenceKind::Comment => "comment",
        }
    }
}

/// A single post or comment that can be shown to inference and cited.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EvidenceItem {
    /// Source identifier, unique within a run
    pub id: String,
    pub kind: EvidenceKind,
    /// Post title, or the comment body for comments
    pub title_or_snippet: String,
    /// Cleaned self-text of a post; empty for comments and link posts
    #[serde(default)]
    pub body: String,
    /// Permalink used as the citation target
    pub url: String,
    pub subreddit: String,
    pub created_at: DateTime<Utc>,
    pub score: i64,
    /// Title of the submission a comment replied to, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    /// Keyword tone of the text; absent when tagging is turned off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

impl EvidenceItem {
    /// All text carried by this item, title first.
    pub fn full_text(&self) -> String {
        if self.body.is_empty() {
            self.title_or_snippet.clone()
        } else {
            format!("{} {}", self.title_or_snippet, self.body)
        }
    }

    pub fn is_post(&self) -> bool {
        self.kind == EvidenceKind::Post
    }

    pub fn is_comment(&self) -> bool {
        self.kind == EvidenceKind::Comment
    }
}

/// A submission as delivered by an activity source.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RawPost {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Self-text
    pub content: Option<String>,
    pub subreddit: Option<String>,
    /// Seconds since the Unix epoch
    pub created_utc: Option<f64>,
    pub score: Option<i64>,
    pub url: Option<String>,
    #[serde(default)]
    pub num_comments: Option<i64>,
}

/// A comment as delivered by an activity source.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RawComment {
    pub id: Option<String>,
    /// Comment body
    pub content: Option<String>,
    pub subreddit: Option<String>,
    /// Seconds since the Unix epoch
    pub created_utc: Option<f64>,
    pub score: Option<i64>,
    pub url: Option<String>,
    #[serde(default)]
    pub parent_post_title: Option<String>,
}
