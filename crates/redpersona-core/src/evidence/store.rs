//! Evidence Store: normalizes raw activity into citable evidence.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::clean::{clean_text, is_removed, is_substantive};
use super::model::{EvidenceItem, EvidenceKind, RawComment, RawPost};
use super::sentiment::analyze_sentiment;
use crate::error::{PersonaError, Result};

/// Counts of raw records that did not make it into the store, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropReport {
    pub missing_url: usize,
    pub missing_timestamp: usize,
    #[serde(default)]
    pub missing_id: usize,
    #[serde(default)]
    pub missing_subreddit: usize,
    #[serde(default)]
    pub missing_score: usize,
    pub removed_content: usize,
    /// Text too short or too few words to say anything about the author
    #[serde(default)]
    pub low_content: usize,
    pub duplicate_id: usize,
}

impl DropReport {
    pub fn total(&self) -> usize {
        self.missing_url
            + self.missing_timestamp
            + self.missing_id
            + self.missing_subreddit
            + self.missing_score
            + self.removed_content
            + self.low_content
            + self.duplicate_id
    }

    fn record(&mut self, rejection: Rejection) {
        let counter = match rejection {
            Rejection::MissingUrl => &mut self.missing_url,
            Rejection::MissingTimestamp => &mut self.missing_timestamp,
            Rejection::MissingId => &mut self.missing_id,
            Rejection::MissingSubreddit => &mut self.missing_subreddit,
            Rejection::MissingScore => &mut self.missing_score,
            Rejection::RemovedContent => &mut self.removed_content,
            Rejection::LowContent => &mut self.low_content,
        };
        *counter += 1;
    }
}

/// Knobs for turning raw records into evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Minimum characters of cleaned text an item must carry
    pub min_content_length: usize,
    /// Tag each item with a keyword sentiment
    pub analyze_sentiment: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            min_content_length: 10,
            analyze_sentiment: true,
        }
    }
}

/// The read-only evidence set of one run.
///
/// Items are ordered by creation time, oldest first. Items with equal
/// timestamps keep their input order, posts before comments. Cloning is
/// cheap; all clones share the same items.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    items: Arc<[EvidenceItem]>,
    dropped: DropReport,
}

impl EvidenceStore {
    /// Normalizes raw posts and comments into evidence with default options.
    pub fn load(raw_posts: &[RawPost], raw_comments: &[RawComment]) -> Result<Self> {
        Self::load_with(raw_posts, raw_comments, &NormalizeOptions::default())
    }

    /// Normalizes raw posts and comments into evidence.
    ///
    /// A record is dropped when it lacks any of id, URL, timestamp, subreddit
    /// or score, when its body was removed, when its cleaned text is too thin
    /// (see [`NormalizeOptions::min_content_length`]), or when its id was
    /// already seen.
    ///
    /// # Errors
    ///
    /// `PersonaError::MalformedEvidence` when nothing usable remains.
    pub fn load_with(
        raw_posts: &[RawPost],
        raw_comments: &[RawComment],
        options: &NormalizeOptions,
    ) -> Result<Self> {
        let mut dropped = DropReport::default();
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(raw_posts.len() + raw_comments.len());

        let candidates = raw_posts
            .iter()
            .map(|raw| normalize_post(raw, options))
            .chain(raw_comments.iter().map(|raw| normalize_comment(raw, options)));

        for candidate in candidates {
            match candidate {
                Ok(item) => {
                    if seen.insert(item.id.clone()) {
                        items.push(item);
                    } else {
                        dropped.duplicate_id += 1;
                    }
                }
                Err(rejection) => dropped.record(rejection),
            }
        }

        // Stable: equal timestamps keep posts-then-comments input order.
        items.sort_by_key(|item| item.created_at);

        if dropped.total() > 0 {
            tracing::info!(
                kept = items.len(),
                missing_url = dropped.missing_url,
                missing_timestamp = dropped.missing_timestamp,
                missing_id = dropped.missing_id,
                missing_subreddit = dropped.missing_subreddit,
                missing_score = dropped.missing_score,
                removed_content = dropped.removed_content,
                low_content = dropped.low_content,
                duplicate_id = dropped.duplicate_id,
                "Dropped raw records during normalization"
            );
        }

        if items.is_empty() {
            return Err(PersonaError::MalformedEvidence {
                dropped: dropped.total(),
            });
        }

        Ok(Self {
            items: items.into(),
            dropped,
        })
    }

    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&EvidenceItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn dropped(&self) -> DropReport {
        self.dropped
    }

    pub fn post_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_post()).count()
    }

    pub fn comment_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_comment()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MissingUrl,
    MissingTimestamp,
    MissingId,
    MissingSubreddit,
    MissingScore,
    RemovedContent,
    LowContent,
}

fn normalize_post(
    raw: &RawPost,
    options: &NormalizeOptions,
) -> std::result::Result<EvidenceItem, Rejection> {
    let url = required_text(raw.url.as_deref(), Rejection::MissingUrl)?;
    let created_at = required_timestamp(raw.created_utc)?;
    let id = required_text(raw.id.as_deref(), Rejection::MissingId)?;
    let subreddit = required_text(raw.subreddit.as_deref(), Rejection::MissingSubreddit)?;
    let score = raw.score.ok_or(Rejection::MissingScore)?;

    let title = clean_text(raw.title.as_deref().unwrap_or_default());
    let content = raw.content.as_deref().unwrap_or_default();
    let body = if is_removed(content) {
        String::new()
    } else {
        clean_text(content)
    };
    if title.is_empty() && body.is_empty() {
        return Err(Rejection::RemovedContent);
    }

    let mut item = EvidenceItem {
        id,
        kind: EvidenceKind::Post,
        title_or_snippet: title,
        body,
        url,
        subreddit,
        created_at,
        score,
        parent_title: None,
        sentiment: None,
    };
    finish(&mut item, options)?;
    Ok(item)
}

fn normalize_comment(
    raw: &RawComment,
    options: &NormalizeOptions,
) -> std::result::Result<EvidenceItem, Rejection> {
    let url = required_text(raw.url.as_deref(), Rejection::MissingUrl)?;
    let created_at = required_timestamp(raw.created_utc)?;
    let id = required_text(raw.id.as_deref(), Rejection::MissingId)?;
    let subreddit = required_text(raw.subreddit.as_deref(), Rejection::MissingSubreddit)?;
    let score = raw.score.ok_or(Rejection::MissingScore)?;

    let content = raw.content.as_deref().unwrap_or_default();
    if is_removed(content) {
        return Err(Rejection::RemovedContent);
    }
    let snippet = clean_text(content);
    if snippet.is_empty() {
        return Err(Rejection::RemovedContent);
    }

    let mut item = EvidenceItem {
        id,
        kind: EvidenceKind::Comment,
        title_or_snippet: snippet,
        body: String::new(),
        url,
        subreddit,
        created_at,
        score,
        parent_title: raw
            .parent_post_title
            .as_deref()
            .map(clean_text)
            .filter(|title| !title.is_empty()),
        sentiment: None,
    };
    finish(&mut item, options)?;
    Ok(item)
}

/// Applies the content validity filter and sentiment tagging.
fn finish(item: &mut EvidenceItem, options: &NormalizeOptions) -> std::result::Result<(), Rejection> {
    let text = item.full_text();
    if !is_substantive(&text, options.min_content_length) {
        return Err(Rejection::LowContent);
    }
    if options.analyze_sentiment {
        item.sentiment = Some(analyze_sentiment(&text));
    }
    Ok(())
}

fn required_text(value: Option<&str>, missing: Rejection) -> std::result::Result<String, Rejection> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(missing),
    }
}

fn required_timestamp(created_utc: Option<f64>) -> std::result::Result<DateTime<Utc>, Rejection> {
    let seconds = created_utc.filter(|s| s.is_finite() && *s > 0.0);
    seconds
        .and_then(|s| DateTime::from_timestamp(s.trunc() as i64, 0))
        .ok_or(Rejection::MissingTimestamp)
}
