//! The activity source seam: where raw posts and comments come from.

use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::account::AccountMetadata;
use crate::error::Result;
use crate::evidence::{RawComment, RawPost};

/// How much activity to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchLimits {
    pub max_posts: usize,
    pub max_comments: usize,
}

/// Everything an activity source returns for one account.
///
/// This is also the on-disk dump format used for offline runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawActivity {
    pub username: String,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub link_karma: i64,
    #[serde(default)]
    pub comment_karma: i64,
    #[serde(default)]
    pub posts: Vec<RawPost>,
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

impl RawActivity {
    /// Account fields known before normalization.
    pub fn account_metadata(&self) -> AccountMetadata {
        AccountMetadata {
            created_at: self
                .created_utc
                .and_then(|s| DateTime::from_timestamp(s.trunc() as i64, 0)),
            link_karma: self.link_karma,
            comment_karma: self.comment_karma,
            ..AccountMetadata::new(self.username.clone())
        }
    }
}

/// A provider of public account activity.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn fetch(&self, username: &str, limits: FetchLimits) -> Result<RawActivity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_deserializes_with_missing_fields() {
        let json = r#"{
            "username": "kojied",
            "posts": [{"id": "p1", "title": "hi", "url": "https://reddit.com/p1", "created_utc": 1.0}],
            "comments": [{"id": "c1", "content": "yo"}]
        }"#;

        let activity: RawActivity = serde_json::from_str(json).unwrap();

        assert_eq!(activity.posts.len(), 1);
        assert_eq!(activity.comments[0].url, None);
        assert_eq!(activity.link_karma, 0);
    }

    #[test]
    fn test_account_metadata() {
        let activity = RawActivity {
            username: "kojied".into(),
            created_utc: Some(1_600_000_000.5),
            link_karma: 10,
            comment_karma: 20,
            ..RawActivity::default()
        };

        let meta = activity.account_metadata();

        assert_eq!(meta.username, "kojied");
        assert_eq!(meta.created_at.map(|d| d.timestamp()), Some(1_600_000_000));
        assert_eq!(meta.comment_karma, 20);
    }
}
