//! Account metadata and profile URL handling.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PersonaError, Result};
use crate::evidence::EvidenceItem;

static PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.|old\.)?reddit\.com/(?:user|u)/([A-Za-z0-9_-]+)/?(?:\?.*)?$")
        .expect("valid profile url pattern")
});

/// Account-level facts reported alongside the inferred sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub link_karma: i64,
    #[serde(default)]
    pub comment_karma: i64,
    /// Communities the analyzed evidence comes from, sorted
    #[serde(default)]
    pub active_subreddits: Vec<String>,
    #[serde(default)]
    pub posts_analyzed: usize,
    #[serde(default)]
    pub comments_analyzed: usize,
}

impl AccountMetadata {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Fills the evidence-derived fields from the normalized evidence.
    pub fn with_evidence(mut self, items: &[EvidenceItem]) -> Self {
        let subreddits: BTreeSet<&str> = items
            .iter()
            .map(|item| item.subreddit.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        self.active_subreddits = subreddits.into_iter().map(String::from).collect();
        self.posts_analyzed = items.iter().filter(|i| i.is_post()).count();
        self.comments_analyzed = items.iter().filter(|i| i.is_comment()).count();
        self
    }

    /// Whole days between account creation and `now`.
    pub fn account_age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.created_at.map(|created| (now - created).num_days())
    }
}

/// Extracts the username from a Reddit profile URL.
///
/// Accepts `reddit.com`, `www.reddit.com` and `old.reddit.com` with either
/// the `/user/` or the `/u/` path form. A query string is ignored.
pub fn username_from_profile_url(url: &str) -> Result<String> {
    PROFILE_URL
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| PersonaError::InvalidProfileUrl(url.to_string()))
}

/// Human readable account age, e.g. `2 years, 3 months`.
pub fn describe_age(days: i64) -> String {
    fn plural(n: i64, unit: &str) -> String {
        if n == 1 {
            format!("{n} {unit}")
        } else {
            format!("{n} {unit}s")
        }
    }

    let years = days / 365;
    let months = (days % 365) / 30;
    if years > 0 {
        format!("{}, {}", plural(years, "year"), plural(months, "month"))
    } else if months > 0 {
        plural(months, "month")
    } else {
        plural(days.max(0), "day")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_from_profile_url() {
        assert_eq!(
            username_from_profile_url("https://www.reddit.com/user/kojied/").unwrap(),
            "kojied"
        );
        assert_eq!(
            username_from_profile_url("https://old.reddit.com/u/Hungry-Move-6603").unwrap(),
            "Hungry-Move-6603"
        );
        assert_eq!(
            username_from_profile_url("https://reddit.com/user/some_one").unwrap(),
            "some_one"
        );
    }

    #[test]
    fn test_profile_url_with_query_string() {
        assert_eq!(
            username_from_profile_url("https://www.reddit.com/user/kojied/?sort=new").unwrap(),
            "kojied"
        );
        assert_eq!(
            username_from_profile_url("https://www.reddit.com/u/kojied?utm_source=share").unwrap(),
            "kojied"
        );
        assert!(username_from_profile_url("https://www.reddit.com/user/kojied/comments/?sort=new").is_err());
    }

    #[test]
    fn test_rejects_non_profile_urls() {
        for url in [
            "https://www.reddit.com/r/rust/",
            "https://example.com/user/kojied/",
            "https://www.reddit.com/user/kojied/comments/",
            "kojied",
        ] {
            let err = username_from_profile_url(url).unwrap_err();
            assert!(matches!(err, PersonaError::InvalidProfileUrl(_)), "{url}");
        }
    }

    #[test]
    fn test_describe_age() {
        assert_eq!(describe_age(800), "2 years, 2 months");
        assert_eq!(describe_age(400), "1 year, 1 month");
        assert_eq!(describe_age(65), "2 months");
        assert_eq!(describe_age(1), "1 day");
        assert_eq!(describe_age(0), "0 days");
    }

    #[test]
    fn test_account_age_days() {
        let mut meta = AccountMetadata::new("kojied");
        assert_eq!(meta.account_age_days(Utc::now()), None);

        let created = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        meta.created_at = Some(created);
        let now = DateTime::from_timestamp(1_600_000_000 + 10 * 86_400, 0).unwrap();
        assert_eq!(meta.account_age_days(now), Some(10));
    }
}
