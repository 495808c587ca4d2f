//! Descriptive activity statistics over the evidence set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::EvidenceItem;

const TOP_SUBREDDITS: usize = 10;

const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "technology",
        &["programming", "technology", "coding", "python", "javascript", "webdev", "rust"],
    ),
    ("gaming", &["gaming", "games", "nintendo", "xbox", "playstation", "steam"]),
    ("lifestyle", &["food", "cooking", "fitness", "fashion", "relationships"]),
    ("entertainment", &["movies", "music", "television", "books", "netflix"]),
    ("news", &["news", "worldnews", "politics", "coronavirus"]),
    (
        "educational",
        &["askreddit", "explainlikeimfive", "todayilearned", "science"],
    ),
    ("hobby", &["diy", "crafts", "gardening", "photography", "art"]),
    ("sports", &["sports", "soccer", "basketball", "football", "baseball"]),
    ("finance", &["personalfinance", "investing", "cryptocurrency", "stocks"]),
    ("career", &["jobs", "career", "cscareerquestions", "resumes"]),
];

const KNOWN_DESCRIPTIONS: &[(&str, &str)] = &[
    ("programming", "Programming and software development discussions"),
    ("askreddit", "Ask and answer thought-provoking questions"),
    ("gaming", "General gaming discussions and news"),
    ("technology", "Technology news and discussions"),
    ("news", "Current news and events"),
    ("food", "Food, cooking, and recipes"),
    ("fitness", "Health, fitness, and exercise"),
];

/// Activity within one community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubredditActivity {
    pub name: String,
    pub count: usize,
    pub topic: String,
    /// Short blurb about the community
    #[serde(default)]
    pub description: String,
}

/// Summary numbers shown next to the inferred sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityStatistics {
    pub total_posts: usize,
    pub total_comments: usize,
    pub average_post_score: f64,
    pub average_comment_score: f64,
    /// Most active first; ties broken by name
    pub top_subreddits: Vec<SubredditActivity>,
    pub subreddit_diversity: usize,
    pub average_content_length: f64,
}

impl ActivityStatistics {
    pub fn from_evidence(items: &[EvidenceItem]) -> Self {
        let (posts, comments): (Vec<&EvidenceItem>, Vec<&EvidenceItem>) =
            items.iter().partition(|item| item.is_post());

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in items.iter().filter(|item| !item.subreddit.is_empty()) {
            *counts.entry(item.subreddit.as_str()).or_default() += 1;
        }
        let subreddit_diversity = counts.len();

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let top_subreddits = ranked
            .into_iter()
            .take(TOP_SUBREDDITS)
            .map(|(name, count)| SubredditActivity {
                name: name.to_string(),
                count,
                topic: topic_for_subreddit(name).to_string(),
                description: describe_subreddit(name),
            })
            .collect();

        let lengths: Vec<usize> = items
            .iter()
            .map(|item| item.full_text().chars().count())
            .collect();

        Self {
            total_posts: posts.len(),
            total_comments: comments.len(),
            average_post_score: mean(posts.iter().map(|p| p.score as f64)),
            average_comment_score: mean(comments.iter().map(|c| c.score as f64)),
            top_subreddits,
            subreddit_diversity,
            average_content_length: mean(lengths.into_iter().map(|l| l as f64)),
        }
    }

    pub fn most_active_subreddit(&self) -> Option<&str> {
        self.top_subreddits.first().map(|s| s.name.as_str())
    }
}

/// Coarse topical bucket of a community, by keyword match on its name.
pub fn topic_for_subreddit(subreddit: &str) -> &'static str {
    let lower = subreddit.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| *topic)
        .unwrap_or("other")
}

/// One-line description of a community. Exact (case-insensitive) name
/// match on a small table, generic wording otherwise.
pub fn describe_subreddit(subreddit: &str) -> String {
    let lower = subreddit.to_lowercase();
    KNOWN_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| format!("Discussions about {subreddit}"))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::EvidenceKind;
    use chrono::DateTime;

    fn item(id: &str, kind: EvidenceKind, subreddit: &str, score: i64, text: &str) -> EvidenceItem {
        EvidenceItem {
            id: id.into(),
            kind,
            title_or_snippet: text.into(),
            body: String::new(),
            url: format!("https://reddit.com/{id}"),
            subreddit: subreddit.into(),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            score,
            parent_title: None,
            sentiment: None,
        }
    }

    #[test]
    fn test_statistics_from_evidence() {
        let items = vec![
            item("p1", EvidenceKind::Post, "rust", 10, "abcd"),
            item("p2", EvidenceKind::Post, "gaming", 20, "ab"),
            item("c1", EvidenceKind::Comment, "rust", 3, "abcdef"),
            item("c2", EvidenceKind::Comment, "AskReddit", -1, "ab"),
        ];

        let stats = ActivityStatistics::from_evidence(&items);

        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.total_comments, 2);
        assert_eq!(stats.average_post_score, 15.0);
        assert_eq!(stats.average_comment_score, 1.0);
        assert_eq!(stats.subreddit_diversity, 3);
        assert_eq!(stats.most_active_subreddit(), Some("rust"));
        assert_eq!(stats.top_subreddits[1].name, "AskReddit");
        assert_eq!(stats.top_subreddits[1].topic, "educational");
        assert_eq!(
            stats.top_subreddits[1].description,
            "Ask and answer thought-provoking questions"
        );
        assert_eq!(stats.top_subreddits[2].description, "Discussions about gaming");
        assert_eq!(stats.average_content_length, 3.5);
    }

    #[test]
    fn test_topic_for_subreddit() {
        assert_eq!(topic_for_subreddit("PersonalFinance"), "finance");
        assert_eq!(topic_for_subreddit("learnpython"), "technology");
        assert_eq!(topic_for_subreddit("knitting"), "other");
    }

    #[test]
    fn test_describe_subreddit() {
        assert_eq!(describe_subreddit("Fitness"), "Health, fitness, and exercise");
        assert_eq!(describe_subreddit("knitting"), "Discussions about knitting");
        // No substring matching: only exact names have a curated blurb.
        assert_eq!(describe_subreddit("newsokur"), "Discussions about newsokur");
    }

    #[test]
    fn test_empty_statistics() {
        let stats = ActivityStatistics::from_evidence(&[]);
        assert_eq!(stats.average_post_score, 0.0);
        assert!(stats.most_active_subreddit().is_none());
    }
}
