//! Keyword sentiment tagging for individual posts and comments.

use serde::{Deserialize, Serialize};
use strum::Display;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "amazing", "awesome", "love", "like", "happy", "excellent",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "hate",
    "dislike",
    "sad",
    "angry",
    "frustrated",
];

/// Overall tone of one piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Tags `text` by counting positive and negative keywords.
///
/// Words are compared whole and case-insensitively, so "unlike" does not
/// count as "like". Ties are neutral.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let (positive, negative) = text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .fold((0usize, 0usize), |(pos, neg), word| {
            if POSITIVE_WORDS.contains(&word.as_str()) {
                (pos + 1, neg)
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                (pos, neg + 1)
            } else {
                (pos, neg)
            }
        });

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_sentiment() {
        assert_eq!(
            analyze_sentiment("I love this tool, it is AMAZING."),
            Sentiment::Positive
        );
        assert_eq!(
            analyze_sentiment("Terrible docs and I'm frustrated, but the API is good"),
            Sentiment::Negative
        );
        assert_eq!(analyze_sentiment("Shipped the release today"), Sentiment::Neutral);
        assert_eq!(analyze_sentiment("great but awful"), Sentiment::Neutral);
    }

    #[test]
    fn test_matches_whole_words_only() {
        assert_eq!(analyze_sentiment("Unlike goodness, badminton"), Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_labels() {
        assert_eq!(Sentiment::Positive.to_string(), "positive");
        assert_eq!(
            serde_json::to_string(&Sentiment::Negative).unwrap(),
            "\"negative\""
        );
    }
}
