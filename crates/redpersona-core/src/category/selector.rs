//! Evidence selectors used by the Bucketizer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PersonaError;
use crate::evidence::EvidenceItem;

/// A pure function from the full evidence set to the subset one category
/// looks at.
///
/// Every selector preserves the relative order of its input.
///
/// Serialized as `all`, `posts_only`, `comments_only` or `top_by_score:N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EvidenceSelector {
    All,
    PostsOnly,
    CommentsOnly,
    /// The `N` highest-scoring items; ties go to the earlier item
    TopByScore(usize),
}

impl EvidenceSelector {
    pub fn select(&self, items: &[EvidenceItem]) -> Vec<EvidenceItem> {
        match self {
            Self::All => items.to_vec(),
            Self::PostsOnly => items.iter().filter(|i| i.is_post()).cloned().collect(),
            Self::CommentsOnly => items.iter().filter(|i| i.is_comment()).cloned().collect(),
            Self::TopByScore(limit) => {
                let mut ranked: Vec<usize> = (0..items.len()).collect();
                ranked.sort_by(|&a, &b| items[b].score.cmp(&items[a].score).then(a.cmp(&b)));
                ranked.truncate(*limit);
                ranked.sort_unstable();
                ranked.into_iter().map(|idx| items[idx].clone()).collect()
            }
        }
    }
}

impl fmt::Display for EvidenceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::PostsOnly => write!(f, "posts_only"),
            Self::CommentsOnly => write!(f, "comments_only"),
            Self::TopByScore(n) => write!(f, "top_by_score:{n}"),
        }
    }
}

impl FromStr for EvidenceSelector {
    type Err = PersonaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "posts_only" => Ok(Self::PostsOnly),
            "comments_only" => Ok(Self::CommentsOnly),
            other => {
                let limit = other
                    .strip_prefix("top_by_score:")
                    .and_then(|n| n.trim().parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        PersonaError::config(format!("Unknown evidence selector '{other}'"))
                    })?;
                Ok(Self::TopByScore(limit))
            }
        }
    }
}

impl TryFrom<String> for EvidenceSelector {
    type Error = PersonaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EvidenceSelector> for String {
    fn from(value: EvidenceSelector) -> Self {
        value.to_string()
    }
}
