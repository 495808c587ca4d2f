//! Evidence domain module.
//!
//! - `model`: raw activity records and the normalized `EvidenceItem`
//! - `store`: the Evidence Store that normalizes and orders a run's evidence
//! - `clean`: text normalization and content validity helpers
//! - `sentiment`: keyword sentiment tagging
//! - `statistics`: descriptive activity statistics

pub mod clean;
mod model;
mod sentiment;
mod statistics;
mod store;

pub use model::{EvidenceItem, EvidenceKind, RawComment, RawPost};
pub use sentiment::{Sentiment, analyze_sentiment};
pub use statistics::{ActivityStatistics, SubredditActivity, describe_subreddit, topic_for_subreddit};
pub use store::{DropReport, EvidenceStore, NormalizeOptions};
