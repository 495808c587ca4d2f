//! Per-category results and the assembled persona report.

use serde::{Deserialize, Serialize};

use crate::account::AccountMetadata;
use crate::category::Category;
use crate::citation::CitationIndex;
use crate::evidence::{ActivityStatistics, EvidenceKind};

/// Why a category fell back to its placeholder narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// Every bounded attempt failed transiently
    RetriesExhausted,
    /// The inference capability refused the request outright
    Rejected,
    /// The run was cancelled before this category finished
    Cancelled,
    /// The run deadline passed before this category finished
    TimedOut,
    /// The category's worker task panicked
    Crashed,
}

impl DegradeReason {
    pub fn describe(&self) -> &'static str {
        match self {
            DegradeReason::RetriesExhausted => "inference failed after retries",
            DegradeReason::Rejected => "inference request rejected",
            DegradeReason::Cancelled => "run cancelled",
            DegradeReason::TimedOut => "run deadline exceeded",
            DegradeReason::Crashed => "analysis task failed",
        }
    }
}

/// How complete a category's narrative is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryStatus {
    /// Narrative produced by the inference capability
    Inferred,
    /// The category's selector picked no evidence
    LowEvidence,
    /// Inference did not produce a usable narrative
    Degraded { reason: DegradeReason },
}

impl CategoryStatus {
    pub fn is_inferred(&self) -> bool {
        matches!(self, CategoryStatus::Inferred)
    }

    pub fn label(&self) -> String {
        match self {
            CategoryStatus::Inferred => "inferred".to_string(),
            CategoryStatus::LowEvidence => "degraded: insufficient evidence".to_string(),
            CategoryStatus::Degraded { reason } => format!("degraded: {}", reason.describe()),
        }
    }
}

/// Where a category's citations came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationMode {
    /// Parsed from `source #k` markers
    Explicit,
    /// No usable markers; everything shown to the category is cited
    Implicit,
    /// No usable markers and the fallback cites nothing
    Uncited,
}

/// Output of the Inference Orchestrator for one category.
///
/// `narrative` still carries local `source #k` markers; `legend` maps them
/// back to evidence ids. `cited_evidence_ids` is always a subset of the
/// legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: Category,
    pub narrative: String,
    pub cited_evidence_ids: Vec<String>,
    pub legend: CitationIndex,
    pub citation_mode: CitationMode,
    pub status: CategoryStatus,
    /// Inference calls made for this category
    pub attempts: u32,
}

impl CategoryResult {
    pub fn inferred(
        category: Category,
        narrative: String,
        cited_evidence_ids: Vec<String>,
        legend: CitationIndex,
        citation_mode: CitationMode,
        attempts: u32,
    ) -> Self {
        Self {
            category,
            narrative,
            cited_evidence_ids,
            legend,
            citation_mode,
            status: CategoryStatus::Inferred,
            attempts,
        }
    }

    pub fn low_evidence(category: Category) -> Self {
        Self::placeholder(category, CategoryStatus::LowEvidence, 0)
    }

    pub fn degraded(category: Category, reason: DegradeReason, attempts: u32) -> Self {
        Self::placeholder(category, CategoryStatus::Degraded { reason }, attempts)
    }

    fn placeholder(category: Category, status: CategoryStatus, attempts: u32) -> Self {
        Self {
            category,
            narrative: category.placeholder_narrative(),
            cited_evidence_ids: Vec::new(),
            legend: CitationIndex::new(),
            citation_mode: CitationMode::Uncited,
            status,
            attempts,
        }
    }
}

/// One category as it appears in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub category: Category,
    pub title: String,
    /// Narrative with markers rewritten to global `[n]` numbers
    pub narrative: String,
    /// Global citation numbers in order of first appearance in this section
    pub citation_numbers: Vec<u32>,
    pub cited_evidence_ids: Vec<String>,
    pub status: CategoryStatus,
    pub citation_mode: CitationMode,
}

/// One line of the deduplicated citation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationEntry {
    pub number: u32,
    pub evidence_id: String,
    pub url: String,
    pub kind: EvidenceKind,
    pub subreddit: String,
    pub snippet: String,
}

/// The terminal output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaReport {
    pub account: AccountMetadata,
    pub statistics: ActivityStatistics,
    /// One section per category, in processing order
    pub sections: Vec<ReportSection>,
    /// Ordered by number; numbers are 1..=len
    pub citations: Vec<CitationEntry>,
}

impl PersonaReport {
    pub fn section(&self, category: Category) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.category == category)
    }

    pub fn degraded_categories(&self) -> Vec<Category> {
        self.sections
            .iter()
            .filter(|s| !s.status.is_inferred())
            .map(|s| s.category)
            .collect()
    }

    pub fn is_fully_inferred(&self) -> bool {
        self.sections.iter().all(|s| s.status.is_inferred())
    }

    pub fn citation(&self, number: u32) -> Option<&CitationEntry> {
        self.citations.iter().find(|c| c.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        let low = CategoryResult::low_evidence(Category::PersonalityTraits);
        assert_eq!(low.status, CategoryStatus::LowEvidence);
        assert!(low.cited_evidence_ids.is_empty());
        assert_eq!(low.narrative, "Insufficient data to infer personality traits.");

        let degraded =
            CategoryResult::degraded(Category::MotivationsAndGoals, DegradeReason::RetriesExhausted, 3);
        assert_eq!(degraded.attempts, 3);
        assert_eq!(degraded.status.label(), "degraded: inference failed after retries");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&CategoryStatus::Degraded {
            reason: DegradeReason::TimedOut,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"degraded","reason":"timed_out"}"#);
    }
}
