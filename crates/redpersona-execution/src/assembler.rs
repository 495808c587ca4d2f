//! Persona Assembler: merges category results into the final report.

use redpersona_core::account::AccountMetadata;
use redpersona_core::citation::CitationLinker;
use redpersona_core::error::{PersonaError, Result};
use redpersona_core::evidence::{ActivityStatistics, EvidenceStore};
use redpersona_core::report::{CategoryResult, PersonaReport};

/// Builds a `PersonaReport` once every category has finished.
///
/// Sections are resolved one at a time in the order the results are given,
/// which is the pipeline's category processing order. Global citation
/// numbers therefore depend only on the results, never on which worker
/// finished first.
#[derive(Debug, Default)]
pub struct PersonaAssembler;

impl PersonaAssembler {
    pub fn new() -> Self {
        Self
    }

    /// # Errors
    ///
    /// `PersonaError::ReportUnavailable` when no category was inferred.
    pub async fn assemble(
        &self,
        results: Vec<CategoryResult>,
        evidence: &EvidenceStore,
        account: AccountMetadata,
    ) -> Result<PersonaReport> {
        if !results.iter().any(|r| r.status.is_inferred()) {
            return Err(PersonaError::ReportUnavailable {
                degraded: results.len(),
            });
        }

        let linker = CitationLinker::new();
        let mut sections = Vec::with_capacity(results.len());
        for result in &results {
            sections.push(linker.resolve(result, evidence).await);
        }
        let citations = linker.citations().await;

        tracing::info!(
            sections = sections.len(),
            citations = citations.len(),
            degraded = results.iter().filter(|r| !r.status.is_inferred()).count(),
            "Persona report assembled"
        );

        Ok(PersonaReport {
            account: account.with_evidence(evidence.items()),
            statistics: ActivityStatistics::from_evidence(evidence.items()),
            sections,
            citations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redpersona_core::category::Category;
    use redpersona_core::citation::CitationIndex;
    use redpersona_core::evidence::{RawComment, RawPost};
    use redpersona_core::report::{CitationMode, DegradeReason};

    fn store() -> EvidenceStore {
        let posts = vec![RawPost {
            id: Some("p1".into()),
            title: Some("Weekend hike up the ridge".into()),
            subreddit: Some("hiking".into()),
            created_utc: Some(10.0),
            score: Some(5),
            url: Some("https://reddit.com/r/hiking/p1".into()),
            ..RawPost::default()
        }];
        let comments = vec![RawComment {
            id: Some("c1".into()),
            content: Some("Trail running beats the gym".into()),
            subreddit: Some("running".into()),
            created_utc: Some(20.0),
            score: Some(2),
            url: Some("https://reddit.com/r/running/c1".into()),
            ..RawComment::default()
        }];
        EvidenceStore::load(&posts, &comments).unwrap()
    }

    fn inferred(category: Category, narrative: &str, ids: &[&str]) -> CategoryResult {
        let legend: CitationIndex = ids.iter().map(|id| id.to_string()).collect();
        CategoryResult::inferred(
            category,
            narrative.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
            legend,
            CitationMode::Explicit,
            1,
        )
    }

    #[tokio::test]
    async fn test_numbering_follows_result_order() {
        let evidence = store();
        let results = vec![
            inferred(Category::InterestsAndHobbies, "Runs trails [source #1].", &["c1"]),
            inferred(Category::Demographics, "Lives near mountains [source #1].", &["p1"]),
        ];

        let report = PersonaAssembler::new()
            .assemble(results, &evidence, AccountMetadata::new("hiker"))
            .await
            .unwrap();

        assert_eq!(report.sections[0].category, Category::InterestsAndHobbies);
        assert_eq!(report.sections[0].narrative, "Runs trails [1].");
        assert_eq!(report.sections[1].narrative, "Lives near mountains [2].");
        assert_eq!(report.citation(1).unwrap().evidence_id, "c1");
        assert_eq!(report.citation(2).unwrap().evidence_id, "p1");
        assert_eq!(report.account.posts_analyzed, 1);
        assert_eq!(report.statistics.total_comments, 1);
    }

    #[tokio::test]
    async fn test_all_degraded_is_unavailable() {
        let evidence = store();
        let results = vec![
            CategoryResult::degraded(Category::Demographics, DegradeReason::RetriesExhausted, 3),
            CategoryResult::low_evidence(Category::PersonalityTraits),
        ];

        let err = PersonaAssembler::new()
            .assemble(results, &evidence, AccountMetadata::new("ghost"))
            .await
            .unwrap_err();

        assert!(err.is_report_unavailable());
    }
}
