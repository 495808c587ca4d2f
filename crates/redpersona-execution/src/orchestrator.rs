//! Inference Orchestrator: one category, one bounded inference exchange.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use redpersona_core::PersonaError;
use redpersona_core::agent::{InferenceAgent, InferenceError};
use redpersona_core::category::CategoryDefinition;
use redpersona_core::citation::{CitationIndex, marker};
use redpersona_core::config::{CitationFallback, PipelineConfig};
use redpersona_core::error::Result;
use redpersona_core::evidence::EvidenceItem;
use redpersona_core::report::{CategoryResult, CitationMode, DegradeReason};

use crate::prompt::PromptBuilder;
use crate::retry::{RetryFailure, RetryPolicy, call_with_retry};

/// Runs the inference call for a category and links its citations to the
/// evidence shown in the prompt.
pub struct InferenceOrchestrator {
    agent: Arc<dyn InferenceAgent>,
    prompts: PromptBuilder,
    policy: RetryPolicy,
    fallback: CitationFallback,
}

impl InferenceOrchestrator {
    pub fn new(agent: Arc<dyn InferenceAgent>, config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            agent,
            prompts: PromptBuilder::new(config)?,
            policy: RetryPolicy::from_config(config),
            fallback: config.citation_fallback,
        })
    }

    /// Analyzes `selected` for one category.
    ///
    /// Never fails: an empty selection yields a low-evidence result, and
    /// failed inference yields a degraded result with the placeholder
    /// narrative.
    pub async fn analyze(
        &self,
        definition: &CategoryDefinition,
        selected: &[EvidenceItem],
        subreddits: &[String],
        cancel: &CancellationToken,
    ) -> CategoryResult {
        let category = definition.category;
        let span = tracing::info_span!("category", category = %category, selector = %definition.selector);
        self.analyze_inner(definition, selected, subreddits, cancel)
            .instrument(span)
            .await
    }

    async fn analyze_inner(
        &self,
        definition: &CategoryDefinition,
        selected: &[EvidenceItem],
        subreddits: &[String],
        cancel: &CancellationToken,
    ) -> CategoryResult {
        let category = definition.category;

        if selected.is_empty() {
            tracing::info!("No evidence selected, skipping inference");
            return CategoryResult::low_evidence(category);
        }

        let (request, legend) = match self.prompts.build(category, selected, subreddits) {
            Ok(built) => built,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build prompt");
                return CategoryResult::degraded(category, DegradeReason::Crashed, 0);
            }
        };

        tracing::info!(
            shown = legend.len(),
            selected = selected.len(),
            agent = self.agent.expertise(),
            "Starting inference"
        );

        let outcome = call_with_retry(&self.policy, cancel, |attempt| {
            let agent = self.agent.clone();
            let request = request.clone();
            async move {
                tracing::debug!(attempt, "Calling inference agent");
                let response = agent.execute(request).await?;
                validate_response(&response)
            }
        })
        .await;

        match outcome {
            Ok((narrative, attempts)) => {
                let result = self.link(definition, narrative, legend, attempts);
                tracing::info!(
                    attempts,
                    cited = result.cited_evidence_ids.len(),
                    mode = ?result.citation_mode,
                    "Category inferred"
                );
                result
            }
            Err(failure) => {
                let attempts = failure.attempts();
                let reason = match &failure {
                    RetryFailure::Exhausted { last_error, .. } => {
                        tracing::warn!(attempts, error = %last_error, "Inference failed after retries");
                        DegradeReason::RetriesExhausted
                    }
                    RetryFailure::Rejected { error, .. } => {
                        tracing::warn!(attempts, error = %error, "Inference request rejected");
                        DegradeReason::Rejected
                    }
                    RetryFailure::Cancelled { .. } => {
                        tracing::info!(attempts, "Inference cancelled");
                        DegradeReason::Cancelled
                    }
                };
                CategoryResult::degraded(category, reason, attempts)
            }
        }
    }

    /// Maps the markers of an accepted narrative back to evidence ids.
    fn link(
        &self,
        definition: &CategoryDefinition,
        narrative: String,
        legend: CitationIndex,
        attempts: u32,
    ) -> CategoryResult {
        let category = definition.category;
        let mut cited: Vec<String> = Vec::new();

        for index in marker::referenced_indices(&narrative) {
            match legend.resolve(index) {
                Some(id) => {
                    if !cited.iter().any(|c| c == id) {
                        cited.push(id.to_string());
                    }
                }
                None => {
                    let violation = PersonaError::InferenceInvariantViolation {
                        category: category.name(),
                        index,
                    };
                    tracing::warn!(error = %violation, shown = legend.len(), "Ignoring citation marker");
                }
            }
        }

        let (mode, cited) = if !cited.is_empty() {
            (CitationMode::Explicit, cited)
        } else {
            match self.fallback {
                CitationFallback::CiteShownSubset => {
                    (CitationMode::Implicit, legend.evidence_ids().to_vec())
                }
                CitationFallback::CiteNothing => (CitationMode::Uncited, Vec::new()),
            }
        };

        CategoryResult::inferred(category, narrative, cited, legend, mode, attempts)
    }
}

/// Accepts a response as a narrative, or rejects it as malformed.
///
/// Surrounding code fences and whitespace are removed. A response with no
/// letters or digits is malformed, which the retry loop treats as transient.
pub fn validate_response(response: &str) -> std::result::Result<String, InferenceError> {
    let mut text = response.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string of the opening fence.
        text = rest.split_once('\n').map_or("", |(_, body)| body);
        text = text.trim_end().strip_suffix("```").unwrap_or(text).trim();
    }

    if text.is_empty() {
        return Err(InferenceError::Malformed("empty response".to_string()));
    }
    if !text.chars().any(char::is_alphanumeric) {
        return Err(InferenceError::Malformed(
            "response carries no readable text".to_string(),
        ));
    }

    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use redpersona_core::agent::InferenceRequest;
    use redpersona_core::category::Category;
    use redpersona_core::evidence::EvidenceKind;
    use redpersona_core::report::CategoryStatus;
    use std::sync::Mutex;

    struct ScriptedAgent {
        replies: Mutex<Vec<std::result::Result<String, InferenceError>>>,
    }

    impl ScriptedAgent {
        fn new(replies: Vec<std::result::Result<String, InferenceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
            })
        }
    }

    #[async_trait]
    impl InferenceAgent for ScriptedAgent {
        fn expertise(&self) -> &str {
            "scripted"
        }

        async fn execute(&self, _request: InferenceRequest) -> std::result::Result<String, InferenceError> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(InferenceError::Permanent("script exhausted".into())))
        }
    }

    fn item(id: &str) -> EvidenceItem {
        EvidenceItem {
            id: id.to_string(),
            kind: EvidenceKind::Comment,
            title_or_snippet: format!("text of {id}"),
            body: String::new(),
            url: format!("https://reddit.com/{id}"),
            subreddit: "rust".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            score: 1,
            parent_title: None,
            sentiment: None,
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            ..PipelineConfig::default()
        }
    }

    fn orchestrator(agent: Arc<ScriptedAgent>, config: &PipelineConfig) -> InferenceOrchestrator {
        InferenceOrchestrator::new(agent, config).unwrap()
    }

    #[test]
    fn test_validate_response() {
        assert_eq!(validate_response("  Calm and precise. \n").unwrap(), "Calm and precise.");
        assert_eq!(
            validate_response("```markdown\nLikes Rust [source #1]\n```").unwrap(),
            "Likes Rust [source #1]"
        );
        assert!(validate_response("   ").is_err());
        assert!(validate_response("```\n```").is_err());
        assert!(validate_response("... -- ...").is_err());
    }

    #[tokio::test]
    async fn test_explicit_citations_map_to_legend() {
        let agent = ScriptedAgent::new(vec![Ok("Enjoys systems work [source #2].".into())]);
        let orchestrator = orchestrator(agent, &config());
        let definition = CategoryDefinition::new(Category::InterestsAndHobbies);

        let result = orchestrator
            .analyze(&definition, &[item("a"), item("b")], &[], &CancellationToken::new())
            .await;

        assert_eq!(result.status, CategoryStatus::Inferred);
        assert_eq!(result.citation_mode, CitationMode::Explicit);
        assert_eq!(result.cited_evidence_ids, vec!["b".to_string()]);
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_out_of_range_markers_are_ignored() {
        let agent = ScriptedAgent::new(vec![Ok("Night owl [source #1] [source #9].".into())]);
        let orchestrator = orchestrator(agent, &config());
        let definition = CategoryDefinition::new(Category::BehaviorsAndHabits);

        let result = orchestrator
            .analyze(&definition, &[item("a")], &[], &CancellationToken::new())
            .await;

        assert_eq!(result.cited_evidence_ids, vec!["a".to_string()]);
        assert!(result.cited_evidence_ids.iter().all(|id| result.legend.contains_id(id)));
    }

    #[tokio::test]
    async fn test_fallback_cites_shown_subset() {
        let agent = ScriptedAgent::new(vec![Ok("Seems curious about everything.".into())]);
        let orchestrator = orchestrator(agent, &config());
        let definition = CategoryDefinition::new(Category::PersonalityTraits);

        let result = orchestrator
            .analyze(&definition, &[item("a"), item("b")], &[], &CancellationToken::new())
            .await;

        assert_eq!(result.citation_mode, CitationMode::Implicit);
        assert_eq!(result.cited_evidence_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_fallback_cite_nothing() {
        let agent = ScriptedAgent::new(vec![Ok("Seems curious about everything.".into())]);
        let config = PipelineConfig {
            citation_fallback: CitationFallback::CiteNothing,
            ..config()
        };
        let orchestrator = orchestrator(agent, &config);
        let definition = CategoryDefinition::new(Category::PersonalityTraits);

        let result = orchestrator
            .analyze(&definition, &[item("a")], &[], &CancellationToken::new())
            .await;

        assert_eq!(result.status, CategoryStatus::Inferred);
        assert_eq!(result.citation_mode, CitationMode::Uncited);
        assert!(result.cited_evidence_ids.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_then_success() {
        let agent = ScriptedAgent::new(vec![Ok("   ".into()), Ok("Focused [source #1]".into())]);
        let orchestrator = orchestrator(agent, &config());
        let definition = CategoryDefinition::new(Category::MotivationsAndGoals);

        let result = orchestrator
            .analyze(&definition, &[item("a")], &[], &CancellationToken::new())
            .await;

        assert_eq!(result.status, CategoryStatus::Inferred);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_rejected_request_degrades() {
        let agent = ScriptedAgent::new(vec![Err(InferenceError::Permanent("401".into()))]);
        let orchestrator = orchestrator(agent, &config());
        let definition = CategoryDefinition::new(Category::Demographics);

        let result = orchestrator
            .analyze(&definition, &[item("a")], &[], &CancellationToken::new())
            .await;

        assert_eq!(
            result.status,
            CategoryStatus::Degraded {
                reason: DegradeReason::Rejected
            }
        );
        assert_eq!(result.narrative, "Insufficient data to infer demographics.");
        assert!(result.cited_evidence_ids.is_empty());
    }

    #[tokio::test]
    async fn test_empty_selection_is_low_evidence() {
        let agent = ScriptedAgent::new(vec![]);
        let orchestrator = orchestrator(agent, &config());
        let definition = CategoryDefinition::new(Category::Demographics);

        let result = orchestrator
            .analyze(&definition, &[], &[], &CancellationToken::new())
            .await;

        assert_eq!(result.status, CategoryStatus::LowEvidence);
        assert_eq!(result.attempts, 0);
    }
}
