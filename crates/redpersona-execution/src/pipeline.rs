//! The persona pipeline: one worker per category, a barrier, then assembly.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use redpersona_core::account::AccountMetadata;
use redpersona_core::agent::InferenceAgent;
use redpersona_core::category::CategoryDefinition;
use redpersona_core::config::PipelineConfig;
use redpersona_core::error::{PersonaError, Result};
use redpersona_core::evidence::{ActivityStatistics, EvidenceStore};
use redpersona_core::report::{CategoryResult, CategoryStatus, DegradeReason, PersonaReport};

use crate::assembler::PersonaAssembler;
use crate::orchestrator::InferenceOrchestrator;

/// Drives a full run from normalized evidence to the assembled report.
pub struct PersonaPipeline {
    orchestrator: Arc<InferenceOrchestrator>,
    definitions: Vec<CategoryDefinition>,
    run_timeout: Option<Duration>,
}

impl PersonaPipeline {
    pub fn new(
        agent: Arc<dyn InferenceAgent>,
        config: &PipelineConfig,
        definitions: Vec<CategoryDefinition>,
    ) -> Result<Self> {
        Ok(Self {
            orchestrator: Arc::new(InferenceOrchestrator::new(agent, config)?),
            definitions,
            run_timeout: config.run_timeout(),
        })
    }

    pub fn definitions(&self) -> &[CategoryDefinition] {
        &self.definitions
    }

    /// Analyzes every category and assembles the report.
    ///
    /// Cancelling `cancel` abandons in-flight inference calls; categories
    /// that already finished still make it into the report.
    ///
    /// # Errors
    ///
    /// `PersonaError::Cancelled` when `cancel` fired before any category was
    /// inferred, otherwise `PersonaError::ReportUnavailable` when no category
    /// was inferred.
    pub async fn run(
        &self,
        evidence: &EvidenceStore,
        account: AccountMetadata,
        cancel: CancellationToken,
    ) -> Result<PersonaReport> {
        tracing::info!(
            username = %account.username,
            evidence = evidence.len(),
            categories = self.definitions.len(),
            "Starting persona pipeline"
        );

        let results = self.analyze_all(evidence, &account, &cancel).await;
        if cancel.is_cancelled() && !results.iter().any(|r| r.status.is_inferred()) {
            tracing::warn!("Run cancelled before any category was inferred");
            return Err(PersonaError::Cancelled);
        }
        PersonaAssembler::new().assemble(results, evidence, account).await
    }

    /// Runs every category to completion and returns one result per
    /// definition, in definition order.
    pub async fn analyze_all(
        &self,
        evidence: &EvidenceStore,
        account: &AccountMetadata,
        cancel: &CancellationToken,
    ) -> Vec<CategoryResult> {
        let run_token = cancel.child_token();
        let slots: Arc<Vec<OnceLock<CategoryResult>>> =
            Arc::new(self.definitions.iter().map(|_| OnceLock::new()).collect());
        let subreddits: Arc<Vec<String>> = Arc::new(account_subreddits(account, evidence));

        let mut workers = JoinSet::new();
        for (slot, definition) in self.definitions.iter().copied().enumerate() {
            let orchestrator = self.orchestrator.clone();
            let selected = definition.select(evidence.items());
            let subreddits = subreddits.clone();
            let slots = slots.clone();
            let token = run_token.child_token();

            workers.spawn(async move {
                let result = orchestrator
                    .analyze(&definition, &selected, &subreddits, &token)
                    .await;
                let _ = slots[slot].set(result);
            });
        }

        let timed_out = match self.run_timeout {
            Some(limit) => {
                let finished = tokio::time::timeout(limit, drain(&mut workers)).await.is_ok();
                if !finished {
                    tracing::warn!(timeout_secs = limit.as_secs(), "Run deadline exceeded, cancelling");
                    run_token.cancel();
                    drain(&mut workers).await;
                }
                !finished
            }
            None => {
                drain(&mut workers).await;
                false
            }
        };

        self.definitions
            .iter()
            .zip(slots.iter())
            .map(|(definition, slot)| match slot.get().cloned() {
                Some(result) if timed_out => as_timed_out(result),
                Some(result) => result,
                None => {
                    let reason = if timed_out {
                        DegradeReason::TimedOut
                    } else if cancel.is_cancelled() {
                        DegradeReason::Cancelled
                    } else {
                        DegradeReason::Crashed
                    };
                    CategoryResult::degraded(definition.category, reason, 0)
                }
            })
            .collect()
    }
}

/// Waits for every worker. A panicking worker leaves its slot empty.
async fn drain(workers: &mut JoinSet<()>) {
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined
            && e.is_panic()
        {
            tracing::error!(error = %e, "Category worker panicked");
        }
    }
}

fn as_timed_out(result: CategoryResult) -> CategoryResult {
    match result.status {
        CategoryStatus::Degraded {
            reason: DegradeReason::Cancelled,
        } => CategoryResult::degraded(result.category, DegradeReason::TimedOut, result.attempts),
        _ => result,
    }
}

/// Communities to mention as context, most active first.
fn account_subreddits(account: &AccountMetadata, evidence: &EvidenceStore) -> Vec<String> {
    let statistics = ActivityStatistics::from_evidence(evidence.items());
    if statistics.top_subreddits.is_empty() {
        return account.active_subreddits.clone();
    }
    statistics
        .top_subreddits
        .into_iter()
        .map(|s| s.name)
        .collect()
}
