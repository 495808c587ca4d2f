//! Persona use case: activity in, rendered report files out.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use redpersona_core::PersonaError;
use redpersona_core::account::username_from_profile_url;
use redpersona_core::agent::InferenceAgent;
use redpersona_core::category::Category;
use redpersona_core::config::ConfigRoot;
use redpersona_core::evidence::EvidenceStore;
use redpersona_core::report::PersonaReport;
use redpersona_core::source::{ActivitySource, RawActivity};
use redpersona_execution::PersonaPipeline;
use redpersona_infrastructure::ReportStorage;

use crate::render::{RenderOptions, render_text};

/// Where the activity of a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityInput {
    /// Fetch live from the activity source
    ProfileUrl(String),
    /// Replay a dump written by an earlier `--save-raw` run
    Dump(PathBuf),
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub username: String,
    pub posts_analyzed: usize,
    pub comments_analyzed: usize,
    pub records_dropped: usize,
    pub citations: usize,
    pub degraded: Vec<Category>,
    pub text_path: PathBuf,
    pub json_path: PathBuf,
    pub raw_path: Option<PathBuf>,
}

/// Wires the activity source, the pipeline and the output files together.
pub struct PersonaService {
    source: Arc<dyn ActivitySource>,
    agent: Arc<dyn InferenceAgent>,
    config: ConfigRoot,
}

impl PersonaService {
    pub fn new(
        source: Arc<dyn ActivitySource>,
        agent: Arc<dyn InferenceAgent>,
        config: ConfigRoot,
    ) -> Self {
        Self {
            source,
            agent,
            config,
        }
    }

    pub fn config(&self) -> &ConfigRoot {
        &self.config
    }

    /// Fetches or reads the raw activity of a run.
    pub async fn load_activity(&self, input: &ActivityInput) -> Result<RawActivity> {
        match input {
            ActivityInput::ProfileUrl(url) => {
                let username = username_from_profile_url(url)?;
                tracing::info!(%username, "Processing user");
                let activity = self
                    .source
                    .fetch(&username, self.config.fetch.limits())
                    .await
                    .with_context(|| format!("Failed to fetch activity for u/{username}"))?;
                Ok(activity)
            }
            ActivityInput::Dump(path) => {
                let activity = ReportStorage::load_raw(path)
                    .with_context(|| format!("Failed to read activity dump {}", path.display()))?;
                tracing::info!(username = %activity.username, path = %path.display(), "Loaded activity dump");
                Ok(activity)
            }
        }
    }

    /// Runs the pipeline over already loaded activity.
    ///
    /// # Errors
    ///
    /// Fails with `PersonaError::MalformedEvidence` when nothing in the
    /// activity can be cited, and with `PersonaError::ReportUnavailable`
    /// when no category could be inferred.
    pub async fn generate(
        &self,
        activity: &RawActivity,
        cancel: CancellationToken,
    ) -> Result<(PersonaReport, EvidenceStore)> {
        let evidence = EvidenceStore::load_with(
            &activity.posts,
            &activity.comments,
            &self.config.pipeline.normalize_options(),
        )?;
        let definitions = self.config.category_definitions()?;
        let pipeline = PersonaPipeline::new(self.agent.clone(), &self.config.pipeline, definitions)?;

        let report = pipeline
            .run(&evidence, activity.account_metadata(), cancel)
            .await?;
        Ok((report, evidence))
    }

    /// Full run: load, optionally dump, generate, render and write.
    pub async fn run(&self, input: &ActivityInput, cancel: CancellationToken) -> Result<RunSummary> {
        let activity = self.load_activity(input).await?;
        let storage = ReportStorage::new(&self.config.output.dir);

        let raw_path = match input {
            ActivityInput::ProfileUrl(_) if self.config.output.save_raw => {
                Some(storage.save_raw(&activity)?)
            }
            _ => None,
        };

        if cancel.is_cancelled() {
            return Err(PersonaError::Cancelled.into());
        }

        let (report, evidence) = self.generate(&activity, cancel).await?;

        let rendered = render_text(&report, &RenderOptions::new(self.config.output.include_citations))
            .context("Failed to render persona report")?;
        let text_path = storage.save_text(&report.account.username, &rendered)?;
        let json_path = storage.save_json(&report)?;

        Ok(RunSummary {
            username: report.account.username.clone(),
            posts_analyzed: report.account.posts_analyzed,
            comments_analyzed: report.account.comments_analyzed,
            records_dropped: evidence.dropped().total(),
            citations: report.citations.len(),
            degraded: report.degraded_categories(),
            text_path,
            json_path,
            raw_path,
        })
    }
}
