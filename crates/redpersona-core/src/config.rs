//! Configuration model (`config.toml` and `secret.json`).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::category::{Category, CategoryDefinition, EvidenceSelector};
use crate::error::{PersonaError, Result};
use crate::evidence::NormalizeOptions;
use crate::source::FetchLimits;

const MAX_CALL_TIMEOUT_SECS: u64 = 600;

/// What to cite when a response carries no usable citation markers.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CitationFallback {
    /// Cite every item shown to the category
    #[default]
    CiteShownSubset,
    /// Cite nothing; the section carries no sources
    CiteNothing,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    pub max_posts: usize,
    pub max_comments: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_posts: 10,
            max_comments: 15,
            user_agent: concat!("redpersona/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn limits(&self) -> FetchLimits {
        FetchLimits {
            max_posts: self.max_posts,
            max_comments: self.max_comments,
        }
    }
}

/// Tuning of the inference pipeline.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub call_timeout_secs: u64,
    /// Deadline for all categories together
    pub run_timeout_secs: Option<u64>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Characters of each evidence item shown in a prompt
    pub snippet_chars: usize,
    /// Budget for the rendered evidence legend of one prompt
    pub max_prompt_chars: usize,
    pub citation_fallback: CitationFallback,
    /// Posts and comments with less cleaned text than this are dropped
    pub min_content_length: usize,
    /// Tag every item with a keyword sentiment shown in prompts
    pub analyze_sentiment: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 4_000,
            call_timeout_secs: 60,
            run_timeout_secs: None,
            max_tokens: 1_000,
            temperature: 0.7,
            snippet_chars: 400,
            max_prompt_chars: 6_000,
            citation_fallback: CitationFallback::default(),
            min_content_length: 10,
            analyze_sentiment: true,
        }
    }
}

impl PipelineConfig {
    /// Per-call timeout, clamped to 1..=600 seconds.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.clamp(1, MAX_CALL_TIMEOUT_SECS))
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms))
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            min_content_length: self.min_content_length,
            analyze_sentiment: self.analyze_sentiment,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub include_citations: bool,
    /// Also write the fetched activity as a JSON dump
    pub save_raw: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./output"),
            include_citations: true,
            save_raw: false,
        }
    }
}

/// Per-category overrides, keyed by category slug.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<EvidenceSelector>,
}

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ConfigRoot {
    pub fetch: FetchConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
    pub categories: BTreeMap<String, CategoryOverride>,
}

impl ConfigRoot {
    /// Category definitions in processing order with overrides applied.
    ///
    /// # Errors
    ///
    /// `PersonaError::Config` for an override keyed by an unknown category.
    pub fn category_definitions(&self) -> Result<Vec<CategoryDefinition>> {
        if let Some(unknown) = self
            .categories
            .keys()
            .find(|slug| Category::from_slug(slug).is_none())
        {
            return Err(PersonaError::config(format!("Unknown category '{unknown}'")));
        }

        Ok(Category::ordered()
            .into_iter()
            .map(|category| {
                let definition = CategoryDefinition::new(category);
                match self
                    .categories
                    .get(category.slug())
                    .and_then(|o| o.selector)
                {
                    Some(selector) => definition.with_selector(selector),
                    None => definition,
                }
            })
            .collect())
    }
}

/// OpenAI credentials.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

/// Root of `secret.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAIConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: ConfigRoot = toml::from_str("").unwrap();
        assert_eq!(config, ConfigRoot::default());
        assert_eq!(config.pipeline.max_retries, 2);
        assert_eq!(config.fetch.max_comments, 15);
    }

    #[test]
    fn test_partial_toml() {
        let config: ConfigRoot = toml::from_str(
            r#"
[pipeline]
max_retries = 4
citation_fallback = "cite_nothing"

[categories.personality_traits]
selector = "all"

[categories.motivations_and_goals]
selector = "top_by_score:5"
"#,
        )
        .unwrap();

        assert_eq!(config.pipeline.max_retries, 4);
        assert_eq!(config.pipeline.call_timeout_secs, 60);
        assert_eq!(config.pipeline.citation_fallback, CitationFallback::CiteNothing);

        let defs = config.category_definitions().unwrap();
        assert_eq!(defs[1].category, Category::PersonalityTraits);
        assert_eq!(defs[1].selector, EvidenceSelector::All);
        assert_eq!(defs[4].selector, EvidenceSelector::TopByScore(5));
        assert_eq!(defs[0].selector, EvidenceSelector::All);
    }

    #[test]
    fn test_normalize_options_from_pipeline() {
        let config: ConfigRoot = toml::from_str(
            "[pipeline]\nmin_content_length = 25\nanalyze_sentiment = false\n",
        )
        .unwrap();

        let options = config.pipeline.normalize_options();
        assert_eq!(options.min_content_length, 25);
        assert!(!options.analyze_sentiment);
        assert_eq!(
            ConfigRoot::default().pipeline.normalize_options(),
            NormalizeOptions::default()
        );
    }

    #[test]
    fn test_unknown_category_override() {
        let config: ConfigRoot =
            toml::from_str("[categories.astrology]\nselector = \"all\"\n").unwrap();
        assert!(config.category_definitions().is_err());
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let result = toml::from_str::<ConfigRoot>("[categories.demographics]\nselector = \"newest\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_call_timeout_is_clamped() {
        let config = PipelineConfig {
            call_timeout_secs: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(config.call_timeout(), Duration::from_secs(1));

        let config = PipelineConfig {
            call_timeout_secs: 10_000,
            ..PipelineConfig::default()
        };
        assert_eq!(config.call_timeout(), Duration::from_secs(600));
    }
}
