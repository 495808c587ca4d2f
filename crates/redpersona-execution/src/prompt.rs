//! Prompt construction for one category.
//!
//! Each selected evidence item is shown under a local `[source #k]` label.
//! The labels shown to the model become the category's `CitationIndex`, so
//! anything the model cites can be traced back to an evidence id.

use minijinja::{Environment, context};
use serde::Serialize;

use redpersona_core::agent::InferenceRequest;
use redpersona_core::category::Category;
use redpersona_core::citation::CitationIndex;
use redpersona_core::config::PipelineConfig;
use redpersona_core::error::{PersonaError, Result};
use redpersona_core::evidence::EvidenceItem;
use redpersona_core::evidence::clean::truncate_chars;

const CATEGORY_TEMPLATE: &str = "category";

const CATEGORY_PROMPT: &str = r#"{{ goal }}

{% if subreddits %}
Communities the user is active in: {{ subreddits | join(", ") }}

{% endif %}
Evidence ({{ entries | length }} of {{ total }} items):

{% for entry in entries %}
[source #{{ entry.index }}] {{ entry.header }}
{{ entry.text }}

{% endfor %}
Write a concise analysis of the user's {{ category }} in a few short paragraphs.
Support each claim by citing the evidence it rests on as [source #N], where N is the number shown above. Several items can be cited together as [sources #1, #3].
Only cite numbers listed above. Leave out anything the evidence does not support.
"#;

/// Maximum number of communities listed as context.
const MAX_CONTEXT_SUBREDDITS: usize = 10;

#[derive(Debug, Serialize)]
struct LegendEntry {
    index: usize,
    header: String,
    text: String,
}

impl LegendEntry {
    fn new(index: usize, item: &EvidenceItem, snippet_chars: usize) -> Self {
        let tone = item
            .sentiment
            .map(|sentiment| format!(", {sentiment} tone"))
            .unwrap_or_default();
        let mut header = format!(
            "{} in r/{} (score {}, {}{tone})",
            item.kind.label(),
            item.subreddit,
            item.score,
            item.created_at.format("%Y-%m-%d"),
        );
        if let Some(parent) = &item.parent_title {
            header.push_str(&format!(" replying to \"{}\"", truncate_chars(parent, 80)));
        }

        Self {
            index,
            header,
            text: truncate_chars(&item.full_text(), snippet_chars),
        }
    }

    fn rendered_len(&self) -> usize {
        self.header.chars().count() + self.text.chars().count()
    }
}

/// Renders bounded category prompts.
pub struct PromptBuilder {
    env: Environment<'static>,
    max_tokens: u32,
    temperature: f32,
    snippet_chars: usize,
    max_prompt_chars: usize,
}

impl PromptBuilder {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template(CATEGORY_TEMPLATE, CATEGORY_PROMPT)
            .map_err(|e| PersonaError::internal(format!("Invalid prompt template: {e}")))?;

        Ok(Self {
            env,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            snippet_chars: config.snippet_chars.max(1),
            max_prompt_chars: config.max_prompt_chars,
        })
    }

    /// Builds the request for `category` over `selected`.
    ///
    /// Items are shown in the given order until the legend budget is spent;
    /// the first item is always shown. Only shown items enter the returned
    /// legend.
    pub fn build(
        &self,
        category: Category,
        selected: &[EvidenceItem],
        subreddits: &[String],
    ) -> Result<(InferenceRequest, CitationIndex)> {
        let mut legend = CitationIndex::new();
        let mut entries = Vec::new();
        let mut used = 0usize;

        for item in selected {
            let entry = LegendEntry::new(legend.len() + 1, item, self.snippet_chars);
            let cost = entry.rendered_len();
            if !entries.is_empty() && used + cost > self.max_prompt_chars {
                break;
            }
            used += cost;
            legend.push(item);
            entries.push(entry);
        }

        if entries.len() < selected.len() {
            tracing::debug!(
                category = %category,
                shown = entries.len(),
                selected = selected.len(),
                "Prompt budget reached; remaining evidence not shown"
            );
        }

        let subreddits: Vec<&str> = if category.wants_subreddit_context() {
            subreddits
                .iter()
                .take(MAX_CONTEXT_SUBREDDITS)
                .map(String::as_str)
                .collect()
        } else {
            Vec::new()
        };

        let template = self
            .env
            .get_template(CATEGORY_TEMPLATE)
            .map_err(|e| PersonaError::internal(format!("Missing prompt template: {e}")))?;
        let prompt = template
            .render(context! {
                goal => category.goal_description(),
                category => category.name().to_lowercase(),
                subreddits => subreddits,
                entries => entries,
                total => selected.len(),
            })
            .map_err(|e| PersonaError::internal(format!("Failed to render prompt: {e}")))?;

        let request = InferenceRequest {
            system: category.system_prompt().to_string(),
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        Ok((request, legend))
    }
}
