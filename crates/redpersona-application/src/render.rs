//! Plain-text rendering of a persona report.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use minijinja::{Environment, context};
use regex::Regex;
use serde::Serialize;

use redpersona_core::account::describe_age;
use redpersona_core::report::{CategoryStatus, CitationMode, PersonaReport, ReportSection};

static CITATION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\[\d+\]").expect("valid citation number pattern"));

const RULE_WIDTH: usize = 80;
const MAX_LISTED_SUBREDDITS: usize = 10;

const REPORT_TEMPLATE: &str = r#"{{ rule }}
USER PERSONA: {{ username }}
{{ rule }}

Generated on: {{ generated_at }}
Analysis based on {{ posts }} posts and {{ comments }} comments

{{ rule }}
BASIC INFORMATION
{{ rule }}

Username: {{ username }}
Account Age: {{ account_age }}
Post Karma: {{ link_karma }}
Comment Karma: {{ comment_karma }}
Active Subreddits: {{ subreddits }}

{{ rule }}
ACTIVITY
{{ rule }}

Posts Analyzed: {{ posts }} (average score {{ avg_post_score }})
Comments Analyzed: {{ comments }} (average score {{ avg_comment_score }})
Subreddit Diversity: {{ diversity }}
{% if top_subreddits %}
Most Active Communities:
{% for sub in top_subreddits %}
  r/{{ sub.name }}: {{ sub.count }} ({{ sub.topic }}) - {{ sub.description }}
{% endfor %}
{% endif %}
{% for section in sections %}

{{ rule }}
{{ section.title }}
{{ rule }}

{% if section.note %}
[{{ section.note }}]

{% endif %}
{{ section.narrative }}
{% endfor %}
{% if citations %}

{{ rule }}
CITATIONS & SOURCES
{{ rule }}

{% for c in citations %}
[{{ c.number }}] {{ c.kind }}: {{ c.snippet }}
    URL: {{ c.url }}
    Subreddit: r/{{ c.subreddit }}

{% endfor %}
{% endif %}

{{ rule }}
DISCLAIMER
{{ rule }}

This persona is generated from publicly available Reddit activity and should be
used for research and educational purposes only. It reflects patterns observed
in the user's online behavior and may not describe their complete personality
or circumstances.

Generation completed at: {{ generated_at }}
"#;

/// Rendering switches.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Keep `[n]` markers and print the citation list
    pub include_citations: bool,
    /// Stamped into the header and footer; also the reference point for the
    /// account age
    pub generated_at: DateTime<Utc>,
}

impl RenderOptions {
    pub fn new(include_citations: bool) -> Self {
        Self {
            include_citations,
            generated_at: Utc::now(),
        }
    }
}

#[derive(Serialize)]
struct SectionView {
    title: String,
    note: Option<String>,
    narrative: String,
}

#[derive(Serialize)]
struct SubredditView<'a> {
    name: &'a str,
    count: usize,
    topic: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct CitationView<'a> {
    number: u32,
    kind: String,
    snippet: &'a str,
    url: &'a str,
    subreddit: &'a str,
}

/// Renders `report` as the plain-text persona document.
pub fn render_text(report: &PersonaReport, options: &RenderOptions) -> anyhow::Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("report.txt", REPORT_TEMPLATE)?;

    let account = &report.account;
    let stats = &report.statistics;

    let account_age = account
        .account_age_days(options.generated_at)
        .map(describe_age)
        .unwrap_or_else(|| "Unknown".to_string());

    let subreddits = if account.active_subreddits.is_empty() {
        "None".to_string()
    } else {
        account
            .active_subreddits
            .iter()
            .take(MAX_LISTED_SUBREDDITS)
            .map(|s| format!("r/{s}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let sections: Vec<SectionView> = report
        .sections
        .iter()
        .map(|section| SectionView {
            title: section.title.to_uppercase(),
            note: match section.status {
                CategoryStatus::Inferred => None,
                status => Some(status.label()),
            },
            narrative: if options.include_citations {
                section.narrative.clone()
            } else {
                strip_citations(section)
            },
        })
        .collect();

    let citations: Vec<CitationView> = if options.include_citations {
        report
            .citations
            .iter()
            .map(|c| CitationView {
                number: c.number,
                kind: c.kind.label().to_uppercase(),
                snippet: &c.snippet,
                url: &c.url,
                subreddit: &c.subreddit,
            })
            .collect()
    } else {
        Vec::new()
    };

    let top_subreddits: Vec<SubredditView> = stats
        .top_subreddits
        .iter()
        .map(|s| SubredditView {
            name: &s.name,
            count: s.count,
            topic: &s.topic,
            description: &s.description,
        })
        .collect();

    let rendered = env.get_template("report.txt")?.render(context! {
        rule => "=".repeat(RULE_WIDTH),
        username => &account.username,
        generated_at => options.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        posts => account.posts_analyzed,
        comments => account.comments_analyzed,
        account_age => account_age,
        link_karma => account.link_karma,
        comment_karma => account.comment_karma,
        subreddits => subreddits,
        avg_post_score => format!("{:.1}", stats.average_post_score),
        avg_comment_score => format!("{:.1}", stats.average_comment_score),
        diversity => stats.subreddit_diversity,
        top_subreddits => top_subreddits,
        sections => sections,
        citations => citations,
    })?;

    Ok(rendered)
}

/// Removes `[n]` markers, and for implicitly cited sections the `Sources:`
/// paragraph appended by the linker. Text the model wrote is kept.
fn strip_citations(section: &ReportSection) -> String {
    let narrative = match section.citation_mode {
        CitationMode::Implicit => section
            .narrative
            .rsplit_once("\n\nSources: ")
            .map_or(section.narrative.as_str(), |(body, _)| body),
        CitationMode::Explicit | CitationMode::Uncited => section.narrative.as_str(),
    };
    CITATION_NUMBER
        .replace_all(narrative.trim_end(), "")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use redpersona_core::category::Category;

    fn section(narrative: &str, citation_mode: CitationMode) -> ReportSection {
        ReportSection {
            category: Category::InterestsAndHobbies,
            title: Category::InterestsAndHobbies.name(),
            narrative: narrative.to_string(),
            citation_numbers: vec![1, 2],
            cited_evidence_ids: vec!["p1".into(), "c1".into()],
            status: CategoryStatus::Inferred,
            citation_mode,
        }
    }

    #[test]
    fn test_strip_citations() {
        let implicit = section(
            "Enjoys hiking and running.\n\nSources: [1], [2]",
            CitationMode::Implicit,
        );
        assert_eq!(strip_citations(&implicit), "Enjoys hiking and running.");

        let explicit = section("Enjoys hiking [1] and running [2][3].", CitationMode::Explicit);
        assert_eq!(strip_citations(&explicit), "Enjoys hiking and running.");
    }

    #[test]
    fn test_strip_citations_keeps_written_sources_line() {
        let explicit = section(
            "Reads a lot [1].\nSources: mostly library books, per the user.",
            CitationMode::Explicit,
        );
        assert_eq!(
            strip_citations(&explicit),
            "Reads a lot.\nSources: mostly library books, per the user."
        );

        let implicit = section(
            "Sources: family and friends shape their taste.\n\nSources: [1]",
            CitationMode::Implicit,
        );
        assert_eq!(
            strip_citations(&implicit),
            "Sources: family and friends shape their taste."
        );
    }
}
