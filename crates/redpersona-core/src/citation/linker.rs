//! Citation Linker: global, deduplicated citation numbering for one run.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::marker::rewrite_markers;
use crate::evidence::{EvidenceItem, EvidenceStore, clean::truncate_chars};
use crate::report::{CategoryResult, CitationEntry, CitationMode, ReportSection};

const SNIPPET_CHARS: usize = 100;

#[derive(Debug, Default)]
struct Registry {
    by_evidence_id: HashMap<String, u32>,
    by_url: HashMap<String, u32>,
    entries: Vec<CitationEntry>,
}

impl Registry {
    fn register(&mut self, item: &EvidenceItem) -> u32 {
        if let Some(number) = self.by_evidence_id.get(&item.id) {
            return *number;
        }
        if let Some(number) = self.by_url.get(&item.url).copied() {
            self.by_evidence_id.insert(item.id.clone(), number);
            return number;
        }

        let number = self.entries.len() as u32 + 1;
        self.entries.push(CitationEntry {
            number,
            evidence_id: item.id.clone(),
            url: item.url.clone(),
            kind: item.kind,
            subreddit: item.subreddit.clone(),
            snippet: truncate_chars(&item.title_or_snippet, SNIPPET_CHARS),
        });
        self.by_evidence_id.insert(item.id.clone(), number);
        self.by_url.insert(item.url.clone(), number);
        number
    }
}

/// The single numbering authority of a run.
///
/// Numbers are handed out on first registration, starting at 1. The same
/// evidence id, or another item with the same URL, always gets the same
/// number back. All access is serialized through one lock so numbering has
/// a total order.
#[derive(Debug, Default)]
pub struct CitationLinker {
    registry: Mutex<Registry>,
}

impl CitationLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the global number of `item`, assigning one if needed.
    pub async fn register(&self, item: &EvidenceItem) -> u32 {
        self.registry.lock().await.register(item)
    }

    /// Turns a category result into its report section.
    ///
    /// Local markers are rewritten to global `[n]` numbers. Markers that do
    /// not resolve to a cited item are removed from the text. Implicitly
    /// cited sections get a trailing `Sources:` line so every number they
    /// register appears in their narrative.
    pub async fn resolve(&self, result: &CategoryResult, evidence: &EvidenceStore) -> ReportSection {
        // One lock for the whole section keeps its numbers contiguous.
        let mut registry = self.registry.lock().await;
        let mut numbers: Vec<u32> = Vec::new();

        let cited = |id: &str| result.cited_evidence_ids.iter().any(|c| c == id);

        let mut narrative = rewrite_markers(&result.narrative, |indices| {
            let mut rendered = String::new();
            for local in indices {
                let item = result
                    .legend
                    .resolve(*local)
                    .filter(|&id| result.citation_mode == CitationMode::Explicit && cited(id))
                    .and_then(|id| evidence.get(id));
                match item {
                    Some(item) => {
                        let number = registry.register(item);
                        if !numbers.contains(&number) {
                            numbers.push(number);
                        }
                        rendered.push_str(&format!("[{number}]"));
                    }
                    None => tracing::debug!(
                        category = %result.category,
                        local,
                        "Dropping unresolvable citation marker"
                    ),
                }
            }
            rendered
        });

        if result.citation_mode == CitationMode::Implicit {
            for id in &result.cited_evidence_ids {
                if let Some(item) = evidence.get(id) {
                    let number = registry.register(item);
                    if !numbers.contains(&number) {
                        numbers.push(number);
                    }
                }
            }
            if !numbers.is_empty() {
                let sources = numbers
                    .iter()
                    .map(|n| format!("[{n}]"))
                    .collect::<Vec<_>>()
                    .join(", ");
                narrative = format!("{}\n\nSources: {sources}", narrative.trim_end());
            }
        }

        ReportSection {
            category: result.category,
            title: result.category.name(),
            narrative,
            citation_numbers: numbers,
            cited_evidence_ids: result.cited_evidence_ids.clone(),
            status: result.status,
            citation_mode: result.citation_mode,
        }
    }

    /// Snapshot of the citation list, ordered by number.
    pub async fn citations(&self) -> Vec<CitationEntry> {
        self.registry.lock().await.entries.clone()
    }

    pub async fn len(&self) -> usize {
        self.registry.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
