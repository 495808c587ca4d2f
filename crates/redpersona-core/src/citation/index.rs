use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceItem;

/// The legend of one category's inference call: local index `k` (1-based)
/// stands for the `k`-th evidence item shown in the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationIndex {
    evidence_ids: Vec<String>,
}

impl CitationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item and returns its local index.
    pub fn push(&mut self, item: &EvidenceItem) -> usize {
        self.evidence_ids.push(item.id.clone());
        self.evidence_ids.len()
    }

    /// Evidence id behind a local index, if that index was shown.
    pub fn resolve(&self, local: usize) -> Option<&str> {
        local
            .checked_sub(1)
            .and_then(|idx| self.evidence_ids.get(idx))
            .map(String::as_str)
    }

    pub fn contains_id(&self, evidence_id: &str) -> bool {
        self.evidence_ids.iter().any(|id| id == evidence_id)
    }

    /// Shown evidence ids in legend order.
    pub fn evidence_ids(&self) -> &[String] {
        &self.evidence_ids
    }

    pub fn len(&self) -> usize {
        self.evidence_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evidence_ids.is_empty()
    }
}

impl FromIterator<String> for CitationIndex {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            evidence_ids: iter.into_iter().collect(),
        }
    }
}
