//! Citation domain module.
//!
//! - `index`: per-category local legend (`source #k` → evidence id)
//! - `marker`: parsing and rewriting of citation markers in narratives
//! - `linker`: the run-wide numbering authority

mod index;
mod linker;
pub mod marker;

pub use index::CitationIndex;
pub use linker::CitationLinker;
