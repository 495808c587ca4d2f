//! Persona categories and the Bucketizer.

mod model;
mod selector;

pub use model::{Category, CategoryDefinition};
pub use selector::EvidenceSelector;
