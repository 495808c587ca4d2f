//! Domain layer of redpersona.
//!
//! Holds the evidence model and Evidence Store, persona categories with
//! their evidence selectors, the citation protocol and numbering authority,
//! the report model, configuration, and the two collaborator seams
//! (`InferenceAgent`, `ActivitySource`). Nothing here performs I/O.

pub mod account;
pub mod agent;
pub mod category;
pub mod citation;
pub mod config;
pub mod error;
pub mod evidence;
pub mod report;
pub mod source;

// Re-export common error type
pub use error::PersonaError;
