//! Report domain module: per-category results and the final persona report.

mod model;

pub use model::{
    CategoryResult, CategoryStatus, CitationEntry, CitationMode, DegradeReason, PersonaReport,
    ReportSection,
};
