pub mod persona_service;
pub mod render;

pub use persona_service::{ActivityInput, PersonaService, RunSummary};
pub use render::{RenderOptions, render_text};
