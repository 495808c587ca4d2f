pub mod paths;
pub mod storage;

pub use crate::paths::PersonaPaths;
pub use crate::storage::{ConfigStorage, ReportStorage, SecretStorage};
