//! File-backed storage for configuration, secrets and run outputs.

mod atomic;
mod config_storage;
mod report_storage;
mod secret_storage;

pub use atomic::write_atomic;
pub use config_storage::{ConfigStorage, ConfigStorageError};
pub use report_storage::{ReportStorage, sanitize_filename};
pub use secret_storage::{SecretStorage, SecretStorageError};
