//! Output files: rendered reports, their JSON form and raw activity dumps.

use std::fs;
use std::path::{Path, PathBuf};

use redpersona_core::error::{PersonaError, Result};
use redpersona_core::report::PersonaReport;
use redpersona_core::source::RawActivity;

use super::atomic::write_atomic;

const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const FALLBACK_FILENAME: &str = "unknown_user";

/// Makes `name` safe to use as a file name on Linux, macOS and Windows.
///
/// Reserved characters and whitespace runs become `_`, runs of dots
/// collapse to one, and an empty result falls back to `unknown_user`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_space = false;
    let mut last_was_dot = false;

    for ch in name.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push('_');
            }
            last_was_space = true;
            last_was_dot = false;
            continue;
        }
        last_was_space = false;

        if ch == '.' {
            if !last_was_dot {
                out.push('.');
            }
            last_was_dot = true;
            continue;
        }
        last_was_dot = false;

        if INVALID_FILENAME_CHARS.contains(&ch) || ch.is_control() {
            out.push('_');
        } else {
            out.push(ch);
        }
    }

    if out.is_empty() || out == "." {
        FALLBACK_FILENAME.to_string()
    } else {
        out
    }
}

/// Writes run outputs below one directory.
///
/// For user `kojied` the files are `kojied_persona.txt`,
/// `kojied_persona.json` and `kojied_raw_data.json`.
pub struct ReportStorage {
    dir: PathBuf,
}

impl ReportStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn text_path(&self, username: &str) -> PathBuf {
        self.dir
            .join(format!("{}_persona.txt", sanitize_filename(username)))
    }

    pub fn json_path(&self, username: &str) -> PathBuf {
        self.dir
            .join(format!("{}_persona.json", sanitize_filename(username)))
    }

    pub fn raw_path(&self, username: &str) -> PathBuf {
        self.dir
            .join(format!("{}_raw_data.json", sanitize_filename(username)))
    }

    /// Writes the rendered report text and returns its path.
    pub fn save_text(&self, username: &str, rendered: &str) -> Result<PathBuf> {
        let path = self.text_path(username);
        write_atomic(&path, rendered.as_bytes())?;
        tracing::info!(path = %path.display(), "Persona report written");
        Ok(path)
    }

    /// Writes the structured report as pretty JSON and returns its path.
    pub fn save_json(&self, report: &PersonaReport) -> Result<PathBuf> {
        let path = self.json_path(&report.account.username);
        let json = serde_json::to_string_pretty(report)?;
        write_atomic(&path, json.as_bytes())?;
        tracing::info!(path = %path.display(), "Persona JSON written");
        Ok(path)
    }

    /// Dumps fetched activity so a run can be repeated offline.
    pub fn save_raw(&self, activity: &RawActivity) -> Result<PathBuf> {
        let path = self.raw_path(&activity.username);
        let json = serde_json::to_string_pretty(activity)?;
        write_atomic(&path, json.as_bytes())?;
        tracing::info!(path = %path.display(), "Raw activity written");
        Ok(path)
    }

    /// Reads a dump written by [`ReportStorage::save_raw`].
    pub fn load_raw(path: &Path) -> Result<RawActivity> {
        if !path.exists() {
            return Err(PersonaError::not_found("activity dump", path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let activity: RawActivity = serde_json::from_str(&content)?;
        if activity.username.trim().is_empty() {
            return Err(PersonaError::data_source(format!(
                "Activity dump {} has no username",
                path.display()
            )));
        }
        Ok(activity)
    }
}
