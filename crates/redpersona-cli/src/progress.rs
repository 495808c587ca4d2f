//! Colored per-category progress lines for `--verbose`.

use colored::Colorize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use redpersona_execution::PipelineEvent;

/// Prints progress until `done` fires, then flushes what is still queued.
pub fn spawn_printer(
    mut events: UnboundedReceiver<PipelineEvent>,
    done: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = events.recv() => print_line(&event),
                _ = done.cancelled() => {
                    while let Ok(event) = events.try_recv() {
                        print_line(&event);
                    }
                    break;
                }
            }
        }
    })
}

fn print_line(event: &PipelineEvent) {
    if let Some(line) = progress_line(event) {
        println!("{line}");
    }
}

fn progress_line(event: &PipelineEvent) -> Option<String> {
    let category = event.category();
    let line = match (event.message.as_str(), category) {
        ("Fetched public activity", _) => format!(
            "{} fetched {} posts and {} comments",
            "•".cyan(),
            event.field_u64("posts").unwrap_or_default(),
            event.field_u64("comments").unwrap_or_default()
        ),
        ("Starting inference", Some(name)) => format!(
            "{} {name}: analyzing {} items",
            "→".cyan(),
            event.field_u64("shown").unwrap_or_default()
        ),
        ("Category inferred", Some(name)) => format!(
            "{} {name}: {} sources cited",
            "✓".green(),
            event.field_u64("cited").unwrap_or_default()
        ),
        ("No evidence selected, skipping inference", Some(name)) => {
            format!("{} {name}: not enough evidence", "!".yellow())
        }
        ("Inference failed after retries" | "Inference request rejected", Some(name)) => format!(
            "{} {name}: {}",
            "✗".red(),
            event.message.to_lowercase()
        ),
        ("Run deadline exceeded, cancelling", _) => {
            format!("{} run deadline exceeded", "✗".red())
        }
        _ => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    fn event(message: &str, fields: &[(&str, serde_json::Value)], category: Option<&str>) -> PipelineEvent {
        let mut span = HashMap::new();
        if let Some(category) = category {
            span.insert("category".to_string(), json!(category));
        }
        PipelineEvent {
            target: "redpersona_execution::orchestrator".into(),
            level: "INFO".into(),
            message: message.into(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            span,
            timestamp: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_progress_lines() {
        colored::control::set_override(false);

        let inferred = event("Category inferred", &[("cited", json!(3))], Some("Demographics"));
        assert_eq!(
            progress_line(&inferred).as_deref(),
            Some("✓ Demographics: 3 sources cited")
        );

        let rejected = event("Inference request rejected", &[], Some("Motivations & Goals"));
        assert_eq!(
            progress_line(&rejected).as_deref(),
            Some("✗ Motivations & Goals: inference request rejected")
        );
    }

    #[test]
    fn test_unrelated_events_are_skipped() {
        assert!(progress_line(&event("Calling inference agent", &[], Some("Demographics"))).is_none());
        assert!(progress_line(&event("Category inferred", &[], None)).is_none());
    }
}
