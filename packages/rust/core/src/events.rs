//! Run progress state and the progress/log event stream.
//!
//! Events are emitted by the orchestrator in completion order, exactly once
//! per source, plus one run-started and one run-finished event. The receiver
//! side is lazy: events buffer in the channel until consumed, and the stream
//! terminates when the run ends and the sender drops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Severity of a progress/log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Success,
    Error,
}

/// One entry of the run's progress/log stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub message: String,
    /// Outcomes recorded so far at emission time.
    pub completed: usize,
    /// Total sources in the batch.
    pub total: usize,
}

/// Consumer end of a run's event stream, handed out once per run.
pub type EventStream = mpsc::UnboundedReceiver<ProgressEvent>;

/// Per-run progress state, owned exclusively by the orchestrator.
///
/// `completed` is monotonically non-decreasing and reaches `total` exactly
/// when the run completes.
#[derive(Debug, Clone, Default)]
pub struct RunProgress {
    pub total: usize,
    pub completed: usize,
    pub current_source: Option<String>,
}

impl RunProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            current_source: None,
        }
    }

    /// Record one more completed source.
    pub fn record(&mut self, source: &str) {
        self.completed += 1;
        self.current_source = Some(source.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_records_monotonically() {
        let mut progress = RunProgress::new(3);
        assert_eq!(progress.completed, 0);

        progress.record("https://example.com/a");
        progress.record("https://example.com/b");

        assert_eq!(progress.completed, 2);
        assert_eq!(progress.current_source.as_deref(), Some("https://example.com/b"));
    }

    #[test]
    fn event_level_serializes_lowercase() {
        let json = serde_json::to_string(&EventLevel::Success).expect("serialize");
        assert_eq!(json, "\"success\"");
    }
}
