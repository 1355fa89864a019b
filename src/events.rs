//! Audit events
//!
//! The matcher reports each `skip_cla` exemption through an [`EventSink`].
//! Sinks are fire-and-forget: the matcher never looks at a result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;
use tracing::{info, warn};

/// Audit event kinds emitted by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A commit actor bypassed the CLA check through `skip_cla`
    #[serde(rename = "BypassCLA")]
    BypassCla,
}

impl EventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::BypassCla => "BypassCLA",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of a [`EventType::BypassCla`] event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassClaEventData {
    /// Full `org/repo` name
    pub repo: String,
    /// The `skip_cla` value that exempted the actor
    pub config: String,
    /// Actor description
    pub actor: String,
}

impl BypassClaEventData {
    /// One-line summary for audit logs
    pub fn summary(&self) -> String {
        format!(
            "CLA check bypassed for repository {} and actor {} by skip_cla config: {}",
            self.repo, self.actor, self.config
        )
    }
}

/// A single audit event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEventArgs {
    pub event_type: EventType,
    pub event_data: BypassClaEventData,
    pub project_id: String,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

impl LogEventArgs {
    pub fn bypass_cla(data: BypassClaEventData, project_id: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            event_type: EventType::BypassCla,
            event_data: data,
            project_id: project_id.into(),
            timestamp,
        }
    }
}

/// Destination for audit events
pub trait EventSink: Send + Sync {
    fn log_event(&self, event: &LogEventArgs);
}

/// Writes audit events to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn log_event(&self, event: &LogEventArgs) {
        info!(
            target: "skip_cla::audit",
            event_type = %event.event_type,
            project_id = %event.project_id,
            repo = %event.event_data.repo,
            "{}",
            event.event_data.summary()
        );
    }
}

/// Keeps audit events in memory
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<LogEventArgs>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEventArgs>> {
        self.events.lock().unwrap_or_else(|poisoned| {
            warn!("event sink lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Snapshot of recorded events, oldest first
    pub fn events(&self) -> Vec<LogEventArgs> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return all recorded events
    pub fn drain(&self) -> Vec<LogEventArgs> {
        std::mem::take(&mut *self.lock())
    }
}

impl EventSink for RecordingEventSink {
    fn log_event(&self, event: &LogEventArgs) {
        self.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogEventArgs {
        LogEventArgs::bypass_cla(
            BypassClaEventData {
                repo: "acme/widgets".into(),
                config: "dependabot[bot];;".into(),
                actor: "id='1',login='dependabot[bot]',username='(null)',email='(null)'".into(),
            },
            "project-1",
        )
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingEventSink::new();
        assert!(sink.is_empty());

        let mut second = sample();
        second.project_id = "project-2".into();
        sink.log_event(&sample());
        sink.log_event(&second);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].project_id, "project-1");
        assert_eq!(events[1].project_id, "project-2");

        assert_eq!(sink.drain().len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_event_type_serializes_with_platform_name() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["event_type"], "BypassCLA");
        assert_eq!(json["event_data"]["repo"], "acme/widgets");
    }

    #[test]
    fn test_summary_mentions_repo_and_config() {
        let summary = sample().event_data.summary();
        assert!(summary.contains("acme/widgets"));
        assert!(summary.contains("dependabot[bot];;"));
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        TracingEventSink.log_event(&sample());
    }
}
