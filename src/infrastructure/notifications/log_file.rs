use std::io::Write;
use std::path::PathBuf;

use crate::domain::entities::event::AlertEvent;
use crate::domain::ports::notifier::{NotificationError, Notifier};

const DEFAULT_LOG_PATH: &str = "~/.local/share/fleetguard/alerts.jsonl";

/// Appends one JSON object per alert event.
pub struct LogFileNotifier {
    path: PathBuf,
}

impl LogFileNotifier {
    #[must_use]
    pub fn new(path: &str) -> Self {
        let expanded = shellexpand::tilde(path);
        Self {
            path: PathBuf::from(expanded.as_ref()),
        }
    }

    fn append_json_line(&self, value: &serde_json::Value) -> Result<(), NotificationError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NotificationError::SendFailed(format!("cannot create log directory: {e}"))
            })?;
        }

        let json = serde_json::to_string(value)
            .map_err(|e| NotificationError::SendFailed(format!("JSON serialization failed: {e}")))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| NotificationError::SendFailed(format!("cannot open log file: {e}")))?;

        writeln!(file, "{json}")
            .map_err(|e| NotificationError::SendFailed(format!("cannot write log file: {e}")))
    }
}

impl Default for LogFileNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}

impl Notifier for LogFileNotifier {
    fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        let entry = serde_json::to_value(event)
            .map_err(|e| NotificationError::SendFailed(format!("JSON serialization failed: {e}")))?;
        self.append_json_line(&entry)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::domain::entities::alert::sample_alert;
    use crate::domain::entities::event::AlertEventKind;
    use crate::domain::value_objects::severity::Severity;
    use chrono::Utc;

    fn make_event(kind: AlertEventKind, severity: Severity) -> AlertEvent {
        AlertEvent::from_alert(kind, &sample_alert("EQ7", severity), Utc::now())
    }

    #[test]
    fn new_expands_tilde() {
        let notifier = LogFileNotifier::new("~/test/alerts.jsonl");
        let path_str = notifier.path.to_string_lossy();
        assert!(!path_str.starts_with('~'), "tilde should be expanded");
        assert!(path_str.ends_with("test/alerts.jsonl"));
    }

    #[test]
    fn default_uses_standard_path() {
        let notifier = LogFileNotifier::default();
        let path_str = notifier.path.to_string_lossy();
        assert!(path_str.ends_with(".local/share/fleetguard/alerts.jsonl"));
    }

    #[test]
    fn notify_writes_structured_json_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log_path = dir.path().join("alerts.jsonl");
        let notifier = LogFileNotifier {
            path: log_path.clone(),
        };

        let event = make_event(AlertEventKind::Created, Severity::High);
        assert!(notifier.notify(&event).is_ok());

        let content = std::fs::read_to_string(&log_path).expect("read log");
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).expect("parse JSON");
        assert_eq!(parsed["kind"], "alert_created");
        assert_eq!(parsed["severity"], "high");
        assert_eq!(parsed["equipment_id"], "EQ7");
        assert_eq!(parsed["alert_id"], event.alert_id.as_str());
        let ts = parsed["timestamp"].as_str().expect("timestamp str");
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn notify_appends_multiple_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log_path = dir.path().join("deep").join("alerts.jsonl");
        let notifier = LogFileNotifier {
            path: log_path.clone(),
        };

        assert!(notifier
            .notify(&make_event(AlertEventKind::Created, Severity::Low))
            .is_ok());
        assert!(notifier
            .notify(&make_event(AlertEventKind::Resolved, Severity::Critical))
            .is_ok());

        let content = std::fs::read_to_string(&log_path).expect("read log");
        let lines: Vec<&str> = content.trim().lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).expect("parse second");
        assert_eq!(second["kind"], "alert_resolved");
        assert_eq!(second["severity"], "critical");
    }

    #[test]
    fn notify_returns_error_on_invalid_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").expect("create blocker");
        let notifier = LogFileNotifier {
            path: blocker.join("subdir").join("alerts.jsonl"),
        };

        let err = notifier
            .notify(&make_event(AlertEventKind::Created, Severity::Low))
            .expect_err("should be error");
        assert!(
            matches!(err, NotificationError::SendFailed(_)),
            "expected SendFailed, got {err:?}"
        );
    }
}
