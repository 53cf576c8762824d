use std::borrow::Cow;

use colored::Colorize;

use crate::domain::entities::event::{AlertEvent, AlertEventKind};
use crate::domain::ports::notifier::{NotificationError, Notifier};
use crate::domain::value_objects::severity::Severity;

const SEPARATOR_WIDTH: usize = 70;

/// Prints alert lifecycle events to stdout.
pub struct TerminalNotifier {
    /// Only creations at or above this severity are printed; lifecycle
    /// transitions always are.
    min_severity: Severity,
}

impl TerminalNotifier {
    #[must_use]
    pub const fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new(Severity::Low)
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
        match event.kind {
            AlertEventKind::Created => {
                if event.severity < self.min_severity {
                    return Ok(());
                }
                let separator = "\u{2500}".repeat(SEPARATOR_WIDTH);
                println!("\n{}", separator.dimmed());
                println!(
                    "{} {}",
                    severity_badge(event.severity),
                    sanitize(&event.title).bold()
                );
                println!(
                    "  {} {}  {} {}  {}",
                    "equipment:".dimmed(),
                    sanitize(&event.equipment_id),
                    "type:".dimmed(),
                    event.alert_type,
                    event.alert_id.dimmed()
                );
                println!("{}\n", separator.dimmed());
            }
            AlertEventKind::Acknowledged => {
                println!(
                    "{} {} ({})",
                    "\u{2713} acknowledged".cyan(),
                    event.alert_id,
                    sanitize(&event.equipment_id)
                );
            }
            AlertEventKind::Resolved => {
                println!(
                    "{} {} ({})",
                    "\u{2714} resolved".green(),
                    event.alert_id,
                    sanitize(&event.equipment_id)
                );
            }
        }
        Ok(())
    }
}

/// Strip ANSI escape sequences and C0/C1 control characters from a string,
/// preserving only printable content, newlines, and tabs.
pub(crate) fn sanitize(s: &str) -> Cow<'_, str> {
    if s.bytes()
        .any(|b| matches!(b, 0x00..=0x08 | 0x0B..=0x0C | 0x0E..=0x1F | 0x7F))
    {
        Cow::Owned(
            s.chars()
                .filter(|&c| !matches!(c as u32, 0x00..=0x08 | 0x0B..=0x0C | 0x0E..=0x1F | 0x7F))
                .collect(),
        )
    } else {
        Cow::Borrowed(s)
    }
}

#[must_use]
pub(crate) fn severity_badge(severity: Severity) -> String {
    match severity {
        Severity::Critical => format!(" {} {} ", severity.emoji(), severity)
            .on_red()
            .white()
            .bold()
            .to_string(),
        Severity::High => format!(" {} {} ", severity.emoji(), severity)
            .on_yellow()
            .black()
            .bold()
            .to_string(),
        Severity::Medium => format!(" {} {} ", severity.emoji(), severity)
            .on_bright_yellow()
            .black()
            .to_string(),
        Severity::Low => format!(" {} {} ", severity.emoji(), severity)
            .on_blue()
            .white()
            .to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::alert::sample_alert;
    use chrono::Utc;

    fn disable_colors() {
        colored::control::set_override(false);
    }

    fn make_event(kind: AlertEventKind, severity: Severity) -> AlertEvent {
        AlertEvent::from_alert(kind, &sample_alert("EQ1", severity), Utc::now())
    }

    #[test]
    fn every_kind_and_severity_prints() {
        disable_colors();
        let notifier = TerminalNotifier::default();
        for kind in [
            AlertEventKind::Created,
            AlertEventKind::Acknowledged,
            AlertEventKind::Resolved,
        ] {
            for severity in [
                Severity::Low,
                Severity::Medium,
                Severity::High,
                Severity::Critical,
            ] {
                assert!(notifier.notify(&make_event(kind, severity)).is_ok());
            }
        }
    }

    #[test]
    fn below_threshold_creation_is_skipped() {
        disable_colors();
        let notifier = TerminalNotifier::new(Severity::High);
        assert!(notifier
            .notify(&make_event(AlertEventKind::Created, Severity::Low))
            .is_ok());
    }

    #[test]
    fn severity_badge_returns_non_empty() {
        disable_colors();
        for severity in [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            let badge = severity_badge(severity);
            assert!(badge.contains(&severity.to_string()));
        }
    }

    #[test]
    fn sanitize_strips_control_characters() {
        let input = "hello\x1b[2Jworld\x07done";
        let result = sanitize(input);
        assert_eq!(result, "hello[2Jworlddone");
    }

    #[test]
    fn sanitize_preserves_clean_strings() {
        let input = "clean string with\nnewlines\tand tabs \u{1f6a8}";
        let result = sanitize(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }
}
