use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alert::MaintenanceAlert;
use crate::domain::value_objects::alert_lifecycle::{AlertState, AlertType};
use crate::domain::value_objects::severity::Severity;

/// Alert lifecycle change broadcast to notification relays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AlertEventKind {
    #[serde(rename = "alert_created")]
    Created,
    #[serde(rename = "alert_acknowledged")]
    Acknowledged,
    #[serde(rename = "alert_resolved")]
    Resolved,
}

impl std::fmt::Display for AlertEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "alert_created"),
            Self::Acknowledged => write!(f, "alert_acknowledged"),
            Self::Resolved => write!(f, "alert_resolved"),
        }
    }
}

/// Structured payload relayed to the notification layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertEventKind,
    pub alert_id: String,
    pub equipment_id: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub state: AlertState,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    #[must_use]
    pub fn from_alert(kind: AlertEventKind, alert: &MaintenanceAlert, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            alert_id: alert.id.clone(),
            equipment_id: alert.equipment_id.clone(),
            severity: alert.severity,
            alert_type: alert.alert_type,
            state: alert.state,
            title: alert.title.clone(),
            timestamp,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::alert::sample_alert;

    #[test]
    fn payload_uses_notification_field_names() {
        let alert = sample_alert("EQ9", Severity::Critical);
        let event = AlertEvent::from_alert(AlertEventKind::Created, &alert, Utc::now());
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["kind"], "alert_created");
        assert_eq!(json["type"], "predictive");
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["state"], "active");
        assert_eq!(json["equipment_id"], "EQ9");
    }
}
