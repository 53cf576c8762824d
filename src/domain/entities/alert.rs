use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::alert_lifecycle::{AlertState, AlertType, ResolutionOutcome};
use crate::domain::value_objects::sensor::SensorKind;
use crate::domain::value_objects::severity::Severity;

/// A maintenance alert raised for one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceAlert {
    pub id: String,
    pub equipment_id: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommended_action: String,
    /// Sensor that triggered a predictive alert.
    pub sensor: Option<SensorKind>,
    pub predicted_failure_date: Option<DateTime<Utc>>,
    pub estimated_downtime_hours: f64,
    pub estimated_cost: f64,
    pub state: AlertState,
    pub outcome: Option<ResolutionOutcome>,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl MaintenanceAlert {
    /// Move `Active -> Acknowledged`.
    ///
    /// # Errors
    ///
    /// Returns the current state when the alert is not active.
    pub fn acknowledge(&mut self, at: DateTime<Utc>) -> Result<(), AlertState> {
        if !self.state.can_acknowledge() {
            return Err(self.state);
        }
        self.state = AlertState::Acknowledged;
        self.acknowledged_at = Some(at);
        Ok(())
    }

    /// Move `Active | Acknowledged -> Resolved`, recording the outcome.
    ///
    /// # Errors
    ///
    /// Returns the current state when the alert is already resolved.
    pub fn resolve(&mut self, outcome: ResolutionOutcome, at: DateTime<Utc>) -> Result<(), AlertState> {
        if !self.state.can_resolve() {
            return Err(self.state);
        }
        self.state = AlertState::Resolved;
        self.outcome = Some(outcome);
        self.resolved_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_alert(equipment_id: &str, severity: Severity) -> MaintenanceAlert {
    MaintenanceAlert {
        id: uuid::Uuid::new_v4().to_string(),
        equipment_id: equipment_id.to_string(),
        alert_type: AlertType::Predictive,
        severity,
        title: "Temperature anomaly".to_string(),
        description: "Temperature reading deviates from recent history".to_string(),
        recommended_action: "Inspect cooling system".to_string(),
        sensor: Some(SensorKind::Temperature),
        predicted_failure_date: None,
        estimated_downtime_hours: 4.0,
        estimated_cost: 1200.0,
        state: AlertState::Active,
        outcome: None,
        created_at: Utc::now(),
        acknowledged_at: None,
        resolved_at: None,
    }
}
