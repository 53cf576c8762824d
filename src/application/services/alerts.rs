use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::application::error::{bounded, MonitorError};
use crate::domain::analysis::maintenance::{
    failure_horizon, health_recommendation, recommendation_for, severity_factor,
};
use crate::domain::entities::alert::MaintenanceAlert;
use crate::domain::entities::health::HealthScore;
use crate::domain::entities::reading::SensorReading;
use crate::domain::ports::store::{AlertQuery, AlertStore};
use crate::domain::value_objects::alert_lifecycle::{AlertState, AlertType, ResolutionOutcome};
use crate::domain::value_objects::health::RiskLevel;
use crate::domain::value_objects::severity::Severity;

/// Creates, deduplicates and transitions maintenance alerts.
///
/// Creation is expected to run under the owning equipment's serialization
/// lock; lifecycle transitions are serialized here.
pub struct AlertManager {
    store: Arc<dyn AlertStore>,
    store_timeout: Duration,
    transitions: Mutex<()>,
}

impl AlertManager {
    #[must_use]
    pub fn new(store: Arc<dyn AlertStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
            transitions: Mutex::new(()),
        }
    }

    /// Raise a predictive alert for an anomalous reading, unless one is
    /// already active for this equipment.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the alert store fails.
    pub async fn evaluate(
        &self,
        reading: &SensorReading,
        severity: Severity,
    ) -> Result<Option<MaintenanceAlert>, MonitorError> {
        if self
            .has_active(&reading.equipment_id, AlertType::Predictive)
            .await?
        {
            tracing::debug!(
                "Predictive alert already active for {}, {} anomaly suppressed",
                reading.equipment_id,
                reading.sensor
            );
            return Ok(None);
        }

        let now = Utc::now();
        let rec = recommendation_for(reading.sensor);
        let factor = severity_factor(severity);
        let alert = MaintenanceAlert {
            id: uuid::Uuid::new_v4().to_string(),
            equipment_id: reading.equipment_id.clone(),
            alert_type: AlertType::Predictive,
            severity,
            title: format!("Abnormal {} reading", reading.sensor),
            description: format!(
                "{} reported {:.2} {} ({} severity against recent history)",
                reading.sensor,
                reading.value,
                reading.unit(),
                severity.as_str()
            ),
            recommended_action: rec.action.to_string(),
            sensor: Some(reading.sensor),
            predicted_failure_date: Some(reading.timestamp + failure_horizon(severity)),
            estimated_downtime_hours: rec.downtime_hours * factor,
            estimated_cost: rec.cost * factor,
            state: AlertState::Active,
            outcome: None,
            created_at: now,
            acknowledged_at: None,
            resolved_at: None,
        };

        bounded(self.store_timeout, self.store.insert_alert(&alert)).await?;
        tracing::info!(
            "Predictive alert {} raised for {} ({})",
            alert.id,
            alert.equipment_id,
            alert.severity
        );
        Ok(Some(alert))
    }

    /// Raise an inspection (high risk) or emergency (critical risk) alert
    /// from a freshly computed health score, deduplicated per type.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the alert store fails.
    pub async fn evaluate_health(
        &self,
        score: &HealthScore,
    ) -> Result<Option<MaintenanceAlert>, MonitorError> {
        let Some(rec) = health_recommendation(score.risk_level) else {
            return Ok(None);
        };
        let (alert_type, severity) = match score.risk_level {
            RiskLevel::Critical => (AlertType::Emergency, Severity::Critical),
            _ => (AlertType::Inspection, Severity::High),
        };
        if self.has_active(&score.equipment_id, alert_type).await? {
            return Ok(None);
        }

        let alert = MaintenanceAlert {
            id: uuid::Uuid::new_v4().to_string(),
            equipment_id: score.equipment_id.clone(),
            alert_type,
            severity,
            title: format!("Health score at {} risk", score.risk_level),
            description: format!(
                "Overall health {:.0}% (engine {:.0}%, hydraulics {:.0}%, electrical {:.0}%, mechanical {:.0}%), trend {}",
                score.overall_score * 100.0,
                score.components.engine * 100.0,
                score.components.hydraulics * 100.0,
                score.components.electrical * 100.0,
                score.components.mechanical * 100.0,
                score.trend
            ),
            recommended_action: rec.action.to_string(),
            sensor: None,
            predicted_failure_date: Some(score.updated_at + failure_horizon(severity)),
            estimated_downtime_hours: rec.downtime_hours,
            estimated_cost: rec.cost,
            state: AlertState::Active,
            outcome: None,
            created_at: Utc::now(),
            acknowledged_at: None,
            resolved_at: None,
        };

        bounded(self.store_timeout, self.store.insert_alert(&alert)).await?;
        tracing::warn!(
            "{} alert {} raised for {}: health {:.2}",
            alert.alert_type,
            alert.id,
            alert.equipment_id,
            score.overall_score
        );
        Ok(Some(alert))
    }

    /// Move an alert from `active` to `acknowledged`.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::NotFound` for an unknown id,
    /// `MonitorError::StateConflict` if the alert is not active, or
    /// `MonitorError::TransientStore` if the store fails.
    pub async fn acknowledge(&self, alert_id: &str) -> Result<MaintenanceAlert, MonitorError> {
        let _guard = self.transitions.lock().await;
        let mut alert = self.load(alert_id).await?;
        alert.acknowledge(Utc::now()).map_err(|state| {
            MonitorError::StateConflict(format!("alert {alert_id} is already {state}"))
        })?;
        bounded(self.store_timeout, self.store.update_alert(&alert)).await?;
        tracing::info!("Alert {alert_id} acknowledged");
        Ok(alert)
    }

    /// Close an alert, recording how it turned out.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::NotFound` for an unknown id,
    /// `MonitorError::StateConflict` if the alert is already resolved, or
    /// `MonitorError::TransientStore` if the store fails.
    pub async fn resolve(
        &self,
        alert_id: &str,
        outcome: ResolutionOutcome,
    ) -> Result<MaintenanceAlert, MonitorError> {
        let _guard = self.transitions.lock().await;
        let mut alert = self.load(alert_id).await?;
        alert.resolve(outcome, Utc::now()).map_err(|state| {
            MonitorError::StateConflict(format!("alert {alert_id} is already {state}"))
        })?;
        bounded(self.store_timeout, self.store.update_alert(&alert)).await?;
        if outcome == ResolutionOutcome::FalsePositive {
            // Detector tuning hook: nothing consumes this yet beyond the log.
            tracing::info!(
                "Alert {alert_id} marked false positive ({} on {})",
                alert.sensor.map_or("health", |s| s.as_str()),
                alert.equipment_id
            );
        } else {
            tracing::info!("Alert {alert_id} resolved");
        }
        Ok(alert)
    }

    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn active_alerts(
        &self,
        equipment_id: Option<&str>,
    ) -> Result<Vec<MaintenanceAlert>, MonitorError> {
        let mut query = AlertQuery::active();
        query.equipment_id = equipment_id.map(str::to_string);
        self.find(&query).await
    }

    /// Unresolved alerts of critical severity, newest first.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn critical_alerts(&self) -> Result<Vec<MaintenanceAlert>, MonitorError> {
        self.find(&AlertQuery::open().min_severity(Severity::Critical))
            .await
    }

    /// Every unresolved alert, newest first.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn open_alerts(&self) -> Result<Vec<MaintenanceAlert>, MonitorError> {
        self.find(&AlertQuery::open()).await
    }

    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn recent_alerts(&self, limit: usize) -> Result<Vec<MaintenanceAlert>, MonitorError> {
        self.find(&AlertQuery::default().limit(limit)).await
    }

    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn alerts_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MaintenanceAlert>, MonitorError> {
        self.find(&AlertQuery::default().since(since)).await
    }

    /// # Errors
    ///
    /// Returns `MonitorError::NotFound` for an unknown id, or
    /// `MonitorError::TransientStore` if the store fails.
    pub async fn get(&self, alert_id: &str) -> Result<MaintenanceAlert, MonitorError> {
        self.load(alert_id).await
    }

    async fn find(&self, query: &AlertQuery) -> Result<Vec<MaintenanceAlert>, MonitorError> {
        bounded(self.store_timeout, self.store.find_alerts(query)).await
    }

    async fn load(&self, alert_id: &str) -> Result<MaintenanceAlert, MonitorError> {
        bounded(self.store_timeout, self.store.get_alert(alert_id))
            .await?
            .ok_or_else(|| MonitorError::not_found("alert", alert_id))
    }

    async fn has_active(&self, equipment_id: &str, alert_type: AlertType) -> Result<bool, MonitorError> {
        let query = AlertQuery::active()
            .for_equipment(equipment_id)
            .of_type(alert_type)
            .limit(1);
        Ok(!self.find(&query).await?.is_empty())
    }
}
