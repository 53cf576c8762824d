use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::alert::MaintenanceAlert;
use crate::domain::entities::equipment::{Equipment, EquipmentStatus};
use crate::domain::entities::health::HealthScore;
use crate::domain::entities::reading::SensorReading;
use crate::domain::value_objects::alert_lifecycle::{AlertState, AlertType};
use crate::domain::value_objects::sensor::SensorKind;
use crate::domain::value_objects::severity::Severity;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage read failed: {0}")]
    ReadFailed(String),
    #[error("storage write failed: {0}")]
    WriteFailed(String),
    #[error("entry not found: {0}")]
    NotFound(String),
    #[error("entry already exists: {0}")]
    Duplicate(String),
    #[error("storage call timed out after {0}ms")]
    Timeout(u128),
}

#[async_trait]
pub trait EquipmentStore: Send + Sync {
    /// Register a machine.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the id is taken, or another
    /// `StoreError` if the write fails.
    async fn insert_equipment(&self, equipment: &Equipment) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    async fn get_equipment(&self, id: &str) -> Result<Option<Equipment>, StoreError>;

    /// List machines in registration order, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    async fn list_equipment(
        &self,
        status: Option<EquipmentStatus>,
    ) -> Result<Vec<Equipment>, StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown id, or another
    /// `StoreError` if the write fails.
    async fn update_equipment_status(
        &self,
        id: &str,
        status: EquipmentStatus,
    ) -> Result<(), StoreError>;
}

/// Append-only telemetry buffer, totally ordered per equipment.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StoreError` if the write operation fails.
    async fn append_reading(&self, reading: &SensorReading) -> Result<(), StoreError>;

    /// Most recent readings for one machine, newest first, in append order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    async fn recent_readings(
        &self,
        equipment_id: &str,
        sensor: Option<SensorKind>,
        limit: usize,
    ) -> Result<Vec<SensorReading>, StoreError>;

    /// Drop readings captured before `cutoff`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the delete fails.
    async fn purge_readings_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// Current health score per machine (upsert semantics).
#[async_trait]
pub trait HealthStore: Send + Sync {
    /// Replace the machine's score as one value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write operation fails.
    async fn upsert_health(&self, score: &HealthScore) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    async fn get_health(&self, equipment_id: &str) -> Result<Option<HealthScore>, StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    async fn list_health(&self) -> Result<Vec<HealthScore>, StoreError>;
}

/// Filter for alert lookups. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertQuery {
    pub equipment_id: Option<String>,
    pub alert_type: Option<AlertType>,
    pub states: Vec<AlertState>,
    pub min_severity: Option<Severity>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AlertQuery {
    #[must_use]
    pub fn open() -> Self {
        Self {
            states: vec![AlertState::Active, AlertState::Acknowledged],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn active() -> Self {
        Self {
            states: vec![AlertState::Active],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_equipment(mut self, equipment_id: impl Into<String>) -> Self {
        self.equipment_id = Some(equipment_id.into());
        self
    }

    #[must_use]
    pub const fn of_type(mut self, alert_type: AlertType) -> Self {
        self.alert_type = Some(alert_type);
        self
    }

    #[must_use]
    pub const fn min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    #[must_use]
    pub const fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an alert satisfies every field except `limit`.
    #[must_use]
    pub fn matches(&self, alert: &MaintenanceAlert) -> bool {
        self.equipment_id
            .as_deref()
            .is_none_or(|id| alert.equipment_id == id)
            && self.alert_type.is_none_or(|t| alert.alert_type == t)
            && (self.states.is_empty() || self.states.contains(&alert.state))
            && self.min_severity.is_none_or(|s| alert.severity >= s)
            && self.since.is_none_or(|since| alert.created_at >= since)
    }
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StoreError` if the write operation fails.
    async fn insert_alert(&self, alert: &MaintenanceAlert) -> Result<(), StoreError>;

    /// Replace a stored alert with the same id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown id, or another
    /// `StoreError` if the write fails.
    async fn update_alert(&self, alert: &MaintenanceAlert) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    async fn get_alert(&self, id: &str) -> Result<Option<MaintenanceAlert>, StoreError>;

    /// Alerts matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    async fn find_alerts(&self, query: &AlertQuery) -> Result<Vec<MaintenanceAlert>, StoreError>;
}
