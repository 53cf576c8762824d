use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::alert::MaintenanceAlert;
use crate::domain::entities::equipment::{Equipment, EquipmentStatus};
use crate::domain::entities::health::HealthScore;
use crate::domain::entities::reading::SensorReading;
use crate::domain::ports::store::{
    AlertQuery, AlertStore, EquipmentStore, HealthStore, ReadingStore, StoreError,
};
use crate::domain::value_objects::sensor::SensorKind;

/// In-memory store for tests and ephemeral runs.
pub struct InMemoryStore {
    equipment: Mutex<Vec<Equipment>>,
    readings: Mutex<HashMap<String, Vec<SensorReading>>>,
    health: Mutex<HashMap<String, HealthScore>>,
    alerts: Mutex<Vec<MaintenanceAlert>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            equipment: Mutex::new(Vec::new()),
            readings: Mutex::new(HashMap::new()),
            health: Mutex::new(HashMap::new()),
            alerts: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EquipmentStore for InMemoryStore {
    async fn insert_equipment(&self, equipment: &Equipment) -> Result<(), StoreError> {
        let mut all = self
            .equipment
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        if all.iter().any(|e| e.id == equipment.id) {
            return Err(StoreError::Duplicate(equipment.id.clone()));
        }
        all.push(equipment.clone());
        Ok(())
    }

    async fn get_equipment(&self, id: &str) -> Result<Option<Equipment>, StoreError> {
        Ok(self
            .equipment
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn list_equipment(
        &self,
        status: Option<EquipmentStatus>,
    ) -> Result<Vec<Equipment>, StoreError> {
        Ok(self
            .equipment
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .iter()
            .filter(|e| status.is_none_or(|s| e.status == s))
            .cloned()
            .collect())
    }

    async fn update_equipment_status(
        &self,
        id: &str,
        status: EquipmentStatus,
    ) -> Result<(), StoreError> {
        let mut all = self
            .equipment
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        let equipment = all
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        equipment.status = status;
        Ok(())
    }
}

#[async_trait]
impl ReadingStore for InMemoryStore {
    async fn append_reading(&self, reading: &SensorReading) -> Result<(), StoreError> {
        self.readings
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?
            .entry(reading.equipment_id.clone())
            .or_default()
            .push(reading.clone());
        Ok(())
    }

    async fn recent_readings(
        &self,
        equipment_id: &str,
        sensor: Option<SensorKind>,
        limit: usize,
    ) -> Result<Vec<SensorReading>, StoreError> {
        let readings = self
            .readings
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;
        Ok(readings
            .get(equipment_id)
            .map(|all| {
                all.iter()
                    .rev()
                    .filter(|r| sensor.is_none_or(|s| r.sensor == s))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn purge_readings_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut readings = self
            .readings
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        let mut removed = 0;
        for series in readings.values_mut() {
            let before = series.len();
            series.retain(|r| r.timestamp >= cutoff);
            removed += before - series.len();
        }
        Ok(removed)
    }
}

#[async_trait]
impl HealthStore for InMemoryStore {
    async fn upsert_health(&self, score: &HealthScore) -> Result<(), StoreError> {
        self.health
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?
            .insert(score.equipment_id.clone(), score.clone());
        Ok(())
    }

    async fn get_health(&self, equipment_id: &str) -> Result<Option<HealthScore>, StoreError> {
        Ok(self
            .health
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .get(equipment_id)
            .cloned())
    }

    async fn list_health(&self) -> Result<Vec<HealthScore>, StoreError> {
        let mut scores: Vec<HealthScore> = self
            .health
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .values()
            .cloned()
            .collect();
        scores.sort_by(|a, b| a.equipment_id.cmp(&b.equipment_id));
        Ok(scores)
    }
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn insert_alert(&self, alert: &MaintenanceAlert) -> Result<(), StoreError> {
        let mut alerts = self
            .alerts
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        if alerts.iter().any(|a| a.id == alert.id) {
            return Err(StoreError::Duplicate(alert.id.clone()));
        }
        alerts.push(alert.clone());
        Ok(())
    }

    async fn update_alert(&self, alert: &MaintenanceAlert) -> Result<(), StoreError> {
        let mut alerts = self
            .alerts
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        let slot = alerts
            .iter_mut()
            .find(|a| a.id == alert.id)
            .ok_or_else(|| StoreError::NotFound(alert.id.clone()))?;
        *slot = alert.clone();
        Ok(())
    }

    async fn get_alert(&self, id: &str) -> Result<Option<MaintenanceAlert>, StoreError> {
        Ok(self
            .alerts
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_alerts(&self, query: &AlertQuery) -> Result<Vec<MaintenanceAlert>, StoreError> {
        let alerts = self
            .alerts
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;
        Ok(alerts
            .iter()
            .rev()
            .filter(|a| query.matches(a))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
