use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::sensor::SensorKind;

/// A single telemetry sample. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: String,
    pub equipment_id: String,
    pub sensor: SensorKind,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    /// Set by the anomaly detector before the reading is appended.
    pub is_anomaly: bool,
}

impl SensorReading {
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        self.sensor.unit()
    }
}

/// A reading as produced by a telemetry source, before ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    pub equipment_id: String,
    pub sensor: SensorKind,
    pub value: f64,
    /// Capture time; ingestion time is used when absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewReading {
    #[must_use]
    pub fn new(equipment_id: impl Into<String>, sensor: SensorKind, value: f64) -> Self {
        Self {
            equipment_id: equipment_id.into(),
            sensor,
            value,
            timestamp: None,
        }
    }

    /// # Errors
    ///
    /// Returns a message when the equipment id is blank or the value is not finite.
    pub fn validate(&self) -> Result<(), String> {
        if self.equipment_id.trim().is_empty() {
            return Err("equipment_id is required".to_string());
        }
        if !self.value.is_finite() {
            return Err(format!("{} value must be a finite number", self.sensor));
        }
        Ok(())
    }

    /// Assign an id and timestamp. The anomaly flag starts unset.
    #[must_use]
    pub fn into_reading(self, received_at: DateTime<Utc>) -> SensorReading {
        SensorReading {
            id: uuid::Uuid::new_v4().to_string(),
            equipment_id: self.equipment_id,
            sensor: self.sensor,
            value: self.value,
            timestamp: self.timestamp.unwrap_or(received_at),
            is_anomaly: false,
        }
    }
}
