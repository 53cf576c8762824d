use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::health::{ComponentScores, HealthScore};
use crate::domain::entities::reading::SensorReading;
use crate::domain::value_objects::health::{RiskLevel, TrendDirection};
use crate::domain::value_objects::sensor::Component;
use crate::domain::value_objects::thresholds::ScoringSettings;

#[derive(Error, Debug, PartialEq)]
pub enum ScoringError {
    #[error("component weights must sum to a positive finite value, got {0}")]
    InvalidWeights(f64),
    #[error("non-finite {0} score")]
    NonFinite(String),
}

/// Recomputes a machine's composite health from a window of recent readings.
pub trait HealthScorer: Send + Sync {
    /// Build a complete score for `equipment_id`. `window` is newest first;
    /// `previous` provides carried-over component values and the trend baseline.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError` when the configuration or inputs cannot produce
    /// a finite score.
    fn recompute(
        &self,
        equipment_id: &str,
        window: &[SensorReading],
        previous: Option<&HealthScore>,
        now: DateTime<Utc>,
    ) -> Result<HealthScore, ScoringError>;
}

/// Anomaly-ratio scorer: each component scores `1 - anomalies / readings`.
#[derive(Debug, Clone, Default)]
pub struct WindowHealthScorer {
    settings: ScoringSettings,
}

impl WindowHealthScorer {
    #[must_use]
    pub const fn new(settings: ScoringSettings) -> Self {
        Self { settings }
    }
}

impl HealthScorer for WindowHealthScorer {
    #[allow(clippy::cast_precision_loss)]
    fn recompute(
        &self,
        equipment_id: &str,
        window: &[SensorReading],
        previous: Option<&HealthScore>,
        now: DateTime<Utc>,
    ) -> Result<HealthScore, ScoringError> {
        let weight_total = self.settings.weights.total();
        if !weight_total.is_finite() || weight_total <= 0.0 {
            return Err(ScoringError::InvalidWeights(weight_total));
        }

        let considered: Vec<&SensorReading> = window
            .iter()
            .filter(|r| r.equipment_id == equipment_id)
            .take(self.settings.window_size)
            .collect();

        // (total, anomalous) per component
        let mut tallies: HashMap<Component, (usize, usize)> = HashMap::new();
        for reading in &considered {
            let entry = tallies.entry(reading.sensor.component()).or_insert((0, 0));
            entry.0 += 1;
            if reading.is_anomaly {
                entry.1 += 1;
            }
        }

        let mut components = previous.map_or(ComponentScores::PERFECT, |p| p.components);
        for component in Component::ALL {
            if let Some(&(total, anomalous)) = tallies.get(&component) {
                let score = (1.0 - anomalous as f64 / total as f64).clamp(0.0, 1.0);
                components.set(component, score);
            }
        }

        let weighted: f64 = Component::ALL
            .iter()
            .map(|c| components.get(*c) * self.settings.weights.weight(*c))
            .sum();
        let overall = (weighted / weight_total).clamp(0.0, 1.0);
        if !overall.is_finite() {
            return Err(ScoringError::NonFinite("overall".to_string()));
        }

        Ok(HealthScore {
            equipment_id: equipment_id.to_string(),
            overall_score: overall,
            components,
            trend: TrendDirection::classify(
                previous.map(|p| p.overall_score),
                overall,
                self.settings.trend_hysteresis,
            ),
            risk_level: RiskLevel::from_score(overall),
            readings_considered: considered.len(),
            updated_at: now,
        })
    }
}
