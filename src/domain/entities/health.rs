use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::health::{RiskLevel, TrendDirection};
use crate::domain::value_objects::sensor::Component;

/// Per-component health, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub engine: f64,
    pub hydraulics: f64,
    pub electrical: f64,
    pub mechanical: f64,
}

impl ComponentScores {
    /// Optimistic starting point for equipment never observed.
    pub const PERFECT: Self = Self {
        engine: 1.0,
        hydraulics: 1.0,
        electrical: 1.0,
        mechanical: 1.0,
    };

    #[must_use]
    pub const fn get(&self, component: Component) -> f64 {
        match component {
            Component::Engine => self.engine,
            Component::Hydraulics => self.hydraulics,
            Component::Electrical => self.electrical,
            Component::Mechanical => self.mechanical,
        }
    }

    pub fn set(&mut self, component: Component, score: f64) {
        let slot = match component {
            Component::Engine => &mut self.engine,
            Component::Hydraulics => &mut self.hydraulics,
            Component::Electrical => &mut self.electrical,
            Component::Mechanical => &mut self.mechanical,
        };
        *slot = score;
    }
}

impl Default for ComponentScores {
    fn default() -> Self {
        Self::PERFECT
    }
}

/// Current composite health of one machine. One record per equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub equipment_id: String,
    pub overall_score: f64,
    pub components: ComponentScores,
    pub trend: TrendDirection,
    pub risk_level: RiskLevel,
    /// Number of readings in the window this score was computed from.
    pub readings_considered: usize,
    pub updated_at: DateTime<Utc>,
}

impl HealthScore {
    /// Whether the risk level matches the threshold bucket of the overall score.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.risk_level == RiskLevel::from_score(self.overall_score)
    }
}
