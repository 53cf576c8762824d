use serde::{Deserialize, Serialize};

use super::sensor::Component;

/// Tuning for windowed deviation detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionThresholds {
    /// Maximum number of same-sensor samples considered
    pub window_size: usize,
    /// Below this many samples, in-bound readings are never anomalous
    pub min_samples: usize,
    /// Deviation, in standard deviations, above which a reading is anomalous
    pub sigma_multiplier: f64,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            window_size: 100,
            min_samples: 5,
            sigma_multiplier: 2.5,
        }
    }
}

/// Relative weight of each component in the overall health score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub engine: f64,
    pub hydraulics: f64,
    pub electrical: f64,
    pub mechanical: f64,
}

impl ComponentWeights {
    #[must_use]
    pub const fn weight(&self, component: Component) -> f64 {
        match component {
            Component::Engine => self.engine,
            Component::Hydraulics => self.hydraulics,
            Component::Electrical => self.electrical,
            Component::Mechanical => self.mechanical,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        Component::ALL.iter().map(|c| self.weight(*c)).sum()
    }
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            engine: 1.0,
            hydraulics: 1.0,
            electrical: 1.0,
            mechanical: 1.0,
        }
    }
}

/// Tuning for health score recomputation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Number of most recent readings (all sensors) per recompute
    pub window_size: usize,
    pub weights: ComponentWeights,
    /// Score change below which the trend stays stable
    pub trend_hysteresis: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            window_size: 100,
            weights: ComponentWeights::default(),
            trend_hysteresis: 0.02,
        }
    }
}
