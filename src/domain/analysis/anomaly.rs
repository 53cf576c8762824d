use crate::domain::entities::reading::SensorReading;
use crate::domain::value_objects::severity::Severity;
use crate::domain::value_objects::thresholds::DetectionThresholds;

/// Outcome of evaluating one reading against its history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub is_anomaly: bool,
    pub severity: Severity,
    /// Distance from the window mean in standard deviations, when computable.
    pub deviation_sigma: Option<f64>,
    pub out_of_bounds: bool,
    /// Same-sensor samples the decision was based on.
    pub samples: usize,
}

impl Assessment {
    const fn normal(samples: usize, deviation_sigma: Option<f64>) -> Self {
        Self {
            is_anomaly: false,
            severity: Severity::Low,
            deviation_sigma,
            out_of_bounds: false,
            samples,
        }
    }
}

/// Classifies a reading as normal or anomalous given recent same-machine history.
/// Implementations must be deterministic for identical inputs.
pub trait AnomalyDetector: Send + Sync {
    /// `history` is newest first and may contain other sensor kinds.
    fn assess(&self, reading: &SensorReading, history: &[SensorReading]) -> Assessment;

    fn detect(&self, reading: &SensorReading, history: &[SensorReading]) -> bool {
        self.assess(reading, history).is_anomaly
    }

    fn severity(&self, reading: &SensorReading, history: &[SensorReading]) -> Severity {
        self.assess(reading, history).severity
    }
}

/// Bucket a deviation expressed in standard deviations.
#[must_use]
pub fn severity_for_sigma(sigma: f64) -> Severity {
    if sigma < 3.0 {
        Severity::Low
    } else if sigma < 4.0 {
        Severity::Medium
    } else if sigma < 5.0 {
        Severity::High
    } else {
        Severity::Critical
    }
}

/// Windowed mean/standard-deviation detector with hard physical bounds.
#[derive(Debug, Clone, Default)]
pub struct StatisticalDetector {
    thresholds: DetectionThresholds,
}

impl StatisticalDetector {
    #[must_use]
    pub const fn new(thresholds: DetectionThresholds) -> Self {
        Self { thresholds }
    }
}

impl AnomalyDetector for StatisticalDetector {
    #[allow(clippy::cast_precision_loss)]
    fn assess(&self, reading: &SensorReading, history: &[SensorReading]) -> Assessment {
        let samples: Vec<f64> = history
            .iter()
            .filter(|h| h.sensor == reading.sensor && h.id != reading.id)
            .take(self.thresholds.window_size)
            .map(|h| h.value)
            .collect();
        let count = samples.len();

        if !reading.sensor.within_bounds(reading.value) {
            return Assessment {
                is_anomaly: true,
                severity: Severity::Critical,
                deviation_sigma: None,
                out_of_bounds: true,
                samples: count,
            };
        }

        if count < self.thresholds.min_samples.max(1) {
            return Assessment::normal(count, None);
        }

        let n = count as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let stddev = variance.sqrt();
        let deviation = (reading.value - mean).abs();

        let sigma = if stddev > f64::EPSILON {
            deviation / stddev
        } else if deviation > f64::EPSILON {
            // Flat history: any movement is maximally surprising.
            f64::INFINITY
        } else {
            0.0
        };

        let is_anomaly = sigma > self.thresholds.sigma_multiplier;
        if !is_anomaly {
            return Assessment::normal(count, Some(sigma));
        }

        Assessment {
            is_anomaly,
            severity: severity_for_sigma(sigma),
            deviation_sigma: Some(sigma),
            out_of_bounds: false,
            samples: count,
        }
    }
}
