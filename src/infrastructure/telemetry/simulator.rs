use std::sync::Mutex;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::entities::equipment::Equipment;
use crate::domain::entities::reading::NewReading;
use crate::domain::ports::telemetry::{TelemetryError, TelemetrySource};
use crate::domain::value_objects::sensor::SensorKind;

/// Knobs of the simulated feed. Probabilities are clamped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorSettings {
    pub seed: Option<u64>,
    /// Chance that a given sensor reports on a given poll.
    pub arrival_probability: f64,
    /// Chance that a reported value is a spike far from nominal.
    pub spike_probability: f64,
    /// Half-width of the uniform noise band, as a fraction of nominal.
    pub noise_ratio: f64,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            seed: None,
            arrival_probability: 0.7,
            spike_probability: 0.02,
            noise_ratio: 0.03,
        }
    }
}

/// Random telemetry around each sensor's nominal value, with occasional spikes.
pub struct SimulatedTelemetry {
    rng: Mutex<StdRng>,
    arrival_probability: f64,
    spike_probability: f64,
    noise_ratio: f64,
}

impl SimulatedTelemetry {
    #[must_use]
    pub fn new(settings: &SimulatorSettings) -> Self {
        let rng = settings
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            rng: Mutex::new(rng),
            arrival_probability: sanitize_probability(settings.arrival_probability),
            spike_probability: sanitize_probability(settings.spike_probability),
            noise_ratio: if settings.noise_ratio.is_finite() {
                settings.noise_ratio.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    fn sample(&self, rng: &mut StdRng, sensor: SensorKind) -> f64 {
        let nominal = sensor.nominal();
        let (min, max) = sensor.hard_bounds();
        if rng.gen_bool(self.spike_probability) {
            // Either side of nominal, up to just past the physical bound.
            let overshoot = 0.05 * (max - min);
            return if rng.gen_bool(0.5) {
                rng.gen_range(nominal + 0.6 * (max - nominal)..=max + overshoot)
            } else {
                rng.gen_range(min - overshoot..=nominal - 0.6 * (nominal - min))
            };
        }
        let band = nominal.abs() * self.noise_ratio;
        if band <= 0.0 {
            return nominal;
        }
        rng.gen_range(nominal - band..=nominal + band).clamp(min, max)
    }
}

fn sanitize_probability(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl TelemetrySource for SimulatedTelemetry {
    fn poll(&self, equipment: &Equipment) -> Result<Vec<NewReading>, TelemetryError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| TelemetryError::FeedUnavailable("simulator state poisoned".into()))?;
        let now = Utc::now();
        let mut batch = Vec::new();
        for sensor in SensorKind::ALL {
            if !rng.gen_bool(self.arrival_probability) {
                continue;
            }
            let value = self.sample(&mut rng, sensor);
            batch.push(NewReading {
                equipment_id: equipment.id.clone(),
                sensor,
                value,
                timestamp: Some(now),
            });
        }
        drop(rng);
        tracing::trace!("Simulated {} reading(s) for {}", batch.len(), equipment.id);
        Ok(batch)
    }
}
