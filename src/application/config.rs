use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::services::monitor::MonitorSettings;
use crate::domain::value_objects::thresholds::{
    ComponentWeights, DetectionThresholds, ScoringSettings,
};

/// Top-level application configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Tick intervals, store timeout and retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_ingest_interval")]
    pub ingest_interval_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    /// Days of readings kept; 0 keeps everything.
    #[serde(default)]
    pub retention_days: u32,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Anomaly detection tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_window")]
    pub window_size: usize,
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    #[serde(default = "default_sigma_multiplier")]
    pub sigma_multiplier: f64,
}

/// Health scoring tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_window")]
    pub window_size: usize,
    #[serde(default = "default_hysteresis")]
    pub trend_hysteresis: f64,
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_weight")]
    pub engine: f64,
    #[serde(default = "default_weight")]
    pub hydraulics: f64,
    #[serde(default = "default_weight")]
    pub electrical: f64,
    #[serde(default = "default_weight")]
    pub mechanical: f64,
}

/// Built-in telemetry simulator used by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fixed seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_arrival_probability")]
    pub arrival_probability: f64,
    #[serde(default = "default_spike_probability")]
    pub spike_probability: f64,
    /// Half-width of the uniform noise band, as a fraction of nominal.
    #[serde(default = "default_noise_ratio")]
    pub noise_ratio: f64,
}

/// Notification channels: terminal, log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub terminal: bool,
    #[serde(default)]
    pub log_file: Option<String>,
}

/// Database storage path (tilde-expanded at point of use).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

// --- Defaults ---

const fn default_ingest_interval() -> u64 {
    30
}

const fn default_sweep_interval() -> u64 {
    300
}

const fn default_store_timeout() -> u64 {
    2000
}

const fn default_event_capacity() -> usize {
    256
}

const fn default_window() -> usize {
    100
}

const fn default_min_samples() -> usize {
    5
}

const fn default_sigma_multiplier() -> f64 {
    2.5
}

const fn default_hysteresis() -> f64 {
    0.02
}

const fn default_weight() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}

const fn default_arrival_probability() -> f64 {
    0.7
}

const fn default_spike_probability() -> f64 {
    0.02
}

const fn default_noise_ratio() -> f64 {
    0.03
}

fn default_database_path() -> String {
    "~/.local/share/fleetguard/fleetguard.db".into()
}

// --- Default impls ---

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            ingest_interval_secs: default_ingest_interval(),
            sweep_interval_secs: default_sweep_interval(),
            store_timeout_ms: default_store_timeout(),
            retention_days: 0,
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_size: default_window(),
            min_samples: default_min_samples(),
            sigma_multiplier: default_sigma_multiplier(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window_size: default_window(),
            trend_hysteresis: default_hysteresis(),
            weights: WeightsConfig::default(),
        }
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            engine: default_weight(),
            hydraulics: default_weight(),
            electrical: default_weight(),
            mechanical: default_weight(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            seed: None,
            arrival_probability: default_arrival_probability(),
            spike_probability: default_spike_probability(),
            noise_ratio: default_noise_ratio(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            terminal: default_true(),
            log_file: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

// --- AppConfig methods ---

impl AppConfig {
    /// Load config from default path or create default config file
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined,
    /// the file cannot be read, or the TOML content is invalid.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_or_create(&path)
    }

    /// Load from a specific path, or create a default config file if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is invalid,
    /// or the default config file cannot be written.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Default configuration written to {}", path.display());
            Ok(config)
        }
    }

    /// Load from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML content is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to a specific path, creating parent directories if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created,
    /// serialization fails, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Orchestrator settings with every value forced into a usable range.
    #[must_use]
    pub fn monitor_settings(&self) -> MonitorSettings {
        let general = &self.general;
        MonitorSettings {
            ingest_interval: Duration::from_secs(general.ingest_interval_secs.max(1)),
            sweep_interval: Duration::from_secs(general.sweep_interval_secs.max(1)),
            store_timeout: Duration::from_millis(general.store_timeout_ms.clamp(10, 60_000)),
            history_window: self.detection.window_size.max(1),
            scoring_window: self.scoring.window_size.max(1),
            event_capacity: general.event_capacity.clamp(1, 65_536),
            retention: (general.retention_days > 0)
                .then(|| TimeDelta::days(i64::from(general.retention_days))),
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("fleetguard").join("config.toml"))
    }

    /// Resolve `--config` or the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the default config directory cannot be determined.
    pub fn resolve_path(explicit: Option<&str>) -> Result<PathBuf> {
        match explicit {
            Some(raw) => Ok(PathBuf::from(shellexpand::tilde(raw).as_ref())),
            None => Self::config_path(),
        }
    }
}

impl From<&DetectionConfig> for DetectionThresholds {
    fn from(config: &DetectionConfig) -> Self {
        let defaults = Self::default();
        let window_size = config.window_size.max(2);
        let sigma_multiplier = if config.sigma_multiplier.is_finite() {
            config.sigma_multiplier.clamp(0.5, 10.0)
        } else {
            defaults.sigma_multiplier
        };
        Self {
            window_size,
            min_samples: config.min_samples.clamp(2, window_size),
            sigma_multiplier,
        }
    }
}

impl From<&ScoringConfig> for ScoringSettings {
    fn from(config: &ScoringConfig) -> Self {
        let sanitize = |w: f64| if w.is_finite() { w.max(0.0) } else { 0.0 };
        let mut weights = ComponentWeights {
            engine: sanitize(config.weights.engine),
            hydraulics: sanitize(config.weights.hydraulics),
            electrical: sanitize(config.weights.electrical),
            mechanical: sanitize(config.weights.mechanical),
        };
        // All-zero weights cannot produce a score
        if weights.total() <= 0.0 {
            weights = ComponentWeights::default();
        }
        let trend_hysteresis = if config.trend_hysteresis.is_finite() {
            config.trend_hysteresis.clamp(0.0, 0.5)
        } else {
            default_hysteresis()
        };
        Self {
            window_size: config.window_size.max(1),
            weights,
            trend_hysteresis,
        }
    }
}
