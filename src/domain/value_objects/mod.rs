pub mod alert_lifecycle;
pub mod health;
pub mod sensor;
pub mod severity;
pub mod thresholds;

pub use alert_lifecycle::{AlertState, AlertType, ResolutionOutcome};
pub use health::{RiskLevel, TrendDirection};
pub use sensor::{Component, SensorKind};
pub use severity::Severity;
pub use thresholds::{ComponentWeights, DetectionThresholds, ScoringSettings};
