//! Pure, deterministic analysis: readings and history in, verdicts out. No I/O.

pub mod anomaly;
pub mod maintenance;
pub mod scoring;

pub use anomaly::{severity_for_sigma, AnomalyDetector, Assessment, StatisticalDetector};
pub use maintenance::{recommendation_for, Recommendation};
pub use scoring::{HealthScorer, ScoringError, WindowHealthScorer};
