use thiserror::Error;

use crate::domain::entities::equipment::Equipment;
use crate::domain::entities::reading::NewReading;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("telemetry feed unavailable: {0}")]
    FeedUnavailable(String),
    #[error("malformed telemetry: {0}")]
    Malformed(String),
}

/// Source of readings polled on every ingestion tick.
///
/// The simulator and a real inbound feed both sit behind this trait and feed
/// the same ingestion path.
pub trait TelemetrySource: Send + Sync {
    /// Readings that arrived for `equipment` since the previous poll.
    /// An empty vector is a normal outcome: telemetry is sparse.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError` if the feed cannot be read.
    fn poll(&self, equipment: &Equipment) -> Result<Vec<NewReading>, TelemetryError>;
}
