use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::domain::ports::store::StoreError;

/// Errors surfaced by the monitoring services to their callers.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("transient store failure: {0}")]
    TransientStore(String),
    #[error("invalid state transition: {0}")]
    StateConflict(String),
}

impl MonitorError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether retrying the same call later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientStore(_))
    }
}

impl From<StoreError> for MonitorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::not_found("entry", id),
            StoreError::Duplicate(id) => Self::Validation(format!("{id} already exists")),
            StoreError::ReadFailed(_) | StoreError::WriteFailed(_) | StoreError::Timeout(_) => {
                Self::TransientStore(err.to_string())
            }
        }
    }
}

/// Await a store call, treating a timeout as a transient store failure.
///
/// # Errors
///
/// Returns the converted `StoreError`, or `MonitorError::TransientStore`
/// if the call does not complete within `limit`.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, MonitorError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(MonitorError::from),
        Err(_) => Err(StoreError::Timeout(limit.as_millis()).into()),
    }
}
