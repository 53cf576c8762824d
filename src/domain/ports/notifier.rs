use thiserror::Error;

use crate::domain::entities::event::AlertEvent;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("failed to send notification: {0}")]
    SendFailed(String),
    #[error("notification channel unavailable: {0}")]
    ChannelUnavailable(String),
}

/// Sink for alert lifecycle events. Delivery failures never affect monitoring.
pub trait Notifier: Send + Sync {
    /// Relay one alert lifecycle event.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError` if the notification fails to send
    /// or the channel is unavailable.
    fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError>;
}
