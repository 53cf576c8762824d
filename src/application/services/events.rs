use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::domain::entities::event::AlertEvent;
use crate::domain::ports::notifier::Notifier;

/// Fan-out of alert lifecycle events. Publishing never blocks and never fails
/// the caller; slow subscribers lose the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AlertEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, event: AlertEvent) -> usize {
        let kind = event.kind;
        let alert_id = event.alert_id.clone();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("No subscribers for {kind} ({alert_id})");
                0
            }
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.sender.subscribe()
    }
}

/// Running notification relay. Dropping it leaves the task running until the
/// bus closes; [`EventRelay::finish`] stops it once queued events are delivered.
pub struct EventRelay {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl EventRelay {
    /// Deliver every event already published, then stop the relay.
    pub async fn finish(self) {
        if self.stop.send(true).is_err() {
            tracing::debug!("Notification relay already exited");
        }
        if let Err(e) = self.task.await {
            tracing::error!("Notification relay terminated abnormally: {e}");
        }
    }

    /// Stop immediately, discarding undelivered events.
    pub fn abort(self) {
        self.task.abort();
    }
}

/// Forward every event from `rx` to `notifier` until the bus closes or the
/// returned relay is finished.
pub fn spawn_event_relay(
    mut rx: broadcast::Receiver<AlertEvent>,
    notifier: Arc<dyn Notifier>,
) -> EventRelay {
    let (stop, mut stopped) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut detached = false;
        loop {
            tokio::select! {
                biased;
                received = rx.recv() => match received {
                    Ok(event) => deliver(notifier.as_ref(), &event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Notification relay lagged, {skipped} event(s) dropped");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Event bus closed, notification relay exiting");
                        break;
                    }
                },
                changed = stopped.changed(), if !detached => {
                    if changed.is_err() {
                        detached = true;
                        continue;
                    }
                    drain(&mut rx, notifier.as_ref());
                    tracing::debug!("Notification relay finished");
                    break;
                }
            }
        }
    });
    EventRelay { stop, task }
}

fn deliver(notifier: &dyn Notifier, event: &AlertEvent) {
    if let Err(e) = notifier.notify(event) {
        tracing::warn!("Alert notification failed: {e}");
    }
}

fn drain(rx: &mut broadcast::Receiver<AlertEvent>, notifier: &dyn Notifier) {
    loop {
        match rx.try_recv() {
            Ok(event) => deliver(notifier, &event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Notification relay lagged, {skipped} event(s) dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::domain::entities::alert::sample_alert;
    use crate::domain::entities::event::AlertEventKind;
    use crate::domain::ports::notifier::NotificationError;
    use crate::domain::value_objects::severity::Severity;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<AlertEvent>>,
        fail: bool,
    }

    impl Notifier for Recording {
        fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
            self.seen.lock().expect("lock").push(event.clone());
            if self.fail {
                return Err(NotificationError::SendFailed("boom".into()));
            }
            Ok(())
        }
    }

    fn event(kind: AlertEventKind) -> AlertEvent {
        AlertEvent::from_alert(kind, &sample_alert("EQ1", Severity::High), Utc::now())
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(event(AlertEventKind::Created)), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.publish(event(AlertEventKind::Acknowledged)), 1);
        let received = rx.recv().await.expect("event");
        assert_eq!(received.kind, AlertEventKind::Acknowledged);
    }

    #[tokio::test]
    async fn relay_forwards_and_survives_notifier_errors() {
        let bus = EventBus::new(8);
        let notifier = Arc::new(Recording {
            fail: true,
            ..Recording::default()
        });
        let relay = spawn_event_relay(bus.subscribe(), notifier.clone());

        bus.publish(event(AlertEventKind::Created));
        bus.publish(event(AlertEventKind::Resolved));
        drop(bus);
        relay.finish().await;

        let seen = notifier.seen.lock().expect("lock");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].kind, AlertEventKind::Resolved);
    }

    #[tokio::test]
    async fn finish_delivers_events_queued_before_it() {
        let bus = EventBus::new(8);
        let notifier = Arc::new(Recording::default());
        let relay = spawn_event_relay(bus.subscribe(), notifier.clone());

        for kind in [
            AlertEventKind::Created,
            AlertEventKind::Acknowledged,
            AlertEventKind::Resolved,
        ] {
            bus.publish(event(kind));
        }
        relay.finish().await;

        let seen = notifier.seen.lock().expect("lock");
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].kind, AlertEventKind::Resolved);
    }
}
