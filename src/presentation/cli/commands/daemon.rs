use std::future::Future;
use std::sync::Arc;

use anyhow::Context;

use crate::application::services::events::spawn_event_relay;
use crate::application::services::monitor::MonitorService;
use crate::domain::ports::notifier::Notifier;

/// Run the monitoring daemon until it receives a SIGINT signal (Ctrl+C) via
/// [`tokio::signal::ctrl_c()`].
///
/// Alert events are relayed to `notifier` for as long as the daemon runs.
/// Note: SIGTERM is **not** handled.
///
/// # Errors
///
/// Returns an error if the monitor cannot start.
pub async fn run_daemon(
    service: &Arc<MonitorService>,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<()> {
    run_until(service, notifier, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl+C, stopping: {e}");
        }
    })
    .await
}

/// Start the monitor, wait for `shutdown`, then stop and drain it.
///
/// # Errors
///
/// Returns an error if the monitor cannot start; nothing is left running then.
pub async fn run_until<F>(
    service: &Arc<MonitorService>,
    notifier: Arc<dyn Notifier>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let relay = spawn_event_relay(service.subscribe(), notifier);
    if let Err(e) = service.start().await {
        relay.abort();
        return Err(e).context("Failed to start the monitor");
    }
    let settings = service.settings();
    tracing::info!(
        "Daemon running (ingest every {}s, sweep every {}s)",
        settings.ingest_interval.as_secs(),
        settings.sweep_interval.as_secs()
    );

    shutdown.await;
    tracing::info!("Shutdown signal received, draining...");
    println!("\nStopping fleetguard...");
    service.stop().await;
    relay.finish().await;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::domain::entities::event::{AlertEvent, AlertEventKind};
    use crate::domain::entities::reading::NewReading;
    use crate::domain::ports::notifier::NotificationError;
    use crate::domain::value_objects::sensor::SensorKind;
    use crate::presentation::cli::commands::testing;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<AlertEvent>>,
    }

    impl Notifier for Recording {
        fn notify(&self, event: &AlertEvent) -> Result<(), NotificationError> {
            self.events
                .lock()
                .map_err(|_| NotificationError::SendFailed("poisoned".into()))?
                .push(event.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn daemon_stops_when_shutdown_resolves() {
        let service = testing::service();
        let result = run_until(
            &service,
            Arc::new(Recording::default()),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;
        assert!(result.is_ok());
        assert!(!service.is_running().await);
    }

    #[tokio::test]
    async fn daemon_relays_events_while_running() {
        let service = testing::service();
        service
            .add_equipment(testing::generator("EQ1"))
            .await
            .expect("add");
        let recording = Arc::new(Recording::default());
        let monitor = Arc::clone(&service);

        let result = run_until(&service, recording.clone(), async move {
            monitor
                .ingest(NewReading::new("EQ1", SensorKind::Temperature, 500.0))
                .await
                .expect("ingest");
            tokio::time::sleep(Duration::from_millis(50)).await;
        })
        .await;
        assert!(result.is_ok());

        let events = recording.events.lock().expect("lock");
        assert!(!events.is_empty());
        assert!(events.iter().all(|e| e.equipment_id == "EQ1"));
    }

    #[tokio::test]
    async fn events_published_just_before_shutdown_are_delivered() {
        let service = testing::service();
        service
            .add_equipment(testing::generator("EQ1"))
            .await
            .expect("add");
        let recording = Arc::new(Recording::default());
        let monitor = Arc::clone(&service);

        run_until(&service, recording.clone(), async move {
            let reading = monitor
                .ingest(NewReading::new("EQ1", SensorKind::Pressure, 400.0))
                .await
                .expect("ingest");
            let alert = monitor
                .get_active_alerts(Some(&reading.equipment_id))
                .await
                .expect("alerts")
                .into_iter()
                .next()
                .expect("alert");
            monitor.acknowledge_alert(&alert.id).await.expect("ack");
        })
        .await
        .expect("daemon");

        let events = recording.events.lock().expect("lock");
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertEventKind::Created, AlertEventKind::Acknowledged]
        );
    }
}
