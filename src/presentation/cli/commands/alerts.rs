use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::application::services::monitor::MonitorService;
use crate::domain::value_objects::alert_lifecycle::ResolutionOutcome;
use crate::presentation::cli::formatters::alert_fmt::{format_alerts, print_no_alerts};

/// Which alerts `alerts` lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertScope {
    /// Unresolved alerts, optionally of one machine.
    Open(Option<String>),
    /// Unresolved critical alerts.
    Critical,
    /// Everything raised since the instant, whatever its state.
    Since(DateTime<Utc>),
}

/// # Errors
///
/// Returns an error if the store fails or JSON serialization fails.
pub async fn run_alerts(
    service: &MonitorService,
    scope: &AlertScope,
    json: bool,
) -> anyhow::Result<()> {
    let alerts = match scope {
        AlertScope::Open(equipment_id) => service.get_active_alerts(equipment_id.as_deref()).await,
        AlertScope::Critical => service.get_critical_alerts().await,
        AlertScope::Since(since) => service.get_alerts_since(*since).await,
    }
    .context("Failed to read alerts")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
    } else if alerts.is_empty() {
        print_no_alerts();
    } else {
        format_alerts(&alerts);
    }
    Ok(())
}

/// # Errors
///
/// Returns an error for an unknown alert, an alert that is no longer active,
/// or a store failure.
pub async fn run_ack(service: &MonitorService, alert_id: &str, json: bool) -> anyhow::Result<()> {
    let alert = service
        .acknowledge_alert(alert_id)
        .await
        .with_context(|| format!("Cannot acknowledge alert {alert_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&alert)?);
    } else {
        println!(
            "{} {} ({})",
            "\u{2713} acknowledged".cyan().bold(),
            alert.id,
            alert.title
        );
    }
    Ok(())
}

/// # Errors
///
/// Returns an error for an unknown or already resolved alert, or a store failure.
pub async fn run_resolve(
    service: &MonitorService,
    alert_id: &str,
    outcome: ResolutionOutcome,
    json: bool,
) -> anyhow::Result<()> {
    let alert = service
        .resolve_alert(alert_id, outcome)
        .await
        .with_context(|| format!("Cannot resolve alert {alert_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&alert)?);
    } else {
        println!(
            "{} {} as {}",
            "\u{2714} resolved".green().bold(),
            alert.id,
            outcome
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use colored::control;

    use crate::domain::entities::reading::NewReading;
    use crate::domain::value_objects::sensor::SensorKind;
    use crate::presentation::cli::commands::testing;

    async fn service_with_alert() -> (std::sync::Arc<MonitorService>, String) {
        let service = testing::service();
        service
            .add_equipment(testing::generator("EQ1"))
            .await
            .expect("add");
        service
            .ingest(NewReading::new("EQ1", SensorKind::Pressure, 400.0))
            .await
            .expect("ingest");
        let alerts = service.get_active_alerts(Some("EQ1")).await.expect("alerts");
        let id = alerts.first().expect("one alert").id.clone();
        (service, id)
    }

    #[tokio::test]
    async fn list_every_scope() {
        control::set_override(false);
        let (service, _) = service_with_alert().await;
        for scope in [
            AlertScope::Open(None),
            AlertScope::Open(Some("EQ1".into())),
            AlertScope::Critical,
            AlertScope::Since(Utc::now() - chrono::TimeDelta::hours(1)),
        ] {
            assert!(run_alerts(&service, &scope, false).await.is_ok());
            assert!(run_alerts(&service, &scope, true).await.is_ok());
        }
    }

    #[tokio::test]
    async fn empty_listing_prints_all_clear() {
        control::set_override(false);
        let service = testing::service();
        assert!(run_alerts(&service, &AlertScope::Open(None), false)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn double_acknowledge_fails() {
        control::set_override(false);
        let (service, id) = service_with_alert().await;
        run_ack(&service, &id, false).await.expect("first");
        let err = run_ack(&service, &id, false).await.expect_err("second");
        assert!(err.to_string().contains(&id));
    }

    #[tokio::test]
    async fn resolve_as_false_positive() {
        control::set_override(false);
        let (service, id) = service_with_alert().await;
        run_resolve(&service, &id, ResolutionOutcome::FalsePositive, true)
            .await
            .expect("resolve");
        assert!(
            run_resolve(&service, &id, ResolutionOutcome::Resolved, false)
                .await
                .is_err()
        );
        assert!(run_ack(&service, "missing", false).await.is_err());
    }
}
