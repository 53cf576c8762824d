use std::sync::Arc;

use anyhow::Context;
use chrono::{TimeDelta, Utc};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use fleetguard::application::config::AppConfig;
use fleetguard::application::services::alerts::AlertManager;
use fleetguard::application::services::monitor::MonitorService;
use fleetguard::domain::analysis::anomaly::StatisticalDetector;
use fleetguard::domain::analysis::scoring::WindowHealthScorer;
use fleetguard::domain::entities::equipment::NewEquipment;
use fleetguard::domain::entities::reading::NewReading;
use fleetguard::domain::ports::notifier::Notifier;
use fleetguard::domain::value_objects::alert_lifecycle::ResolutionOutcome;
use fleetguard::domain::value_objects::thresholds::{DetectionThresholds, ScoringSettings};
use fleetguard::infrastructure::notifications::composite::CompositeNotifier;
use fleetguard::infrastructure::notifications::log_file::LogFileNotifier;
use fleetguard::infrastructure::notifications::terminal::TerminalNotifier;
use fleetguard::infrastructure::persistence::sqlite_store::SqliteStore;
use fleetguard::infrastructure::telemetry::simulator::{SimulatedTelemetry, SimulatorSettings};
use fleetguard::presentation::cli::app::{Cli, Commands, EquipmentCommand};
use fleetguard::presentation::cli::commands::alerts::{run_ack, run_alerts, run_resolve, AlertScope};
use fleetguard::presentation::cli::commands::daemon::run_daemon;
use fleetguard::presentation::cli::commands::equipment::{run_add, run_list, run_set_status};
use fleetguard::presentation::cli::commands::health::run_health;
use fleetguard::presentation::cli::commands::ingest::{run_ingest, run_readings};
use fleetguard::presentation::cli::commands::status::run_status;
use fleetguard::presentation::cli::commands::trends::run_trends;

fn print_banner() {
    println!("{}", "\u{2501}".repeat(40).cyan());
    println!("{}", "  FLEETGUARD: Equipment Health Monitor".bold().cyan());
    println!("{}", "\u{2501}".repeat(40).cyan());
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn simulator_settings(config: &AppConfig) -> SimulatorSettings {
    let sim = &config.simulator;
    SimulatorSettings {
        seed: sim.seed,
        arrival_probability: if sim.enabled {
            sim.arrival_probability
        } else {
            0.0
        },
        spike_probability: sim.spike_probability,
        noise_ratio: sim.noise_ratio,
    }
}

fn build_notifier(config: &AppConfig) -> Arc<dyn Notifier> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
    if config.notifications.terminal {
        notifiers.push(Box::new(TerminalNotifier::default()));
    }
    if let Some(ref path) = config.notifications.log_file {
        notifiers.push(Box::new(LogFileNotifier::new(path)));
    }
    let composite = CompositeNotifier::new(notifiers);
    if composite.is_empty() {
        tracing::warn!("Every notification channel is disabled, alerts are only stored");
    }
    Arc::new(composite)
}

// Manual DI: main.rs is the only place that knows concrete types
fn build_service(config: &AppConfig) -> anyhow::Result<Arc<MonitorService>> {
    let store = Arc::new(
        SqliteStore::new(&config.database.path)
            .with_context(|| format!("Failed to open database {}", config.database.path))?,
    );
    let settings = config.monitor_settings();
    if config.simulator.enabled {
        tracing::debug!("Telemetry simulator enabled");
    } else {
        tracing::info!("Telemetry simulator disabled, readings arrive through `ingest` only");
    }
    Ok(Arc::new(MonitorService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(StatisticalDetector::new(DetectionThresholds::from(
            &config.detection,
        ))),
        Arc::new(WindowHealthScorer::new(ScoringSettings::from(&config.scoring))),
        AlertManager::new(store, settings.store_timeout),
        Arc::new(SimulatedTelemetry::new(&simulator_settings(config))),
        settings,
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let config_path = AppConfig::resolve_path(cli.config.as_deref().and_then(|p| p.to_str()))?;
    let config = AppConfig::load_or_create(&config_path)?;
    let service = build_service(&config)?;
    let json = cli.json;

    match cli.command {
        Some(Commands::Daemon) | None => {
            print_banner();
            run_daemon(&service, build_notifier(&config)).await?;
        }
        Some(Commands::Status) => run_status(&service, json).await?,
        Some(Commands::Equipment { action }) => match action {
            EquipmentCommand::Add {
                id,
                name,
                category,
                serial,
                model,
                manufacturer,
                location,
                purchase_date,
                install_date,
                operating_hours,
            } => {
                let request = NewEquipment {
                    id,
                    name,
                    category: Some(category),
                    model,
                    manufacturer,
                    serial_number: serial,
                    purchase_date,
                    install_date,
                    location,
                    operating_hours,
                };
                run_add(&service, request, json).await?;
            }
            EquipmentCommand::List { status } => run_list(&service, status, json).await?,
            EquipmentCommand::SetStatus { id, status } => {
                run_set_status(&service, &id, status, json).await?;
            }
        },
        Some(Commands::Ingest {
            equipment_id,
            sensor,
            value,
        }) => {
            run_ingest(&service, NewReading::new(equipment_id, sensor, value), json).await?;
        }
        Some(Commands::Readings {
            equipment_id,
            sensor,
            limit,
        }) => run_readings(&service, &equipment_id, sensor, limit, json).await?,
        Some(Commands::Health { equipment_id }) => {
            run_health(&service, equipment_id.as_deref(), json).await?;
        }
        Some(Commands::Alerts {
            equipment,
            critical,
            since_hours,
        }) => {
            let scope = if let Some(hours) = since_hours {
                let hours = i64::try_from(hours).context("hour window too large")?;
                let delta = TimeDelta::try_hours(hours).context("hour window too large")?;
                let since = Utc::now()
                    .checked_sub_signed(delta)
                    .context("hour window too large")?;
                AlertScope::Since(since)
            } else if critical {
                AlertScope::Critical
            } else {
                AlertScope::Open(equipment)
            };
            run_alerts(&service, &scope, json).await?;
        }
        Some(Commands::Ack { alert_id }) => run_ack(&service, &alert_id, json).await?,
        Some(Commands::Resolve {
            alert_id,
            false_positive,
        }) => {
            let outcome = if false_positive {
                ResolutionOutcome::FalsePositive
            } else {
                ResolutionOutcome::Resolved
            };
            run_resolve(&service, &alert_id, outcome, json).await?;
        }
        Some(Commands::Trends { days }) => run_trends(&service, days, json).await?,
    }

    Ok(())
}
