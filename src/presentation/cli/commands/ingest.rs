use anyhow::Context;
use colored::Colorize;

use crate::application::services::monitor::MonitorService;
use crate::domain::entities::reading::NewReading;
use crate::domain::value_objects::sensor::SensorKind;
use crate::presentation::cli::formatters::table_fmt::format_readings_table;

/// Ingest one reading and report whether it was flagged.
///
/// # Errors
///
/// Returns an error if the reading is invalid, the machine is unknown or
/// retired, or the store fails.
pub async fn run_ingest(
    service: &MonitorService,
    reading: NewReading,
    json: bool,
) -> anyhow::Result<()> {
    let equipment_id = reading.equipment_id.clone();
    let stored = service
        .ingest(reading)
        .await
        .with_context(|| format!("Failed to ingest reading for {equipment_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }

    let line = format!(
        "{} {} = {:.2} {}",
        stored.equipment_id,
        stored.sensor,
        stored.value,
        stored.unit()
    );
    if stored.is_anomaly {
        println!("{} {}", "\u{26a0} anomaly".yellow().bold(), line);
    } else {
        println!("{} {}", "\u{2714} recorded".green(), line);
    }
    Ok(())
}

/// # Errors
///
/// Returns an error for an unknown machine or a store failure.
pub async fn run_readings(
    service: &MonitorService,
    equipment_id: &str,
    sensor: Option<SensorKind>,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let readings = service
        .readings(equipment_id, sensor, limit)
        .await
        .with_context(|| format!("Failed to read telemetry of {equipment_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
    } else if readings.is_empty() {
        println!("{}", "No readings recorded".dimmed());
    } else {
        println!("{}", format_readings_table(&readings));
    }
    Ok(())
}
