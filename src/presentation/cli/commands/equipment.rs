use anyhow::Context;
use colored::Colorize;

use crate::application::services::monitor::MonitorService;
use crate::domain::entities::equipment::{EquipmentStatus, NewEquipment};
use crate::presentation::cli::formatters::table_fmt::format_equipment_table;

/// # Errors
///
/// Returns an error if the request is invalid, the id is taken, or the store fails.
pub async fn run_add(
    service: &MonitorService,
    request: NewEquipment,
    json: bool,
) -> anyhow::Result<()> {
    let equipment = service
        .add_equipment(request)
        .await
        .context("Failed to register equipment")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&equipment)?);
    } else {
        println!(
            "{} {} ({}, {})",
            "\u{2714} registered".green().bold(),
            equipment.id.bold(),
            equipment.name,
            equipment.category
        );
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the store fails or JSON serialization fails.
pub async fn run_list(
    service: &MonitorService,
    status: Option<EquipmentStatus>,
    json: bool,
) -> anyhow::Result<()> {
    let equipment = service
        .equipment_list(status)
        .await
        .context("Failed to list equipment")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&equipment)?);
    } else if equipment.is_empty() {
        println!("{}", "No equipment registered".dimmed());
    } else {
        println!("{}", format_equipment_table(&equipment));
    }
    Ok(())
}

/// # Errors
///
/// Returns an error for an unknown machine, a move out of `retired`, or a
/// store failure.
pub async fn run_set_status(
    service: &MonitorService,
    equipment_id: &str,
    status: EquipmentStatus,
    json: bool,
) -> anyhow::Result<()> {
    let equipment = service
        .set_equipment_status(equipment_id, status)
        .await
        .with_context(|| format!("Failed to change status of {equipment_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&equipment)?);
    } else {
        println!("{} is now {}", equipment.id.bold(), equipment.status);
    }
    Ok(())
}
