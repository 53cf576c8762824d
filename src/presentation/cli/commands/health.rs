use anyhow::Context;
use colored::Colorize;

use crate::application::services::monitor::MonitorService;
use crate::domain::entities::health::HealthScore;
use crate::domain::value_objects::sensor::Component;
use crate::presentation::cli::formatters::status_fmt::{
    colorize_score, health_bar, print_section_header, risk_label, trend_arrow,
};
use crate::presentation::cli::formatters::table_fmt::format_health_table;

/// Show one machine's score in detail, or every score as a table.
///
/// # Errors
///
/// Returns an error when the machine has no score yet or the store fails.
pub async fn run_health(
    service: &MonitorService,
    equipment_id: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    match equipment_id {
        Some(id) => {
            let score = service
                .get_health(id)
                .await
                .with_context(|| format!("No health score for {id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&score)?);
            } else {
                print_score(&score);
            }
        }
        None => {
            let scores = service
                .get_all_health()
                .await
                .context("Failed to read health scores")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&scores)?);
            } else if scores.is_empty() {
                println!("{}", "No health score computed yet".dimmed());
            } else {
                println!("{}", format_health_table(&scores));
            }
        }
    }
    Ok(())
}

fn print_score(score: &HealthScore) {
    print_section_header(&format!("\u{1fa7a} Health of {}", score.equipment_id));
    println!(
        "  Overall    {} {}  {}  {}",
        health_bar(score.overall_score, 30),
        colorize_score(score.overall_score),
        risk_label(score.risk_level),
        trend_arrow(score.trend)
    );
    for component in Component::ALL {
        let value = score.components.get(component);
        println!(
            "  {:<10} {} {}",
            component.to_string(),
            health_bar(value, 30),
            colorize_score(value)
        );
    }
    println!(
        "  {}",
        format!(
            "{} reading(s) considered, updated {}",
            score.readings_considered,
            score.updated_at.format("%Y-%m-%d %H:%M:%S")
        )
        .dimmed()
    );
}
