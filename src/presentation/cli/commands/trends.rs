use anyhow::Context;
use colored::Colorize;

use crate::application::services::monitor::MonitorService;
use crate::presentation::cli::formatters::status_fmt::{
    colorize_score, print_section_header, risk_label, trend_arrow,
};

/// # Errors
///
/// Returns an error for a zero-day window or a store failure.
pub async fn run_trends(service: &MonitorService, days: u32, json: bool) -> anyhow::Result<()> {
    let report = service
        .get_trends(days)
        .await
        .context("Failed to compute health trends")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_section_header(&format!("\u{1f4c8} Health trends, last {days} day(s)"));
    if report.equipment.is_empty() {
        println!("{}", "No score updated in this period".dimmed());
        println!();
        return Ok(());
    }

    println!(
        "  {} improving, {} stable, {} declining",
        report.improving.to_string().green(),
        report.stable,
        report.declining.to_string().red().bold()
    );
    println!();
    for trend in &report.equipment {
        println!(
            "  {:<12} {:>8} {:<10} {}",
            trend.equipment_id,
            colorize_score(trend.overall_score).to_string(),
            risk_label(trend.risk_level).to_string(),
            trend_arrow(trend.trend)
        );
    }
    println!();
    Ok(())
}
