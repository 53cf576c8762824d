use anyhow::Context;
use colored::Colorize;

use crate::application::services::monitor::MonitorService;
use crate::application::services::reporting::Dashboard;
use crate::infrastructure::notifications::terminal::{sanitize, severity_badge};
use crate::presentation::cli::formatters::alert_fmt::format_alerts;
use crate::presentation::cli::formatters::status_fmt::{
    colorize_score, health_bar, print_section_header, risk_label,
};

/// # Errors
///
/// Returns an error if the dashboard cannot be assembled or JSON serialization fails.
pub async fn run_status(service: &MonitorService, json: bool) -> anyhow::Result<()> {
    let dashboard = service
        .get_dashboard()
        .await
        .context("Failed to build the fleet dashboard")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    print_dashboard(&dashboard);
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    println!("{}", "fleetguard: Fleet Status".bold().cyan());
    println!("{}", "\u{2501}".repeat(50));

    let eq = &dashboard.equipment;
    print_section_header("\n\u{1f69c} Equipment");
    println!(
        "  {} total: {} active, {} in maintenance, {} broken down, {} retired",
        eq.total.to_string().bold(),
        eq.active,
        eq.maintenance,
        eq.breakdown.to_string().red(),
        eq.retired
    );

    print_section_header("\n\u{2764}\u{fe0f}  Health");
    match dashboard.average_health {
        Some(avg) => println!("  Fleet average {} {}", health_bar(avg, 30), colorize_score(avg)),
        None => println!("  {}", "No health score computed yet".dimmed()),
    }
    let risk = &dashboard.risk_distribution;
    println!(
        "  Risk: {} low, {} medium, {} high, {} critical",
        risk.low,
        risk.medium,
        risk.high.to_string().yellow(),
        risk.critical.to_string().red().bold()
    );

    if !dashboard.worst_performers.is_empty() {
        print_section_header("\n\u{1f4c9} Worst performers");
        for score in &dashboard.worst_performers {
            println!(
                "  {:<12} {} {} {}",
                sanitize(&score.equipment_id),
                health_bar(score.overall_score, 20),
                colorize_score(score.overall_score),
                risk_label(score.risk_level)
            );
        }
    }

    let alerts = &dashboard.alerts;
    print_section_header("\n\u{1f6a8} Alerts");
    println!(
        "  {} open ({} active, {} acknowledged), {} critical",
        alerts.open.to_string().bold(),
        alerts.active,
        alerts.acknowledged,
        alerts.critical.to_string().red().bold()
    );

    if !dashboard.critical_alerts.is_empty() {
        format_alerts(&dashboard.critical_alerts);
    }

    if !dashboard.recent_alerts.is_empty() {
        print_section_header("\n\u{1f552} Recent alerts");
        for alert in &dashboard.recent_alerts {
            println!(
                "  {} {} {} {}",
                alert.created_at.format("%d/%m %H:%M").to_string().dimmed(),
                severity_badge(alert.severity),
                sanitize(&alert.equipment_id),
                sanitize(&alert.title)
            );
        }
    }
}
