use colored::Colorize;

use crate::domain::entities::alert::MaintenanceAlert;
use crate::domain::value_objects::alert_lifecycle::AlertState;
use crate::infrastructure::notifications::terminal::{sanitize, severity_badge};

fn state_label(state: AlertState) -> String {
    let label = format!("[{state}]");
    match state {
        AlertState::Active => format!("{}", label.red()),
        AlertState::Acknowledged => format!("{}", label.yellow()),
        AlertState::Resolved => format!("{}", label.green()),
    }
}

pub fn format_alerts(alerts: &[MaintenanceAlert]) {
    for alert in alerts {
        println!();
        println!(
            "{} {} {}",
            severity_badge(alert.severity),
            state_label(alert.state),
            sanitize(&alert.title).bold()
        );
        println!(
            "  {} {}  {} {}  {} {}",
            "id:".dimmed(),
            alert.id,
            "equipment:".dimmed(),
            sanitize(&alert.equipment_id),
            "type:".dimmed(),
            alert.alert_type
        );
        if !alert.description.is_empty() {
            println!("  {}", sanitize(&alert.description).dimmed());
        }
        println!(
            "  {} {}",
            "\u{2192}".cyan(),
            sanitize(&alert.recommended_action).cyan()
        );
        let mut estimate = format!(
            "  ~{:.0}h downtime, ~{:.0} cost",
            alert.estimated_downtime_hours, alert.estimated_cost
        );
        if let Some(date) = alert.predicted_failure_date {
            estimate.push_str(&format!(", failure expected by {}", date.format("%Y-%m-%d")));
        }
        println!("{}", estimate.dimmed());
    }
    println!();
}

pub fn print_no_alerts() {
    println!();
    println!("{}", "\u{2705} No open maintenance alerts".green().bold());
    println!();
}
