use colored::Colorize;

use crate::domain::entities::equipment::{Equipment, EquipmentStatus};
use crate::domain::entities::health::HealthScore;
use crate::domain::entities::reading::SensorReading;
use crate::domain::value_objects::health::RiskLevel;
use crate::infrastructure::notifications::terminal::sanitize;

fn truncate(text: &str, width: usize) -> String {
    sanitize(text).chars().take(width).collect()
}

/// Formats registered equipment as an aligned table, in the given order.
#[must_use]
pub fn format_equipment_table(equipment: &[Equipment]) -> String {
    let header = format!(
        "{:<12} {:<24} {:<12} {:<14} {:<12} {:>10}",
        "ID", "NAME", "CATEGORY", "LOCATION", "STATUS", "HOURS"
    );
    let separator = "\u{2500}".repeat(header.len());

    let mut rows = vec![header, separator];
    for eq in equipment {
        let row = format!(
            "{:<12} {:<24} {:<12} {:<14} {:<12} {:>10.1}",
            truncate(&eq.id, 11),
            truncate(&eq.name, 23),
            eq.category.as_str(),
            truncate(&eq.location, 13),
            eq.status.as_str(),
            eq.operating_hours
        );
        match eq.status {
            EquipmentStatus::Breakdown => rows.push(row.red().to_string()),
            EquipmentStatus::Retired => rows.push(row.dimmed().to_string()),
            EquipmentStatus::Active | EquipmentStatus::Maintenance => rows.push(row),
        }
    }

    rows.join("\n")
}

/// Formats health scores, worst first.
#[must_use]
pub fn format_health_table(scores: &[HealthScore]) -> String {
    let mut sorted: Vec<&HealthScore> = scores.iter().collect();
    sorted.sort_by(|a, b| a.overall_score.total_cmp(&b.overall_score));

    let header = format!(
        "{:<12} {:>8} {:>8} {:>8} {:>8} {:>8} {:<10} {:<10}",
        "ID", "OVERALL", "ENGINE", "HYDRAUL", "ELECTR", "MECH", "RISK", "TREND"
    );
    let separator = "\u{2500}".repeat(header.len());

    let mut rows = vec![header, separator];
    for s in sorted {
        let row = format!(
            "{:<12} {:>7.1}% {:>7.1}% {:>7.1}% {:>7.1}% {:>7.1}% {:<10} {:<10}",
            truncate(&s.equipment_id, 11),
            s.overall_score * 100.0,
            s.components.engine * 100.0,
            s.components.hydraulics * 100.0,
            s.components.electrical * 100.0,
            s.components.mechanical * 100.0,
            s.risk_level.as_str(),
            s.trend.as_str()
        );
        if s.risk_level >= RiskLevel::High {
            rows.push(row.red().to_string());
        } else {
            rows.push(row);
        }
    }

    rows.join("\n")
}

/// Formats readings as given (newest first from the store).
#[must_use]
pub fn format_readings_table(readings: &[SensorReading]) -> String {
    let header = format!(
        "{:<20} {:<16} {:>12} {:<6} {:<7}",
        "TIME", "SENSOR", "VALUE", "UNIT", "ANOMALY"
    );
    let separator = "\u{2500}".repeat(header.len());

    let mut rows = vec![header, separator];
    for r in readings {
        let row = format!(
            "{:<20} {:<16} {:>12.2} {:<6} {:<7}",
            r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.sensor.as_str(),
            r.value,
            r.unit(),
            if r.is_anomaly { "yes" } else { "" }
        );
        if r.is_anomaly {
            rows.push(row.yellow().to_string());
        } else {
            rows.push(row);
        }
    }

    rows.join("\n")
}
