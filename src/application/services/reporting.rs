//! Read-only summaries assembled from store snapshots.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::domain::entities::alert::MaintenanceAlert;
use crate::domain::entities::equipment::{Equipment, EquipmentStatus};
use crate::domain::entities::health::HealthScore;
use crate::domain::value_objects::alert_lifecycle::AlertState;
use crate::domain::value_objects::health::{RiskLevel, TrendDirection};
use crate::domain::value_objects::severity::Severity;

const WORST_PERFORMERS: usize = 5;
pub const RECENT_ALERTS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub active: usize,
    pub maintenance: usize,
    pub breakdown: usize,
    pub retired: usize,
}

impl StatusCounts {
    fn tally(equipment: &[Equipment]) -> Self {
        let mut counts = Self {
            total: equipment.len(),
            ..Self::default()
        };
        for eq in equipment {
            match eq.status {
                EquipmentStatus::Active => counts.active += 1,
                EquipmentStatus::Maintenance => counts.maintenance += 1,
                EquipmentStatus::Breakdown => counts.breakdown += 1,
                EquipmentStatus::Retired => counts.retired += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    /// Unresolved alerts (active or acknowledged).
    pub open: usize,
    pub active: usize,
    pub acknowledged: usize,
    pub critical: usize,
}

impl AlertCounts {
    fn tally(open_alerts: &[MaintenanceAlert]) -> Self {
        let mut counts = Self::default();
        for alert in open_alerts.iter().filter(|a| a.state.is_open()) {
            counts.open += 1;
            match alert.state {
                AlertState::Active => counts.active += 1,
                AlertState::Acknowledged => counts.acknowledged += 1,
                AlertState::Resolved => {}
            }
            if alert.severity == Severity::Critical {
                counts.critical += 1;
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

/// Fleet overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub equipment: StatusCounts,
    pub alerts: AlertCounts,
    /// Mean overall score across scored equipment; `None` when nothing is scored.
    pub average_health: Option<f64>,
    pub risk_distribution: RiskDistribution,
    pub worst_performers: Vec<HealthScore>,
    pub recent_alerts: Vec<MaintenanceAlert>,
    pub critical_alerts: Vec<MaintenanceAlert>,
    pub generated_at: DateTime<Utc>,
}

impl Dashboard {
    /// `open_alerts` must hold every unresolved alert; `recent_alerts` is
    /// newest first and is truncated here.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(
        equipment: &[Equipment],
        scores: &[HealthScore],
        open_alerts: &[MaintenanceAlert],
        mut recent_alerts: Vec<MaintenanceAlert>,
        now: DateTime<Utc>,
    ) -> Self {
        let average_health = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().map(|s| s.overall_score).sum::<f64>() / scores.len() as f64)
        };

        let mut risk_distribution = RiskDistribution::default();
        for score in scores {
            match score.risk_level {
                RiskLevel::Low => risk_distribution.low += 1,
                RiskLevel::Medium => risk_distribution.medium += 1,
                RiskLevel::High => risk_distribution.high += 1,
                RiskLevel::Critical => risk_distribution.critical += 1,
            }
        }

        let mut worst_performers = scores.to_vec();
        worst_performers.sort_by(|a, b| a.overall_score.total_cmp(&b.overall_score));
        worst_performers.truncate(WORST_PERFORMERS);

        recent_alerts.truncate(RECENT_ALERTS);

        let critical_alerts = open_alerts
            .iter()
            .filter(|a| a.state.is_open() && a.severity == Severity::Critical)
            .cloned()
            .collect();

        Self {
            equipment: StatusCounts::tally(equipment),
            alerts: AlertCounts::tally(open_alerts),
            average_health,
            risk_distribution,
            worst_performers,
            recent_alerts,
            critical_alerts,
            generated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentTrend {
    pub equipment_id: String,
    pub trend: TrendDirection,
    pub overall_score: f64,
    pub risk_level: RiskLevel,
    pub updated_at: DateTime<Utc>,
}

/// Trend directions of scores refreshed within a lookback window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub days: u32,
    pub since: DateTime<Utc>,
    pub equipment: Vec<EquipmentTrend>,
    pub improving: usize,
    pub stable: usize,
    pub declining: usize,
}

impl TrendReport {
    #[must_use]
    pub fn build(scores: &[HealthScore], days: u32, now: DateTime<Utc>) -> Self {
        // windows reaching past the calendar range cover every score
        let since = TimeDelta::try_days(i64::from(days))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut equipment: Vec<EquipmentTrend> = scores
            .iter()
            .filter(|s| s.updated_at >= since)
            .map(|s| EquipmentTrend {
                equipment_id: s.equipment_id.clone(),
                trend: s.trend,
                overall_score: s.overall_score,
                risk_level: s.risk_level,
                updated_at: s.updated_at,
            })
            .collect();
        equipment.sort_by(|a, b| a.equipment_id.cmp(&b.equipment_id));

        let count = |direction| equipment.iter().filter(|t| t.trend == direction).count();
        let improving = count(TrendDirection::Improving);
        let stable = count(TrendDirection::Stable);
        let declining = count(TrendDirection::Declining);

        Self {
            days,
            since,
            equipment,
            improving,
            stable,
            declining,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::alert::sample_alert;
    use crate::domain::entities::equipment::{EquipmentCategory, NewEquipment};
    use crate::domain::entities::health::ComponentScores;

    fn machine(id: &str, status: EquipmentStatus) -> Equipment {
        let mut eq = NewEquipment {
            id: Some(id.into()),
            name: format!("Machine {id}"),
            category: Some(EquipmentCategory::Loader),
            serial_number: format!("SN-{id}"),
            ..NewEquipment::default()
        }
        .into_equipment(Utc::now())
        .expect("valid");
        eq.status = status;
        eq
    }

    fn score(id: &str, overall: f64, trend: TrendDirection, age: TimeDelta) -> HealthScore {
        HealthScore {
            equipment_id: id.into(),
            overall_score: overall,
            components: ComponentScores::PERFECT,
            trend,
            risk_level: RiskLevel::from_score(overall),
            readings_considered: 10,
            updated_at: Utc::now() - age,
        }
    }

    #[test]
    fn empty_fleet_dashboard() {
        let dashboard = Dashboard::build(&[], &[], &[], Vec::new(), Utc::now());
        assert_eq!(dashboard.equipment.total, 0);
        assert!(dashboard.average_health.is_none());
        assert!(dashboard.worst_performers.is_empty());
        assert!(dashboard.critical_alerts.is_empty());
    }

    #[test]
    fn dashboard_counts_and_ranks() {
        let equipment = vec![
            machine("A", EquipmentStatus::Active),
            machine("B", EquipmentStatus::Active),
            machine("C", EquipmentStatus::Maintenance),
            machine("D", EquipmentStatus::Retired),
        ];
        let scores: Vec<HealthScore> = [0.9, 0.3, 0.7, 0.5, 0.95, 0.85, 0.65]
            .iter()
            .enumerate()
            .map(|(i, s)| score(&format!("E{i}"), *s, TrendDirection::Stable, TimeDelta::zero()))
            .collect();
        let mut critical = sample_alert("A", Severity::Critical);
        critical.state = AlertState::Acknowledged;
        let open = vec![critical, sample_alert("B", Severity::Low)];
        let recent: Vec<MaintenanceAlert> =
            (0..15).map(|_| sample_alert("A", Severity::Medium)).collect();

        let dashboard = Dashboard::build(&equipment, &scores, &open, recent, Utc::now());
        assert_eq!(dashboard.equipment.total, 4);
        assert_eq!(dashboard.equipment.active, 2);
        assert_eq!(dashboard.equipment.retired, 1);
        assert_eq!(dashboard.alerts.open, 2);
        assert_eq!(dashboard.alerts.acknowledged, 1);
        assert_eq!(dashboard.alerts.critical, 1);
        assert_eq!(dashboard.critical_alerts.len(), 1);
        assert_eq!(dashboard.recent_alerts.len(), RECENT_ALERTS);
        assert_eq!(dashboard.worst_performers.len(), 5);
        assert!((dashboard.worst_performers[0].overall_score - 0.3).abs() < f64::EPSILON);
        assert_eq!(dashboard.risk_distribution.critical, 1);
        assert_eq!(dashboard.risk_distribution.low, 3);
        let avg = dashboard.average_health.expect("average");
        assert!((avg - 4.85 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn trends_respect_window() {
        let scores = vec![
            score("A", 0.9, TrendDirection::Improving, TimeDelta::hours(1)),
            score("B", 0.5, TrendDirection::Declining, TimeDelta::days(2)),
            score("C", 0.7, TrendDirection::Declining, TimeDelta::days(10)),
        ];
        let report = TrendReport::build(&scores, 7, Utc::now());
        assert_eq!(report.equipment.len(), 2);
        assert_eq!(report.improving, 1);
        assert_eq!(report.declining, 1);
        assert_eq!(report.stable, 0);
        assert_eq!(report.equipment[0].equipment_id, "A");
    }

    #[test]
    fn oversized_window_covers_every_score() {
        let scores = vec![
            score("A", 0.9, TrendDirection::Stable, TimeDelta::hours(1)),
            score("B", 0.3, TrendDirection::Declining, TimeDelta::days(4000)),
        ];
        let report = TrendReport::build(&scores, u32::MAX, Utc::now());
        assert_eq!(report.since, DateTime::<Utc>::MIN_UTC);
        assert_eq!(report.equipment.len(), 2);
        assert_eq!(report.declining, 1);
    }
}
