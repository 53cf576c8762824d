use chrono::TimeDelta;

use crate::domain::value_objects::health::RiskLevel;
use crate::domain::value_objects::sensor::SensorKind;
use crate::domain::value_objects::severity::Severity;

/// Static maintenance guidance for one sensor kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommendation {
    pub action: &'static str,
    /// Baseline downtime for a medium-severity intervention.
    pub downtime_hours: f64,
    /// Baseline cost for a medium-severity intervention.
    pub cost: f64,
}

#[must_use]
pub const fn recommendation_for(sensor: SensorKind) -> Recommendation {
    match sensor {
        SensorKind::Temperature => Recommendation {
            action: "Inspect the cooling system: coolant level, radiator fins and thermostat",
            downtime_hours: 4.0,
            cost: 800.0,
        },
        SensorKind::Vibration => Recommendation {
            action: "Check bearings, mounts and shaft alignment; tighten loose fasteners",
            downtime_hours: 6.0,
            cost: 1500.0,
        },
        SensorKind::Pressure => Recommendation {
            action: "Inspect hydraulic lines, seals and pump for leaks or blockage",
            downtime_hours: 5.0,
            cost: 1200.0,
        },
        SensorKind::OilLevel => Recommendation {
            action: "Top up hydraulic oil and inspect for leaks; replace filter if contaminated",
            downtime_hours: 2.0,
            cost: 300.0,
        },
        SensorKind::FuelLevel => Recommendation {
            action: "Verify fuel gauge sender and check tank and lines for leaks",
            downtime_hours: 1.5,
            cost: 250.0,
        },
        SensorKind::Rpm => Recommendation {
            action: "Inspect engine governor, injectors and air intake",
            downtime_hours: 5.0,
            cost: 1800.0,
        },
        SensorKind::Load => Recommendation {
            action: "Review operating load against rated capacity; inspect structural members",
            downtime_hours: 3.0,
            cost: 600.0,
        },
        SensorKind::BatteryVoltage => Recommendation {
            action: "Test battery and alternator output; clean and tighten terminals",
            downtime_hours: 1.0,
            cost: 400.0,
        },
    }
}

/// Multiplier applied to baseline downtime and cost.
#[must_use]
pub const fn severity_factor(severity: Severity) -> f64 {
    match severity {
        Severity::Low => 0.5,
        Severity::Medium => 1.0,
        Severity::High => 1.5,
        Severity::Critical => 2.5,
    }
}

/// Expected time until failure if the anomaly is left unattended.
#[must_use]
pub const fn failure_horizon(severity: Severity) -> TimeDelta {
    match severity {
        Severity::Low => TimeDelta::days(30),
        Severity::Medium => TimeDelta::days(14),
        Severity::High => TimeDelta::days(7),
        Severity::Critical => TimeDelta::days(2),
    }
}

/// Guidance for alerts raised from overall health degradation. `None` for
/// risk levels that do not warrant an alert.
#[must_use]
pub const fn health_recommendation(risk: RiskLevel) -> Option<Recommendation> {
    match risk {
        RiskLevel::Low | RiskLevel::Medium => None,
        RiskLevel::High => Some(Recommendation {
            action: "Schedule a full inspection of all subsystems within the week",
            downtime_hours: 8.0,
            cost: 2500.0,
        }),
        RiskLevel::Critical => Some(Recommendation {
            action: "Take the machine out of service and perform an emergency inspection",
            downtime_hours: 24.0,
            cost: 8000.0,
        }),
    }
}
