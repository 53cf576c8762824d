use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::entities::equipment::{EquipmentCategory, EquipmentStatus};
use crate::domain::value_objects::sensor::SensorKind;

/// fleetguard: equipment health monitoring and predictive maintenance
///
/// Ingests sensor telemetry, flags anomalies, keeps a health score per
/// machine and raises maintenance alerts before failures happen.
#[derive(Parser, Debug)]
#[command(name = "fleetguard")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the monitoring daemon (simulated telemetry, periodic sweeps)
    #[command(alias = "d")]
    Daemon,

    /// Show the fleet dashboard
    #[command(alias = "s")]
    Status,

    /// Register, list or retire equipment
    #[command(alias = "eq")]
    Equipment {
        #[command(subcommand)]
        action: EquipmentCommand,
    },

    /// Ingest one sensor reading
    #[command(alias = "i")]
    Ingest {
        /// Equipment id
        equipment_id: String,

        /// Sensor kind (temperature, vibration, pressure, oil_level, ...)
        sensor: SensorKind,

        /// Measured value, in the sensor's unit
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },

    /// Show the latest readings of one machine
    Readings {
        /// Equipment id
        equipment_id: String,

        /// Only this sensor kind
        #[arg(long)]
        sensor: Option<SensorKind>,

        /// Number of readings to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show health scores
    #[command(alias = "h")]
    Health {
        /// Equipment id (all scored equipment when omitted)
        equipment_id: Option<String>,
    },

    /// List open maintenance alerts
    #[command(alias = "a")]
    Alerts {
        /// Only alerts of this equipment
        #[arg(long)]
        equipment: Option<String>,

        /// Only open critical alerts
        #[arg(long, conflicts_with = "equipment")]
        critical: bool,

        /// Every alert raised in the last N hours, whatever its state
        #[arg(long, conflicts_with_all = ["equipment", "critical"])]
        since_hours: Option<u64>,
    },

    /// Acknowledge an active alert
    Ack {
        /// Alert id
        alert_id: String,
    },

    /// Resolve an open alert
    Resolve {
        /// Alert id
        alert_id: String,

        /// Close the alert as a false positive
        #[arg(long)]
        false_positive: bool,
    },

    /// Show health trends over the last days
    #[command(alias = "t")]
    Trends {
        /// Lookback window in days
        #[arg(short, long, default_value = "7")]
        days: u32,
    },
}

/// Equipment registry actions
#[derive(Subcommand, Debug)]
pub enum EquipmentCommand {
    /// Register a machine
    Add {
        /// Equipment id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: String,

        /// excavator, bulldozer, crane, loader, dump_truck, generator, compressor, other
        #[arg(long)]
        category: EquipmentCategory,

        #[arg(long)]
        serial: String,

        #[arg(long, default_value = "")]
        model: String,

        #[arg(long, default_value = "")]
        manufacturer: String,

        #[arg(long, default_value = "")]
        location: String,

        /// Purchase date (YYYY-MM-DD)
        #[arg(long)]
        purchase_date: Option<NaiveDate>,

        /// Installation date (YYYY-MM-DD)
        #[arg(long)]
        install_date: Option<NaiveDate>,

        #[arg(long, default_value = "0")]
        operating_hours: f64,
    },

    /// List registered machines
    #[command(alias = "ls")]
    List {
        /// Only machines in this status
        #[arg(long)]
        status: Option<EquipmentStatus>,
    },

    /// Change a machine's status (active, maintenance, breakdown, retired)
    SetStatus {
        /// Equipment id
        id: String,

        status: EquipmentStatus,
    },
}
