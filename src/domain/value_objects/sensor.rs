use serde::{Deserialize, Serialize};

/// Equipment subsystem that a group of sensors reports on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Engine,
    Hydraulics,
    Electrical,
    Mechanical,
}

impl Component {
    pub const ALL: [Self; 4] = [
        Self::Engine,
        Self::Hydraulics,
        Self::Electrical,
        Self::Mechanical,
    ];
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine => write!(f, "engine"),
            Self::Hydraulics => write!(f, "hydraulics"),
            Self::Electrical => write!(f, "electrical"),
            Self::Mechanical => write!(f, "mechanical"),
        }
    }
}

/// Kind of physical sensor mounted on a machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Vibration,
    Pressure,
    OilLevel,
    FuelLevel,
    Rpm,
    Load,
    BatteryVoltage,
}

impl SensorKind {
    pub const ALL: [Self; 8] = [
        Self::Temperature,
        Self::Vibration,
        Self::Pressure,
        Self::OilLevel,
        Self::FuelLevel,
        Self::Rpm,
        Self::Load,
        Self::BatteryVoltage,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Vibration => "vibration",
            Self::Pressure => "pressure",
            Self::OilLevel => "oil_level",
            Self::FuelLevel => "fuel_level",
            Self::Rpm => "rpm",
            Self::Load => "load",
            Self::BatteryVoltage => "battery_voltage",
        }
    }

    #[must_use]
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "\u{b0}C",
            Self::Vibration => "mm/s",
            Self::Pressure => "bar",
            Self::OilLevel | Self::FuelLevel | Self::Load => "%",
            Self::Rpm => "rpm",
            Self::BatteryVoltage => "V",
        }
    }

    /// Inclusive range of physically plausible values. Anything outside is
    /// reported as a critical anomaly regardless of history.
    #[must_use]
    pub const fn hard_bounds(&self) -> (f64, f64) {
        match self {
            Self::Temperature => (-40.0, 150.0),
            Self::Vibration => (0.0, 50.0),
            Self::Pressure => (0.0, 350.0),
            Self::OilLevel | Self::FuelLevel => (0.0, 100.0),
            Self::Rpm => (0.0, 4000.0),
            Self::Load => (0.0, 120.0),
            Self::BatteryVoltage => (0.0, 32.0),
        }
    }

    #[must_use]
    pub fn within_bounds(&self, value: f64) -> bool {
        let (min, max) = self.hard_bounds();
        (min..=max).contains(&value)
    }

    /// Component whose health this sensor contributes to.
    #[must_use]
    pub const fn component(&self) -> Component {
        match self {
            Self::Temperature | Self::Rpm | Self::FuelLevel => Component::Engine,
            Self::Pressure | Self::OilLevel => Component::Hydraulics,
            Self::BatteryVoltage => Component::Electrical,
            Self::Vibration | Self::Load => Component::Mechanical,
        }
    }

    /// Typical operating value, used by the telemetry simulator.
    #[must_use]
    pub const fn nominal(&self) -> f64 {
        match self {
            Self::Temperature => 85.0,
            Self::Vibration => 4.5,
            Self::Pressure => 180.0,
            Self::OilLevel => 75.0,
            Self::FuelLevel => 60.0,
            Self::Rpm => 1800.0,
            Self::Load => 55.0,
            Self::BatteryVoltage => 24.5,
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown sensor kind '{s}'"))
    }
}
