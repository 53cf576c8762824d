use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Machine type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    Excavator,
    Bulldozer,
    Crane,
    Loader,
    DumpTruck,
    Generator,
    Compressor,
    Other,
}

impl EquipmentCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Excavator => "excavator",
            Self::Bulldozer => "bulldozer",
            Self::Crane => "crane",
            Self::Loader => "loader",
            Self::DumpTruck => "dump_truck",
            Self::Generator => "generator",
            Self::Compressor => "compressor",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EquipmentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "excavator" => Ok(Self::Excavator),
            "bulldozer" => Ok(Self::Bulldozer),
            "crane" => Ok(Self::Crane),
            "loader" => Ok(Self::Loader),
            "dump_truck" => Ok(Self::DumpTruck),
            "generator" => Ok(Self::Generator),
            "compressor" => Ok(Self::Compressor),
            "other" => Ok(Self::Other),
            _ => Err(format!("unknown equipment category '{s}'")),
        }
    }
}

/// Lifecycle status of a machine. `Retired` is terminal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    #[default]
    Active,
    Maintenance,
    Breakdown,
    Retired,
}

impl EquipmentStatus {
    pub const ALL: [Self; 4] = [
        Self::Active,
        Self::Maintenance,
        Self::Breakdown,
        Self::Retired,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Maintenance => "maintenance",
            Self::Breakdown => "breakdown",
            Self::Retired => "retired",
        }
    }

    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        !matches!(self, Self::Retired) || matches!(next, Self::Retired)
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown equipment status '{s}'"))
    }
}

/// A registered machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub category: EquipmentCategory,
    pub model: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub purchase_date: Option<NaiveDate>,
    pub install_date: Option<NaiveDate>,
    pub location: String,
    pub status: EquipmentStatus,
    pub operating_hours: f64,
    pub created_at: DateTime<Utc>,
}

/// Registration request for a new machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEquipment {
    /// Caller-chosen id; one is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub category: Option<EquipmentCategory>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub manufacturer: String,
    pub serial_number: String,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub install_date: Option<NaiveDate>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub operating_hours: f64,
}

impl NewEquipment {
    /// Check required fields, returning a description of every problem found.
    ///
    /// # Errors
    ///
    /// Returns the list of issues joined into one message.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();
        if self.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            problems.push("id must not be blank".to_string());
        }
        if self.name.trim().is_empty() {
            problems.push("name is required".to_string());
        }
        if self.category.is_none() {
            problems.push("category is required".to_string());
        }
        if self.serial_number.trim().is_empty() {
            problems.push("serial_number is required".to_string());
        }
        if !self.operating_hours.is_finite() || self.operating_hours < 0.0 {
            problems.push("operating_hours must be a non-negative number".to_string());
        }
        if let (Some(purchased), Some(installed)) = (self.purchase_date, self.install_date) {
            if installed < purchased {
                problems.push("install_date precedes purchase_date".to_string());
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join(", "))
        }
    }

    /// Build the equipment record. New machines always start `Active`.
    ///
    /// # Errors
    ///
    /// Returns the validation message when a required field is missing.
    pub fn into_equipment(self, created_at: DateTime<Utc>) -> Result<Equipment, String> {
        self.validate()?;
        let category = self
            .category
            .ok_or_else(|| "category is required".to_string())?;
        Ok(Equipment {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: self.name.trim().to_string(),
            category,
            model: self.model,
            manufacturer: self.manufacturer,
            serial_number: self.serial_number.trim().to_string(),
            purchase_date: self.purchase_date,
            install_date: self.install_date,
            location: self.location,
            status: EquipmentStatus::Active,
            operating_hours: self.operating_hours,
            created_at,
        })
    }
}
