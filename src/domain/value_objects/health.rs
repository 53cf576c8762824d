use serde::{Deserialize, Serialize};

/// Risk bucket derived from an overall health score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Fixed threshold table: >=0.8 low, >=0.6 medium, >=0.4 high, below critical.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Low
        } else if score >= 0.6 {
            Self::Medium
        } else if score >= 0.4 {
            Self::High
        } else {
            Self::Critical
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown risk level '{other}'")),
        }
    }
}

/// Direction of an equipment's health score versus its previous value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    #[default]
    Stable,
    Declining,
}

impl TrendDirection {
    /// Classify the move from `previous` to `current`. Changes inside the
    /// `hysteresis` band count as stable.
    #[must_use]
    pub fn classify(previous: Option<f64>, current: f64, hysteresis: f64) -> Self {
        let Some(previous) = previous else {
            return Self::Stable;
        };
        let delta = current - previous;
        if delta > hysteresis {
            Self::Improving
        } else if delta < -hysteresis {
            Self::Declining
        } else {
            Self::Stable
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TrendDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "improving" => Ok(Self::Improving),
            "stable" => Ok(Self::Stable),
            "declining" => Ok(Self::Declining),
            other => Err(format!("unknown trend '{other}'")),
        }
    }
}
