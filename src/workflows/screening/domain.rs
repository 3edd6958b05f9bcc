use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Risk tier reported by a scoring model.
///
/// Upstream values outside `low`/`medium`/`high` are kept as [`RiskLevel::Unknown`] so a
/// response is never rejected for carrying an unexpected tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unknown,
        }
    }

    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

impl Serialize for RiskLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// Severity tag attached to each explained feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Good,
    Moderate,
    Risk,
}

impl FeatureStatus {
    /// Display order: risks first, strengths last.
    pub const fn severity_rank(self) -> u8 {
        match self {
            Self::Risk => 0,
            Self::Moderate => 1,
            Self::Good => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Risk => "risk",
        }
    }
}

/// One attribute that drove the score, already formatted by the scoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureExplanation {
    pub name: String,
    pub value: String,
    pub status: FeatureStatus,
    pub explanation: String,
}

/// Response of `POST /api/score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub breakdown: Option<Vec<FeatureExplanation>>,
}

/// One side of `POST /api/score/compare`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareModelResult {
    pub score: f64,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub impact: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub breakdown: Option<Vec<FeatureExplanation>>,
}

/// Both models scored against the same submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareResult {
    #[serde(rename = "legacy_model")]
    pub legacy: CompareModelResult,
    #[serde(rename = "new_model")]
    pub candidate: CompareModelResult,
}

/// Cash-flow attributes sent to both scoring endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantInputPayload {
    pub monthly_income: f64,
    pub monthly_rent: f64,
    pub liquid_savings: f64,
    pub monthly_debt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_history: Option<Vec<f64>>,
}

/// Identifies whose cached submission a request reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub const DEFAULT: &'static str = "default";

    pub fn default_session() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::default_session()
    }
}
