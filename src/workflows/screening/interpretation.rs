use serde::Serialize;

use super::domain::RiskLevel;
use super::metrics::clamp_score;

/// Placeholder shown when a model reports no usable risk tier.
pub const UNKNOWN_RISK_TEXT: &str = "Risk unknown";

/// Eligibility bucket over the clamped score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Moderate,
    Low,
    VeryLow,
}

impl ScoreBand {
    /// Buckets are evaluated top-down; the first matching floor wins.
    pub fn for_score(score: f64) -> Self {
        let score = clamp_score(score);
        if score >= 80.0 {
            Self::Strong
        } else if score >= 60.0 {
            Self::Moderate
        } else if score >= 40.0 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
            Self::VeryLow => "Very low",
        }
    }

    pub const fn hint(self) -> &'static str {
        match self {
            Self::Strong => "Likely approved by capability-based screening.",
            Self::Moderate => "Borderline, could be approved with mitigations.",
            Self::Low => "Higher risk, review what is driving the score.",
            Self::VeryLow => {
                "Unlikely, consider mitigations (guarantor, savings buffer, proof of income)."
            }
        }
    }

    pub const fn reliability_note(self) -> &'static str {
        match self {
            Self::Strong => "Strong payment reliability.",
            Self::Moderate => "Generally reliable, with some pressure points.",
            Self::Low => "Higher risk, review the drivers below.",
            Self::VeryLow => "High concern, likely unstable without mitigations.",
        }
    }
}

pub fn risk_text(risk: Option<RiskLevel>) -> &'static str {
    match risk {
        Some(RiskLevel::Low) => "Low risk",
        Some(RiskLevel::Medium) => "Medium risk",
        Some(RiskLevel::High) => "High risk",
        Some(RiskLevel::Unknown) | None => UNKNOWN_RISK_TEXT,
    }
}

/// Human-readable reading of a single model result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub score: f64,
    pub band: ScoreBand,
    pub label: &'static str,
    pub hint: &'static str,
    pub reliability_note: &'static str,
    pub risk_text: &'static str,
}

pub fn interpret(score: f64, risk: Option<RiskLevel>) -> Interpretation {
    let score = clamp_score(score);
    let band = ScoreBand::for_score(score);

    Interpretation {
        score,
        band,
        label: band.label(),
        hint: band.hint(),
        reliability_note: band.reliability_note(),
        risk_text: risk_text(risk),
    }
}
