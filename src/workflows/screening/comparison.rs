use std::cmp::Ordering;

use serde::Serialize;

use super::domain::{CompareModelResult, RiskLevel};
use super::impact::{ImpactFieldAliases, ImpactMetrics};
use super::metrics::{clamp_score, format_percent, format_signed, percent_change, round1};

/// Number of entries surfaced in the "top changes" list.
pub const TOP_CHANGES_LIMIT: usize = 2;

/// Quantity compared between the legacy and candidate model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonDimension {
    AnnualLoss,
    MissedMonths,
    Score,
}

impl ComparisonDimension {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AnnualLoss => "Expected annual loss",
            Self::MissedMonths => "Expected missed months",
            Self::Score => "Reliability score",
        }
    }

    /// Lower is better for cost dimensions, higher is better for the score.
    pub const fn lower_is_better(self) -> bool {
        !matches!(self, Self::Score)
    }
}

/// Candidate-minus-legacy change for one impact dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "availability", rename_all = "snake_case")]
pub enum DimensionChange {
    NotAvailable,
    Available {
        legacy: f64,
        candidate: f64,
        delta: f64,
        percent_change: Option<f64>,
    },
}

impl DimensionChange {
    pub fn between(legacy: Option<f64>, candidate: Option<f64>) -> Self {
        match (legacy, candidate) {
            (Some(legacy), Some(candidate)) => Self::Available {
                legacy,
                candidate,
                delta: candidate - legacy,
                percent_change: percent_change(legacy, candidate),
            },
            _ => Self::NotAvailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    pub fn delta(&self) -> Option<f64> {
        match self {
            Self::Available { delta, .. } => Some(*delta),
            Self::NotAvailable => None,
        }
    }

    pub fn percent_change(&self) -> Option<f64> {
        match self {
            Self::Available { percent_change, .. } => *percent_change,
            Self::NotAvailable => None,
        }
    }

    /// Positive when the candidate value is smaller.
    pub fn percent_reduction(&self) -> Option<f64> {
        self.percent_change().map(|change| -change)
    }
}

/// Ranked entry in the "top changes" list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Improvement {
    pub dimension: ComparisonDimension,
    pub title: &'static str,
    pub detail: String,
    pub strength: f64,
    pub good: bool,
}

/// Derived side-by-side view of a legacy and a candidate model result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonView {
    pub legacy_score: f64,
    pub candidate_score: f64,
    pub score_delta: f64,
    pub legacy_risk: Option<RiskLevel>,
    pub candidate_risk: Option<RiskLevel>,
    pub legacy_impact: ImpactMetrics,
    pub candidate_impact: ImpactMetrics,
    pub annual_loss: DimensionChange,
    pub missed_months: DimensionChange,
    pub top_changes: Vec<Improvement>,
    pub headline: String,
}

/// Stateless engine turning two model results into a [`ComparisonView`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonEngine {
    aliases: ImpactFieldAliases,
}

impl ComparisonEngine {
    pub fn new(aliases: ImpactFieldAliases) -> Self {
        Self { aliases }
    }

    pub fn compare(
        &self,
        legacy: &CompareModelResult,
        candidate: &CompareModelResult,
    ) -> ComparisonView {
        let legacy_score = clamp_score(legacy.score);
        let candidate_score = clamp_score(candidate.score);
        let score_delta = candidate_score - legacy_score;

        let legacy_impact = self.aliases.extract(legacy.impact.as_ref());
        let candidate_impact = self.aliases.extract(candidate.impact.as_ref());

        let annual_loss =
            DimensionChange::between(legacy_impact.annual_loss, candidate_impact.annual_loss);
        let missed_months =
            DimensionChange::between(legacy_impact.missed_months, candidate_impact.missed_months);

        let top_changes = rank_improvements(collect_improvements(
            &annual_loss,
            &missed_months,
            score_delta,
        ));
        let headline = headline(&annual_loss, &missed_months, score_delta);

        ComparisonView {
            legacy_score,
            candidate_score,
            score_delta,
            legacy_risk: legacy.risk_level,
            candidate_risk: candidate.risk_level,
            legacy_impact,
            candidate_impact,
            annual_loss,
            missed_months,
            top_changes,
            headline,
        }
    }
}

/// Compare two model results using the standard impact alias table.
pub fn compare_models(legacy: &CompareModelResult, candidate: &CompareModelResult) -> ComparisonView {
    ComparisonEngine::default().compare(legacy, candidate)
}

fn collect_improvements(
    annual_loss: &DimensionChange,
    missed_months: &DimensionChange,
    score_delta: f64,
) -> Vec<Improvement> {
    let mut improvements = Vec::with_capacity(3);

    for (dimension, change) in [
        (ComparisonDimension::AnnualLoss, annual_loss),
        (ComparisonDimension::MissedMonths, missed_months),
    ] {
        if let Some(pct) = change.percent_change() {
            improvements.push(Improvement {
                dimension,
                title: dimension.label(),
                detail: impact_detail(pct),
                strength: pct.abs(),
                good: pct < 0.0,
            });
        }
    }

    improvements.push(Improvement {
        dimension: ComparisonDimension::Score,
        title: ComparisonDimension::Score.label(),
        detail: score_detail(score_delta),
        strength: score_delta.abs() / 100.0,
        good: round1(score_delta) > 0.0,
    });

    improvements
}

/// Stable: equal (good, strength) pairs keep insertion order.
fn rank_improvements(mut improvements: Vec<Improvement>) -> Vec<Improvement> {
    improvements.sort_by(|a, b| {
        b.good
            .cmp(&a.good)
            .then_with(|| b.strength.total_cmp(&a.strength))
    });
    improvements.truncate(TOP_CHANGES_LIMIT);
    improvements
}

fn direction(change: f64) -> Option<&'static str> {
    match change.partial_cmp(&0.0) {
        Some(Ordering::Less) => Some("reduced"),
        Some(Ordering::Greater) => Some("increased"),
        _ => None,
    }
}

fn impact_detail(pct: f64) -> String {
    match direction(pct) {
        Some(word) => format!("{word} {}", format_percent(pct)),
        None => "no change".to_string(),
    }
}

fn score_detail(score_delta: f64) -> String {
    let magnitude = round1(score_delta.abs());
    if magnitude == 0.0 {
        return "no change".to_string();
    }
    let word = if score_delta > 0.0 {
        "increased"
    } else {
        "decreased"
    };
    format!("{word} {magnitude} pts")
}

fn headline(
    annual_loss: &DimensionChange,
    missed_months: &DimensionChange,
    score_delta: f64,
) -> String {
    for (dimension, change) in [
        (ComparisonDimension::AnnualLoss, annual_loss),
        (ComparisonDimension::MissedMonths, missed_months),
    ] {
        if let Some(pct) = change.percent_change() {
            return match direction(pct) {
                Some(word) => format!("{} {word} by {}", dimension.label(), format_percent(pct)),
                None => format!("{}: no change", dimension.label()),
            };
        }
    }

    if round1(score_delta) == 0.0 {
        "Score: no change".to_string()
    } else {
        format!("Score changed {} pts", format_signed(score_delta, 1))
    }
}
