use serde::Serialize;

use super::domain::FeatureExplanation;

/// Order explanations risk-first; equal severities keep their upstream order.
pub fn rank_breakdown(items: &[FeatureExplanation]) -> Vec<FeatureExplanation> {
    let mut ranked = items.to_vec();
    ranked.sort_by_key(|item| item.status.severity_rank());
    ranked
}

/// Breakdown as shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "items", rename_all = "snake_case")]
pub enum BreakdownView {
    NotAvailable,
    Ranked(Vec<FeatureExplanation>),
}

impl BreakdownView {
    pub fn from_upstream(items: Option<&[FeatureExplanation]>) -> Self {
        match items {
            Some(items) => Self::Ranked(rank_breakdown(items)),
            None => Self::NotAvailable,
        }
    }

    pub fn items(&self) -> &[FeatureExplanation] {
        match self {
            Self::Ranked(items) => items,
            Self::NotAvailable => &[],
        }
    }
}
