use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Keys accepted for expected missed rent-months, in lookup order.
pub const MISSED_MONTHS_KEYS: [&str; 2] = ["expect_missed_months", "expected_missed_months"];

/// Keys accepted for expected annual dollar loss, in lookup order.
pub const ANNUAL_LOSS_KEYS: [&str; 2] = ["expected_annual_loss", "expected_annual_losses"];

/// Canonical impact pair. `None` means the model did not report the dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactMetrics {
    pub missed_months: Option<f64>,
    pub annual_loss: Option<f64>,
}

/// Alias table used to normalize an impact mapping into [`ImpactMetrics`].
#[derive(Debug, Clone, Copy)]
pub struct ImpactFieldAliases {
    pub missed_months: &'static [&'static str],
    pub annual_loss: &'static [&'static str],
}

impl ImpactFieldAliases {
    pub const fn standard() -> Self {
        Self {
            missed_months: &MISSED_MONTHS_KEYS,
            annual_loss: &ANNUAL_LOSS_KEYS,
        }
    }

    pub fn extract(&self, raw: Option<&BTreeMap<String, f64>>) -> ImpactMetrics {
        let Some(raw) = raw else {
            return ImpactMetrics::default();
        };

        ImpactMetrics {
            missed_months: first_present(raw, self.missed_months),
            annual_loss: first_present(raw, self.annual_loss),
        }
    }
}

impl Default for ImpactFieldAliases {
    fn default() -> Self {
        Self::standard()
    }
}

fn first_present(raw: &BTreeMap<String, f64>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| raw.get(*key).copied())
}

/// Normalize an upstream impact mapping using the standard alias table.
pub fn extract_impact(raw: Option<&BTreeMap<String, f64>>) -> ImpactMetrics {
    ImpactFieldAliases::standard().extract(raw)
}
