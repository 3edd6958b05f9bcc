use fair_tenant::workflows::screening::metrics::{format_currency, format_percent, round1};
use fair_tenant::workflows::screening::{
    BreakdownView, ComparisonReport, DimensionChange, EvaluationView, Interpretation,
    ValidationErrors,
};
use std::fmt::Write;

const NOT_AVAILABLE: &str = "Not available";

pub(crate) fn render_evaluation(view: &EvaluationView) -> String {
    let mut out = String::new();
    let reading = &view.interpretation;

    let _ = writeln!(
        out,
        "Reliability score: {}/100 ({})",
        round1(reading.score),
        reading.label
    );
    let _ = writeln!(out, "{} | {}", reading.risk_text, reading.reliability_note);
    let _ = writeln!(out, "Eligibility: {}", reading.hint);

    match &view.breakdown {
        BreakdownView::Ranked(items) if !items.is_empty() => {
            let _ = writeln!(out, "\nWhat is driving the score:");
            for item in items {
                let _ = writeln!(
                    out,
                    "  [{}] {} ({}): {}",
                    item.status.label().to_uppercase(),
                    item.name,
                    item.value,
                    item.explanation
                );
            }
        }
        _ => {
            let _ = writeln!(
                out,
                "\nNo breakdown returned. The scoring service sent a score without explanations."
            );
        }
    }

    out
}

pub(crate) fn render_comparison(report: &ComparisonReport) -> String {
    let mut out = String::new();
    let view = &report.view;

    let _ = writeln!(out, "Comparison: same applicant, two scoring approaches.");
    let _ = writeln!(out, "{}", view.headline);
    let _ = writeln!(
        out,
        "\nExpected annual loss: {}",
        change_tile(&view.annual_loss, format_currency)
    );
    let _ = writeln!(
        out,
        "Expected missed months: {}",
        change_tile(&view.missed_months, |value| format!("{} months", round1(value)))
    );

    let _ = writeln!(out, "\nTop changes:");
    for change in &view.top_changes {
        let badge = if change.good { "IMPROVED" } else { "CHANGED" };
        let _ = writeln!(out, "  {} - {} [{}]", change.title, change.detail, badge);
    }

    let _ = writeln!(out);
    model_card(
        &mut out,
        "Legacy model",
        &report.legacy,
        view.legacy_impact.missed_months,
        view.legacy_impact.annual_loss,
    );
    model_card(
        &mut out,
        "FairTenant model",
        &report.candidate,
        view.candidate_impact.missed_months,
        view.candidate_impact.annual_loss,
    );

    out
}

pub(crate) fn render_validation(errors: &ValidationErrors) -> String {
    let mut out = String::from("Please fix the highlighted fields:\n");
    for (field, message) in errors.fields() {
        let _ = writeln!(out, "  {}: {}", field.label(), message);
    }
    out
}

fn change_tile(change: &DimensionChange, amount: impl Fn(f64) -> String) -> String {
    let Some(delta) = change.delta() else {
        return NOT_AVAILABLE.to_string();
    };

    let mut tile = if round1(delta) == 0.0 {
        "No change".to_string()
    } else if delta < 0.0 {
        format!("Reduced {}", amount(delta.abs()))
    } else {
        format!("Increased {}", amount(delta.abs()))
    };
    if let Some(pct) = change.percent_change() {
        let _ = write!(tile, " ({})", format_percent(pct));
    }
    tile
}

fn model_card(
    out: &mut String,
    title: &str,
    reading: &Interpretation,
    missed_months: Option<f64>,
    annual_loss: Option<f64>,
) {
    let missed = missed_months
        .map(|value| format!("{} months", round1(value)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let loss = annual_loss
        .map(format_currency)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let _ = writeln!(
        out,
        "{title}: {}/100 ({}, {})",
        round1(reading.score),
        reading.label,
        reading.risk_text
    );
    let _ = writeln!(out, "  Expected missed months: {missed}");
    let _ = writeln!(out, "  Expected annual loss: {loss}");
}
