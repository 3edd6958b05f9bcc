use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::TenantInputPayload;

const INCOME_HISTORY_MIN: usize = 3;
const INCOME_HISTORY_MAX: usize = 6;

/// Operator-facing input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeField {
    MonthlyIncome,
    MonthlyRent,
    LiquidSavings,
    MonthlyDebt,
    IncomeHistory,
}

impl IntakeField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MonthlyIncome => "Monthly income",
            Self::MonthlyRent => "Monthly rent",
            Self::LiquidSavings => "Liquid savings",
            Self::MonthlyDebt => "Monthly debt",
            Self::IncomeHistory => "Income history",
        }
    }
}

/// Per-field validation failures; a submission with any entry is never sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<IntakeField, String>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field.label(), message))
            .collect();
        write!(f, "invalid submission ({})", details.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: IntakeField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (IntakeField, &str)> {
        self.fields
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: IntakeField, message: &str) {
        self.fields.entry(field).or_insert_with(|| message.to_string());
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

const INCOME_MESSAGE: &str = "Enter a monthly income greater than 0.";
const RENT_MESSAGE: &str = "Enter a monthly rent greater than 0.";
const SAVINGS_MESSAGE: &str = "Enter liquid savings (0 or more).";
const DEBT_MESSAGE: &str = "Enter monthly debt payments (0 or more).";
const HISTORY_FORMAT_MESSAGE: &str =
    "Enter 3\u{2013}6 values separated by commas (e.g., 4800, 5000, 5200).";
const HISTORY_COUNT_MESSAGE: &str = "Enter between 3 and 6 monthly values.";
const HISTORY_NUMERIC_MESSAGE: &str = "Income history must contain only numbers.";
const HISTORY_NEGATIVE_MESSAGE: &str = "Income history cannot include negative values.";

/// Raw operator input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantInputForm {
    pub monthly_income: String,
    pub monthly_rent: String,
    pub liquid_savings: String,
    pub monthly_debt: String,
    #[serde(default)]
    pub income_history: String,
}

impl TenantInputForm {
    pub fn validate(&self) -> Result<TenantInputPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let monthly_income = parse_amount(&self.monthly_income).filter(|value| *value > 0.0);
        if monthly_income.is_none() {
            errors.insert(IntakeField::MonthlyIncome, INCOME_MESSAGE);
        }

        let monthly_rent = parse_amount(&self.monthly_rent).filter(|value| *value > 0.0);
        if monthly_rent.is_none() {
            errors.insert(IntakeField::MonthlyRent, RENT_MESSAGE);
        }

        let liquid_savings = parse_amount(&self.liquid_savings).filter(|value| *value >= 0.0);
        if liquid_savings.is_none() {
            errors.insert(IntakeField::LiquidSavings, SAVINGS_MESSAGE);
        }

        let monthly_debt = parse_amount(&self.monthly_debt).filter(|value| *value >= 0.0);
        if monthly_debt.is_none() {
            errors.insert(IntakeField::MonthlyDebt, DEBT_MESSAGE);
        }

        let income_history = match parse_income_history(&self.income_history) {
            Ok(history) => history,
            Err(message) => {
                errors.insert(IntakeField::IncomeHistory, message);
                None
            }
        };

        match (monthly_income, monthly_rent, liquid_savings, monthly_debt) {
            (Some(monthly_income), Some(monthly_rent), Some(liquid_savings), Some(monthly_debt)) => {
                errors.into_result(TenantInputPayload {
                    monthly_income,
                    monthly_rent,
                    liquid_savings,
                    monthly_debt,
                    income_history,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Submission body: typed numbers from API callers, or raw strings from a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionInput {
    Payload(TenantInputPayload),
    Form(TenantInputForm),
}

impl SubmissionInput {
    pub fn into_payload(self) -> Result<TenantInputPayload, ValidationErrors> {
        match self {
            Self::Payload(payload) => validate_payload(&payload).map(|()| payload),
            Self::Form(form) => form.validate(),
        }
    }
}

impl From<TenantInputPayload> for SubmissionInput {
    fn from(payload: TenantInputPayload) -> Self {
        Self::Payload(payload)
    }
}

impl From<TenantInputForm> for SubmissionInput {
    fn from(form: TenantInputForm) -> Self {
        Self::Form(form)
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Blank input means "not provided"; anything else must be 3-6 comma-separated amounts.
pub fn parse_income_history(raw: &str) -> Result<Option<Vec<f64>>, &'static str> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return Ok(None);
    }
    if !cleaned.contains(',') {
        return Err(HISTORY_FORMAT_MESSAGE);
    }

    let parts: Vec<&str> = cleaned
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if !(INCOME_HISTORY_MIN..=INCOME_HISTORY_MAX).contains(&parts.len()) {
        return Err(HISTORY_COUNT_MESSAGE);
    }

    let values = parts
        .iter()
        .map(|part| part.parse::<f64>().ok().filter(|value| value.is_finite()))
        .collect::<Option<Vec<f64>>>()
        .ok_or(HISTORY_NUMERIC_MESSAGE)?;

    if values.iter().any(|value| *value < 0.0) {
        return Err(HISTORY_NEGATIVE_MESSAGE);
    }

    Ok(Some(values))
}

/// Apply the same rules to a payload that arrived already typed (JSON or CLI flags).
pub fn validate_payload(payload: &TenantInputPayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if !(payload.monthly_income.is_finite() && payload.monthly_income > 0.0) {
        errors.insert(IntakeField::MonthlyIncome, INCOME_MESSAGE);
    }
    if !(payload.monthly_rent.is_finite() && payload.monthly_rent > 0.0) {
        errors.insert(IntakeField::MonthlyRent, RENT_MESSAGE);
    }
    if !(payload.liquid_savings.is_finite() && payload.liquid_savings >= 0.0) {
        errors.insert(IntakeField::LiquidSavings, SAVINGS_MESSAGE);
    }
    if !(payload.monthly_debt.is_finite() && payload.monthly_debt >= 0.0) {
        errors.insert(IntakeField::MonthlyDebt, DEBT_MESSAGE);
    }

    if let Some(history) = &payload.income_history {
        if !(INCOME_HISTORY_MIN..=INCOME_HISTORY_MAX).contains(&history.len()) {
            errors.insert(IntakeField::IncomeHistory, HISTORY_COUNT_MESSAGE);
        } else if history.iter().any(|value| !value.is_finite()) {
            errors.insert(IntakeField::IncomeHistory, HISTORY_NUMERIC_MESSAGE);
        } else if history.iter().any(|value| *value < 0.0) {
            errors.insert(IntakeField::IncomeHistory, HISTORY_NEGATIVE_MESSAGE);
        }
    }

    errors.into_result(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> TenantInputForm {
        TenantInputForm {
            monthly_income: "4800".to_string(),
            monthly_rent: "1500".to_string(),
            liquid_savings: "3000".to_string(),
            monthly_debt: "0".to_string(),
            income_history: String::new(),
        }
    }

    #[test]
    fn valid_form_produces_payload_without_history() {
        let payload = form().validate().expect("valid form");
        assert_eq!(payload.monthly_income, 4800.0);
        assert_eq!(payload.monthly_debt, 0.0);
        assert!(payload.income_history.is_none());
    }

    #[test]
    fn reports_every_failing_field() {
        let input = TenantInputForm {
            monthly_income: "0".to_string(),
            monthly_rent: " ".to_string(),
            liquid_savings: "-1".to_string(),
            monthly_debt: "lots".to_string(),
            income_history: "4800".to_string(),
        };

        let errors = input.validate().expect_err("all fields invalid");

        assert_eq!(errors.fields().count(), 5);
        assert_eq!(
            errors.get(IntakeField::MonthlyIncome),
            Some("Enter a monthly income greater than 0.")
        );
        assert_eq!(
            errors.get(IntakeField::MonthlyRent),
            Some("Enter a monthly rent greater than 0.")
        );
        assert_eq!(
            errors.get(IntakeField::IncomeHistory),
            Some(HISTORY_FORMAT_MESSAGE)
        );
    }

    #[test]
    fn income_history_rules() {
        assert_eq!(parse_income_history("  "), Ok(None));
        assert_eq!(
            parse_income_history("4800, 5000, 5200"),
            Ok(Some(vec![4800.0, 5000.0, 5200.0]))
        );
        assert_eq!(
            parse_income_history("4800, , 5000, 5200,"),
            Ok(Some(vec![4800.0, 5000.0, 5200.0]))
        );
        assert_eq!(
            parse_income_history("4800, 5000"),
            Err(HISTORY_COUNT_MESSAGE)
        );
        assert_eq!(
            parse_income_history("1,2,3,4,5,6,7"),
            Err(HISTORY_COUNT_MESSAGE)
        );
        assert_eq!(
            parse_income_history("4800, abc, 5200"),
            Err(HISTORY_NUMERIC_MESSAGE)
        );
        assert_eq!(
            parse_income_history("4800, inf, 5200"),
            Err(HISTORY_NUMERIC_MESSAGE)
        );
        assert_eq!(
            parse_income_history("4800, -10, 5200"),
            Err(HISTORY_NEGATIVE_MESSAGE)
        );
    }

    #[test]
    fn non_finite_amounts_are_rejected() {
        let mut input = form();
        input.monthly_income = "NaN".to_string();
        let errors = input.validate().expect_err("NaN is not an amount");
        assert!(errors.get(IntakeField::MonthlyIncome).is_some());
        assert!(errors.get(IntakeField::MonthlyRent).is_none());
    }

    #[test]
    fn typed_payloads_are_revalidated() {
        let mut payload = form().validate().expect("valid form");
        assert!(validate_payload(&payload).is_ok());

        payload.monthly_rent = 0.0;
        payload.income_history = Some(vec![1.0, 2.0]);
        let errors = validate_payload(&payload).expect_err("rent and history invalid");
        assert!(errors.get(IntakeField::MonthlyRent).is_some());
        assert_eq!(
            errors.get(IntakeField::IncomeHistory),
            Some(HISTORY_COUNT_MESSAGE)
        );
        assert!(errors.to_string().contains("Monthly rent"));
    }

    #[test]
    fn submission_bodies_accept_numbers_or_strings() {
        let typed: SubmissionInput = serde_json::from_value(serde_json::json!({
            "monthly_income": 4800,
            "monthly_rent": 1500,
            "liquid_savings": 3000,
            "monthly_debt": 0,
            "income_history": [4700, 4800, 4900]
        }))
        .expect("typed body");
        assert!(matches!(typed, SubmissionInput::Payload(_)));
        let payload = typed.into_payload().expect("valid");
        assert_eq!(payload.income_history, Some(vec![4700.0, 4800.0, 4900.0]));

        let form: SubmissionInput = serde_json::from_value(serde_json::json!({
            "monthly_income": "4800",
            "monthly_rent": "0",
            "liquid_savings": "3000",
            "monthly_debt": "0"
        }))
        .expect("form body");
        assert!(matches!(form, SubmissionInput::Form(_)));
        let errors = form.into_payload().expect_err("rent must be positive");
        assert_eq!(errors.get(IntakeField::MonthlyRent), Some(RENT_MESSAGE));
    }

    #[test]
    fn errors_serialize_by_field_name() {
        let mut input = form();
        input.monthly_rent = "-5".to_string();
        let errors = input.validate().expect_err("rent invalid");
        let encoded = serde_json::to_value(&errors).expect("encodes");
        assert_eq!(encoded["monthly_rent"], RENT_MESSAGE);
    }
}
