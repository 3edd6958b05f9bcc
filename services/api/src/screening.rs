use crate::infra::{cli_service, cli_session};
use crate::render::{render_comparison, render_evaluation, render_validation};
use clap::Args;
use fair_tenant::config::AppConfig;
use fair_tenant::error::AppError;
use fair_tenant::workflows::screening::{
    NavigationState, ScreeningServiceError, SubmissionInput, TenantInputForm,
};
use serde::Serialize;

#[derive(Args, Debug)]
pub(crate) struct ApplicantArgs {
    /// Gross monthly income (must be greater than 0)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) monthly_income: String,
    /// Monthly rent for the unit (must be greater than 0)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) monthly_rent: String,
    /// Liquid savings available (0 or more)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) liquid_savings: String,
    /// Monthly debt payments (0 or more)
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) monthly_debt: String,
    /// Optional 3-6 recent monthly incomes, comma separated
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) income_history: Option<String>,
}

impl ApplicantArgs {
    fn into_form(self) -> TenantInputForm {
        TenantInputForm {
            monthly_income: self.monthly_income,
            monthly_rent: self.monthly_rent,
            liquid_savings: self.liquid_savings,
            monthly_debt: self.monthly_debt,
            income_history: self.income_history.unwrap_or_default(),
        }
    }
}

/// Applicant flags for `compare`; omit them all to reuse the last scored applicant.
#[derive(Args, Debug, Default)]
pub(crate) struct OptionalApplicantArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) monthly_income: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) monthly_rent: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) liquid_savings: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) monthly_debt: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) income_history: Option<String>,
}

impl OptionalApplicantArgs {
    pub(crate) fn is_empty(&self) -> bool {
        self.monthly_income.is_none()
            && self.monthly_rent.is_none()
            && self.liquid_savings.is_none()
            && self.monthly_debt.is_none()
            && self.income_history.is_none()
    }

    fn into_form(self) -> Option<TenantInputForm> {
        if self.is_empty() {
            return None;
        }
        Some(TenantInputForm {
            monthly_income: self.monthly_income.unwrap_or_default(),
            monthly_rent: self.monthly_rent.unwrap_or_default(),
            liquid_savings: self.liquid_savings.unwrap_or_default(),
            monthly_debt: self.monthly_debt.unwrap_or_default(),
            income_history: self.income_history.unwrap_or_default(),
        })
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct OutputArgs {
    /// Session whose cached submission is read and written
    #[arg(long)]
    pub(crate) session: Option<String>,
    /// Print the JSON view instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    #[command(flatten)]
    pub(crate) applicant: ApplicantArgs,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    #[command(flatten)]
    pub(crate) applicant: OptionalApplicantArgs,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs { applicant, output } = args;
    let config = AppConfig::load()?;
    let service = cli_service(&config)?;
    let session = cli_session(output.session.as_deref())?;

    let input = SubmissionInput::Form(applicant.into_form());
    match service.evaluate(&session, input).await {
        Ok(view) => {
            emit(&view, output.json, || render_evaluation(&view));
            Ok(())
        }
        Err(err) => Err(report_failure(err)),
    }
}

pub(crate) async fn run_compare(args: CompareArgs) -> Result<(), AppError> {
    let CompareArgs { applicant, output } = args;
    let config = AppConfig::load()?;
    let service = cli_service(&config)?;
    let session = cli_session(output.session.as_deref())?;

    let navigation = match applicant.into_form() {
        Some(form) => match form.validate() {
            Ok(payload) => NavigationState::with_payload(payload),
            Err(errors) => return Err(report_failure(errors.into())),
        },
        None => NavigationState::default(),
    };

    match service.compare(&session, navigation).await {
        Ok(report) => {
            emit(&report, output.json, || render_comparison(&report));
            Ok(())
        }
        Err(err) => Err(report_failure(err)),
    }
}

fn emit<T: Serialize>(view: &T, json: bool, text: impl FnOnce() -> String) {
    if json {
        match serde_json::to_string_pretty(view) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("JSON view unavailable: {}", err),
        }
    } else {
        print!("{}", text());
    }
}

fn report_failure(err: ScreeningServiceError) -> AppError {
    if let ScreeningServiceError::Validation(errors) = &err {
        print!("{}", render_validation(errors));
    }
    err.into()
}
