use crate::screening::{run_compare, run_score, CompareArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fair_tenant::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "FairTenant",
    about = "Serve and run cash-flow tenant screening from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score one applicant and print the interpreted result
    Score(ScoreArgs),
    /// Compare the legacy and candidate models for an applicant
    Compare(CompareArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args).await,
        Command::Compare(args) => run_compare(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["fair-tenant-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn score_accepts_raw_string_inputs() {
        let cli = Cli::try_parse_from([
            "fair-tenant-api",
            "score",
            "--monthly-income",
            "4800",
            "--monthly-rent",
            "1500",
            "--liquid-savings",
            "3000",
            "--monthly-debt",
            "0",
            "--income-history",
            "4700, 4800, 4900",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.applicant.monthly_income, "4800");
                assert_eq!(
                    args.applicant.income_history.as_deref(),
                    Some("4700, 4800, 4900")
                );
            }
            other => panic!("expected score command, got {other:?}"),
        }
    }

    #[test]
    fn compare_flags_are_optional() {
        let cli = Cli::try_parse_from(["fair-tenant-api", "compare", "--session", "desk-1"])
            .expect("parses");
        match cli.command {
            Some(Command::Compare(args)) => {
                assert!(args.applicant.is_empty());
                assert_eq!(args.output.session.as_deref(), Some("desk-1"));
            }
            other => panic!("expected compare command, got {other:?}"),
        }
    }
}
