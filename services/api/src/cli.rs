use crate::commands::{run_batch, run_predict, run_schema, BatchArgs, PredictArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_eligibility::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Eligibility",
    about = "Encode loan applications and predict eligibility from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service and form page (default command)
    Serve(ServeArgs),
    /// Encode one application and predict its eligibility
    Predict(PredictArgs),
    /// Score every application in a CSV file
    Batch(BatchArgs),
    /// Print the classifier feature schema in order
    Schema,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured classifier artifact
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
        Command::Batch(args) => run_batch(args),
        Command::Schema => {
            run_schema();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_eligibility::eligibility::{HomeOwnership, LoanGrade, LoanIntent};

    #[test]
    fn predict_defaults_match_the_form() {
        let cli = Cli::try_parse_from(["loan-eligibility", "predict"]).expect("parses");

        match cli.command {
            Some(Command::Predict(args)) => {
                let application = args.application();
                assert_eq!(application.age, 30);
                assert_eq!(application.annual_income, 50_000.0);
                assert_eq!(application.home_ownership, HomeOwnership::Renter);
                assert_eq!(application.loan_intent, LoanIntent::RealEstate);
                assert_eq!(application.loan_grade, LoanGrade::A);
                assert!(!application.prior_default);
            }
            other => panic!("expected predict command, got {other:?}"),
        }
    }

    #[test]
    fn predict_accepts_category_labels() {
        let cli = Cli::try_parse_from([
            "loan-eligibility",
            "predict",
            "--home-ownership",
            "Propriétaire",
            "--loan-intent",
            "voiture",
            "--loan-grade",
            "d",
            "--prior-default",
            "--income",
            "65000",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Predict(args)) => {
                let application = args.application();
                assert_eq!(application.home_ownership, HomeOwnership::Owner);
                assert_eq!(application.loan_intent, LoanIntent::Vehicle);
                assert_eq!(application.loan_grade, LoanGrade::D);
                assert!(application.prior_default);
                assert_eq!(application.annual_income, 65_000.0);
            }
            other => panic!("expected predict command, got {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["loan-eligibility"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "loan-eligibility",
            "serve",
            "--port",
            "8080",
            "--model",
            "models/other.json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.model, Some(PathBuf::from("models/other.json")));
                assert!(args.host.is_none());
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
