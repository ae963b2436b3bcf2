use crate::infra::{load_classifier, parse_home_ownership, parse_loan_grade, parse_loan_intent};
use chrono::SecondsFormat;
use clap::Args;
use loan_eligibility::config::AppConfig;
use loan_eligibility::eligibility::{
    read_applications_from_path, ApplicationPreview, BatchOutcome, Category,
    EligibilityReport, EligibilityService, HomeOwnership, LoanGrade, LoanIntent, Prediction,
    RawApplication, FEATURE_NAMES,
};
use loan_eligibility::error::AppError;
use std::path::PathBuf;

const CHART_WIDTH: usize = 40;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Applicant age (18-100)
    #[arg(long, default_value_t = 30)]
    pub(crate) age: u32,
    /// Annual income (5000-500000)
    #[arg(long, default_value_t = 50_000.0)]
    pub(crate) income: f64,
    /// Years in current employment (0-50)
    #[arg(long, default_value_t = 5)]
    pub(crate) employment_length: u32,
    /// Requested loan amount (1000-50000)
    #[arg(long, default_value_t = 10_000.0)]
    pub(crate) loan_amount: f64,
    /// Interest rate in percent (1-30)
    #[arg(long, default_value_t = 10.0)]
    pub(crate) interest_rate: f64,
    /// Length of credit history in years (0-50)
    #[arg(long, default_value_t = 10)]
    pub(crate) credit_history: u32,
    /// renter, owner, or mortgage
    #[arg(long, value_parser = parse_home_ownership, default_value = "renter")]
    pub(crate) home_ownership: HomeOwnership,
    /// Applicant has a prior default on file
    #[arg(long)]
    pub(crate) prior_default: bool,
    /// real_estate, vehicle, education, business, or wedding
    #[arg(long, value_parser = parse_loan_intent, default_value = "real_estate")]
    pub(crate) loan_intent: LoanIntent,
    /// Loan grade A-F
    #[arg(long, value_parser = parse_loan_grade, default_value = "A")]
    pub(crate) loan_grade: LoanGrade,
    /// Show the encoded vector and chart without asking the classifier
    #[arg(long)]
    pub(crate) preview_only: bool,
    /// Override the configured classifier artifact
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

impl PredictArgs {
    pub(crate) fn application(&self) -> RawApplication {
        RawApplication {
            age: self.age,
            annual_income: self.income,
            employment_length_years: self.employment_length,
            loan_amount: self.loan_amount,
            interest_rate_pct: self.interest_rate,
            credit_history_years: self.credit_history,
            home_ownership: self.home_ownership,
            prior_default: self.prior_default,
            loan_intent: self.loan_intent,
            loan_grade: self.loan_grade,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with one application per row
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Override the configured classifier artifact
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let classifier = load_classifier(&config.model, args.model.clone())?;
    let service = EligibilityService::new(classifier);
    let application = args.application();

    if args.preview_only {
        print!("{}", render_preview(&service.preview(application)));
        return Ok(());
    }

    let report = service.predict(application)?;
    print!("{}", render_report(&report));
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let applications = read_applications_from_path(&args.input)?;
    let classifier = load_classifier(&config.model, args.model)?;
    let service = EligibilityService::new(classifier);

    let outcomes = service.predict_batch(applications)?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&outcomes)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        print!("{}", render_batch(&outcomes));
    }
    Ok(())
}

pub(crate) fn run_schema() {
    println!("Classifier feature schema ({} columns)", FEATURE_NAMES.len());
    for (index, name) in FEATURE_NAMES.iter().enumerate() {
        println!("{:>2}. {name}", index + 1);
    }
}

pub(crate) fn render_preview(preview: &ApplicationPreview) -> String {
    let application = &preview.application;
    let mut out = String::from("Loan eligibility\n");

    out.push_str(&format!(
        "Applicant: age {}, income {:.0}, employed {} years, credit history {} years\n",
        application.age,
        application.annual_income,
        application.employment_length_years,
        application.credit_history_years
    ));
    out.push_str(&format!(
        "Loan: {:.0} at {:.1}% for {} (grade {}), housing {}, prior default {}\n",
        application.loan_amount,
        application.interest_rate_pct,
        application.loan_intent.label(),
        application.loan_grade.label(),
        application.home_ownership.label(),
        if application.prior_default { "yes" } else { "no" }
    ));
    out.push_str(&format!(
        "Loan to income ratio: {:.2}\n",
        preview.loan_to_income_ratio
    ));

    for adjustment in &preview.adjustments {
        out.push_str(&format!(
            "Adjusted {} from {} to {}\n",
            adjustment.field, adjustment.entered, adjustment.applied
        ));
    }

    out.push_str("\nData sent to the model\n");
    for entry in &preview.features {
        out.push_str(&format!("- {}: {}\n", entry.name, entry.value));
    }

    out.push('\n');
    out.push_str(&preview.chart.render_text(CHART_WIDTH));
    out
}

pub(crate) fn render_report(report: &EligibilityReport) -> String {
    let mut out = render_preview(&report.preview);
    out.push_str(&format!(
        "\nDecision: {} (label {}) at {}\n{}\n",
        report.prediction.label(),
        report.label,
        report
            .decided_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        report.message
    ));
    out
}

pub(crate) fn render_batch(outcomes: &[BatchOutcome]) -> String {
    let mut out = String::from("row | ratio | decision\n");
    for outcome in outcomes {
        let note = if outcome.adjustments.is_empty() {
            String::new()
        } else {
            let fields: Vec<_> = outcome
                .adjustments
                .iter()
                .map(|adjustment| adjustment.field)
                .collect();
            format!(" (clamped {})", fields.join(", "))
        };
        out.push_str(&format!(
            "{:>3} | {:>5.2} | {}{}\n",
            outcome.row,
            outcome.loan_to_income_ratio,
            outcome.prediction.label(),
            note
        ));
    }

    let approved = outcomes
        .iter()
        .filter(|outcome| outcome.prediction == Prediction::Approved)
        .count();
    out.push_str(&format!(
        "{approved} of {} applications approved\n",
        outcomes.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_eligibility::eligibility::FixedLabelClassifier;
    use std::sync::Arc;

    fn owner_vehicle() -> RawApplication {
        RawApplication {
            home_ownership: HomeOwnership::Owner,
            loan_intent: LoanIntent::Vehicle,
            ..RawApplication::default()
        }
    }

    #[test]
    fn report_lists_vector_and_decision() {
        let service = EligibilityService::new(Arc::new(FixedLabelClassifier::new(0)));
        let report = service.predict(owner_vehicle()).expect("predicts");

        let text = render_report(&report);

        assert!(text.contains("Loan to income ratio: 0.20"));
        assert!(text.contains("- person_home_ownership_2: 1\n"));
        assert!(text.contains("- loan_intent_2: 1\n"));
        assert!(text.contains("Decision: Approved (label 0)"));
        assert!(text.contains("Congratulations! The loan is approved."));
        assert!(text.contains("Income vs requested amount"));
    }

    #[test]
    fn preview_mentions_clamped_fields() {
        let service = EligibilityService::new(Arc::new(FixedLabelClassifier::new(1)));
        let preview = service.preview(RawApplication {
            interest_rate_pct: 45.0,
            ..owner_vehicle()
        });

        let text = render_preview(&preview);

        assert!(text.contains("Adjusted interest_rate_pct from 45 to 30"));
        assert!(!text.contains("Decision"));
    }

    #[test]
    fn batch_table_counts_approvals() {
        let service = EligibilityService::new(Arc::new(FixedLabelClassifier::new(1)));
        let outcomes = service
            .predict_batch(vec![owner_vehicle(), RawApplication::default()])
            .expect("scores");

        let text = render_batch(&outcomes);

        assert!(text.contains("  1 |  0.20 | Rejected\n"));
        assert!(text.ends_with("0 of 2 applications approved\n"));
    }
}
