use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::domain::{
    parse_flag, Category, CategoryParseError, HomeOwnership, LoanGrade, LoanIntent,
    RawApplication,
};

/// Errors raised while reading a batch of applications.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to open batch file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("row {row}: {field} {source}")]
    Field {
        row: usize,
        field: &'static str,
        #[source]
        source: CategoryParseError,
    },
    #[error("row {row}: {field} must be a finite number")]
    NonFinite { row: usize, field: &'static str },
    #[error("batch contains no applications")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct CsvApplication {
    age: u32,
    annual_income: f64,
    employment_length_years: u32,
    loan_amount: f64,
    interest_rate_pct: f64,
    credit_history_years: u32,
    home_ownership: String,
    prior_default: String,
    loan_intent: String,
    loan_grade: String,
}

impl CsvApplication {
    fn into_application(self, row: usize) -> Result<RawApplication, BatchError> {
        for (field, value) in [
            ("annual_income", self.annual_income),
            ("loan_amount", self.loan_amount),
            ("interest_rate_pct", self.interest_rate_pct),
        ] {
            if !value.is_finite() {
                return Err(BatchError::NonFinite { row, field });
            }
        }

        let field = |name| field_error(row, name);

        Ok(RawApplication {
            age: self.age,
            annual_income: self.annual_income,
            employment_length_years: self.employment_length_years,
            loan_amount: self.loan_amount,
            interest_rate_pct: self.interest_rate_pct,
            credit_history_years: self.credit_history_years,
            home_ownership: HomeOwnership::parse_lenient(&self.home_ownership)
                .map_err(field("home_ownership"))?,
            prior_default: parse_flag(&self.prior_default).map_err(field("prior_default"))?,
            loan_intent: LoanIntent::parse_lenient(&self.loan_intent)
                .map_err(field("loan_intent"))?,
            loan_grade: LoanGrade::parse_lenient(&self.loan_grade).map_err(field("loan_grade"))?,
        })
    }
}

fn field_error(row: usize, field: &'static str) -> impl FnOnce(CategoryParseError) -> BatchError {
    move |source| BatchError::Field { row, field, source }
}

/// Read applications from CSV with a header row.
pub fn read_applications<R: Read>(reader: R) -> Result<Vec<RawApplication>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut applications = Vec::new();
    for (index, record) in csv_reader.deserialize::<CsvApplication>().enumerate() {
        let row = index + 1;
        let record = record.map_err(|source| BatchError::Csv { row, source })?;
        applications.push(record.into_application(row)?);
    }

    if applications.is_empty() {
        return Err(BatchError::Empty);
    }

    Ok(applications)
}

pub fn read_applications_from_path(path: impl AsRef<Path>) -> Result<Vec<RawApplication>, BatchError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_applications(file)
}
