use serde::Serialize;

use super::domain::{Category, HomeOwnership, LoanGrade, LoanIntent, RawApplication};

/// Columns the classifier was trained on, in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "person_age",
    "person_income",
    "person_emp_length",
    "loan_amnt",
    "loan_int_rate",
    "loan_percent_income",
    "cb_person_cred_hist_length",
    "person_home_ownership_1",
    "person_home_ownership_2",
    "person_home_ownership_3",
    "loan_intent_1",
    "loan_intent_2",
    "loan_intent_3",
    "loan_intent_4",
    "loan_intent_5",
    "loan_grade_1",
    "loan_grade_2",
    "loan_grade_3",
    "loan_grade_4",
    "loan_grade_5",
    "loan_grade_6",
    "cb_person_default_on_file_1",
];

pub const FEATURE_COUNT: usize = 22;

const NUMERIC_WIDTH: usize = 7;
const HOME_OWNERSHIP_OFFSET: usize = NUMERIC_WIDTH;
const LOAN_INTENT_OFFSET: usize = HOME_OWNERSHIP_OFFSET + HomeOwnership::ALL.len();
const LOAN_GRADE_OFFSET: usize = LOAN_INTENT_OFFSET + LoanIntent::ALL.len();
const PRIOR_DEFAULT_OFFSET: usize = LOAN_GRADE_OFFSET + LoanGrade::ALL.len();

const _: () = assert!(PRIOR_DEFAULT_OFFSET + 1 == FEATURE_COUNT);

/// Fixed-order numeric encoding of one application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a column by its schema name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|index| self.values[index])
    }

    pub fn loan_to_income_ratio(&self) -> f64 {
        self.values[5]
    }

    /// Name/value pairs in schema order for the read-only preview.
    pub fn entries(&self) -> Vec<FeatureEntry> {
        FEATURE_NAMES
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| FeatureEntry { name, value: *value })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureEntry {
    pub name: &'static str,
    pub value: f64,
}

/// Encode an application into the classifier's input schema.
pub fn encode(application: &RawApplication) -> FeatureVector {
    let mut values = [0.0; FEATURE_COUNT];

    values[0] = f64::from(application.age);
    values[1] = application.annual_income;
    values[2] = f64::from(application.employment_length_years);
    values[3] = application.loan_amount;
    values[4] = application.interest_rate_pct;
    values[5] = application.loan_to_income_ratio();
    values[6] = f64::from(application.credit_history_years);

    write_one_hot(
        &mut values[HOME_OWNERSHIP_OFFSET..LOAN_INTENT_OFFSET],
        application.home_ownership,
    );
    write_one_hot(
        &mut values[LOAN_INTENT_OFFSET..LOAN_GRADE_OFFSET],
        application.loan_intent,
    );
    write_one_hot(
        &mut values[LOAN_GRADE_OFFSET..PRIOR_DEFAULT_OFFSET],
        application.loan_grade,
    );
    values[PRIOR_DEFAULT_OFFSET] = if application.prior_default { 1.0 } else { 0.0 };

    FeatureVector { values }
}

fn write_one_hot<C: Category>(block: &mut [f64], selected: C) {
    for (slot, candidate) in block.iter_mut().zip(C::all()) {
        *slot = if *candidate == selected { 1.0 } else { 0.0 };
    }
}
