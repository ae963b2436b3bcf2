use serde::{Deserialize, Serialize};

use super::classifier::{Classifier, ClassifierError};
use super::domain::RawApplication;
use super::encoder::FeatureVector;

/// Eligibility outcome shown to the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    Approved,
    Rejected,
}

impl Prediction {
    /// Label 0 approves; every other label rejects.
    pub fn from_label(label: i64) -> Self {
        if label == 0 {
            Self::Approved
        } else {
            Self::Rejected
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Approved => "Congratulations! The loan is approved.",
            Self::Rejected => "Sorry, the loan is rejected.",
        }
    }
}

/// Run the classifier on a single row and map its label.
pub fn decide<C>(classifier: &C, features: &FeatureVector) -> Result<(Prediction, i64), ClassifierError>
where
    C: Classifier + ?Sized,
{
    let label = classifier
        .predict(std::slice::from_ref(features))?
        .first()
        .copied()
        .ok_or(ClassifierError::EmptyPrediction)?;
    Ok((Prediction::from_label(label), label))
}

/// Two-slice comparison of income against the requested amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionChart {
    pub title: &'static str,
    pub slices: [ChartSlice; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: &'static str,
    pub value: f64,
    pub share: f64,
}

impl ProportionChart {
    pub fn income_vs_loan(application: &RawApplication) -> Self {
        let income = application.annual_income;
        let loan = application.loan_amount;
        let total = income + loan;

        Self {
            title: "Income vs requested amount",
            slices: [
                ChartSlice {
                    label: "Income",
                    value: income,
                    share: income / total,
                },
                ChartSlice {
                    label: "Loan amount",
                    value: loan,
                    share: loan / total,
                },
            ],
        }
    }

    /// Horizontal bars for terminal output.
    pub fn render_text(&self, width: usize) -> String {
        let label_width = self
            .slices
            .iter()
            .map(|slice| slice.label.len())
            .max()
            .unwrap_or_default();

        let mut out = format!("{}\n", self.title);
        for slice in &self.slices {
            let filled = (slice.share * width as f64).round() as usize;
            out.push_str(&format!(
                "{:<label_width$} |{:<width$}| {:>5.1}% ({:.0})\n",
                slice.label,
                "#".repeat(filled.min(width)),
                slice.share * 100.0,
                slice.value,
            ));
        }
        out
    }
}
