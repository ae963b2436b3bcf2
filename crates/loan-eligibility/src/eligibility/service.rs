use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::classifier::{Classifier, ClassifierError};
use super::decision::{decide, Prediction, ProportionChart};
use super::domain::{InputAdjustment, RawApplication};
use super::encoder::{encode, FeatureEntry, FeatureVector};

/// Service composing the encoder, classifier, and decision renderer.
pub struct EligibilityService<C: ?Sized> {
    classifier: Arc<C>,
}

impl<C> Clone for EligibilityService<C>
where
    C: ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
        }
    }
}

/// What the form shows before the applicant asks for a decision.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationPreview {
    pub application: RawApplication,
    pub adjustments: Vec<InputAdjustment>,
    pub loan_to_income_ratio: f64,
    pub features: Vec<FeatureEntry>,
    pub chart: ProportionChart,
    #[serde(skip)]
    pub vector: FeatureVector,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    #[serde(flatten)]
    pub preview: ApplicationPreview,
    pub prediction: Prediction,
    pub label: i64,
    pub message: &'static str,
    pub decided_at: DateTime<Utc>,
}

/// Per-row result of a batch run, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub row: usize,
    pub loan_to_income_ratio: f64,
    pub prediction: Prediction,
    pub label: i64,
    pub adjustments: Vec<InputAdjustment>,
}

impl<C> EligibilityService<C>
where
    C: Classifier + ?Sized,
{
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Clamp, encode, and chart an application without calling the classifier.
    pub fn preview(&self, application: RawApplication) -> ApplicationPreview {
        let (application, adjustments) = application.clamped();
        let vector = encode(&application);

        ApplicationPreview {
            loan_to_income_ratio: vector.loan_to_income_ratio(),
            features: vector.entries(),
            chart: ProportionChart::income_vs_loan(&application),
            application,
            adjustments,
            vector,
        }
    }

    /// Preview the application and ask the classifier for a decision.
    pub fn predict(&self, application: RawApplication) -> Result<EligibilityReport, ClassifierError> {
        let preview = self.preview(application);
        let (prediction, label) = decide(&*self.classifier, &preview.vector)?;

        info!(
            label,
            prediction = prediction.label(),
            loan_to_income_ratio = preview.loan_to_income_ratio,
            "eligibility decided"
        );

        Ok(EligibilityReport {
            preview,
            prediction,
            label,
            message: prediction.message(),
            decided_at: Utc::now(),
        })
    }

    /// Score many applications with a single classifier call.
    pub fn predict_batch(
        &self,
        applications: Vec<RawApplication>,
    ) -> Result<Vec<BatchOutcome>, ClassifierError> {
        let prepared: Vec<_> = applications
            .into_iter()
            .map(|application| {
                let (application, adjustments) = application.clamped();
                (encode(&application), adjustments)
            })
            .collect();

        let rows: Vec<FeatureVector> = prepared.iter().map(|(vector, _)| *vector).collect();
        let labels = self.classifier.predict(&rows)?;
        if labels.len() != rows.len() {
            return Err(ClassifierError::LabelCount {
                expected: rows.len(),
                found: labels.len(),
            });
        }

        info!(rows = rows.len(), "batch scored");

        Ok(prepared
            .into_iter()
            .zip(labels)
            .enumerate()
            .map(|(index, ((vector, adjustments), label))| BatchOutcome {
                row: index + 1,
                loan_to_income_ratio: vector.loan_to_income_ratio(),
                prediction: Prediction::from_label(label),
                label,
                adjustments,
            })
            .collect())
    }
}
