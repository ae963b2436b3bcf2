use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::eligibility::classifier::{
    Classifier, ClassifierError, DecisionTree, TreeEnsembleArtifact, TreeNode,
};
use crate::eligibility::domain::{HomeOwnership, LoanGrade, LoanIntent, RawApplication};
use crate::eligibility::encoder::{FeatureVector, FEATURE_NAMES};
use crate::eligibility::service::EligibilityService;

/// Application from the worked example: Owner, Vehicle, grade A, no default.
pub(super) fn owner_vehicle_application() -> RawApplication {
    RawApplication {
        age: 30,
        annual_income: 50_000.0,
        employment_length_years: 5,
        loan_amount: 10_000.0,
        interest_rate_pct: 10.0,
        credit_history_years: 10,
        home_ownership: HomeOwnership::Owner,
        prior_default: false,
        loan_intent: LoanIntent::Vehicle,
        loan_grade: LoanGrade::A,
    }
}

pub(super) fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
}

pub(super) fn leaf(approve: f64, reject: f64) -> TreeNode {
    TreeNode::Leaf {
        value: vec![approve, reject],
    }
}

pub(super) fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
    TreeNode::Split {
        feature,
        threshold,
        left,
        right,
    }
}

/// Two stumps: high loan-to-income rejects, a prior default rejects.
pub(super) fn stump_artifact() -> TreeEnsembleArtifact {
    TreeEnsembleArtifact {
        feature_names: feature_names(),
        classes: vec![0, 1],
        trees: vec![
            DecisionTree {
                nodes: vec![split(5, 0.3, 1, 2), leaf(9.0, 1.0), leaf(1.0, 9.0)],
            },
            DecisionTree {
                nodes: vec![split(21, 0.5, 1, 2), leaf(8.0, 2.0), leaf(2.0, 8.0)],
            },
        ],
    }
}

/// Stub that records every batch of rows it is asked about.
pub(super) struct RecordingClassifier {
    pub(super) label: i64,
    pub(super) calls: Mutex<Vec<Vec<FeatureVector>>>,
    names: Vec<String>,
}

impl RecordingClassifier {
    pub(super) fn with_label(label: i64) -> Self {
        Self {
            label,
            calls: Mutex::new(Vec::new()),
            names: feature_names(),
        }
    }

    pub(super) fn calls(&self) -> Vec<Vec<FeatureVector>> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

impl Classifier for RecordingClassifier {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<i64>, ClassifierError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(rows.to_vec());
        Ok(vec![self.label; rows.len()])
    }
}

/// Stub that answers with nothing at all.
pub(super) struct SilentClassifier;

impl Classifier for SilentClassifier {
    fn feature_names(&self) -> &[String] {
        &[]
    }

    fn predict(&self, _rows: &[FeatureVector]) -> Result<Vec<i64>, ClassifierError> {
        Ok(Vec::new())
    }
}

pub(super) fn service_with_label(
    label: i64,
) -> (
    EligibilityService<RecordingClassifier>,
    Arc<RecordingClassifier>,
) {
    let classifier = Arc::new(RecordingClassifier::with_label(label));
    (EligibilityService::new(classifier.clone()), classifier)
}

pub(super) const CSV_HEADER: &str = "age,annual_income,employment_length_years,loan_amount,interest_rate_pct,credit_history_years,home_ownership,prior_default,loan_intent,loan_grade\n";

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
