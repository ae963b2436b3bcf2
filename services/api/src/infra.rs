use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use loan_eligibility::config::ModelConfig;
use loan_eligibility::eligibility::{
    Category, HomeOwnership, LoanGrade, LoanIntent, TreeEnsembleClassifier,
};
use loan_eligibility::error::AppError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Load the classifier artifact once; any failure stops the process.
pub(crate) fn load_classifier(
    config: &ModelConfig,
    override_path: Option<PathBuf>,
) -> Result<Arc<TreeEnsembleClassifier>, AppError> {
    let path = override_path.unwrap_or_else(|| config.artifact_path.clone());
    let classifier = TreeEnsembleClassifier::from_path(path, config.schema_check)?;
    Ok(Arc::new(classifier))
}

pub(crate) fn parse_home_ownership(raw: &str) -> Result<HomeOwnership, String> {
    HomeOwnership::parse_lenient(raw).map_err(|err| err.to_string())
}

pub(crate) fn parse_loan_intent(raw: &str) -> Result<LoanIntent, String> {
    LoanIntent::parse_lenient(raw).map_err(|err| err.to_string())
}

pub(crate) fn parse_loan_grade(raw: &str) -> Result<LoanGrade, String> {
    LoanGrade::parse_lenient(raw).map_err(|err| err.to_string())
}
