use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::batch::read_applications;
use super::classifier::Classifier;
use super::domain::{
    Category, HomeOwnership, InputBounds, LoanGrade, LoanIntent, RawApplication, AGE_BOUNDS,
    ANNUAL_INCOME_BOUNDS, CREDIT_HISTORY_BOUNDS, EMPLOYMENT_LENGTH_BOUNDS, INTEREST_RATE_BOUNDS,
    LOAN_AMOUNT_BOUNDS,
};
use super::encoder::FEATURE_NAMES;
use super::service::EligibilityService;

const FORM_PAGE: &str = include_str!("../../assets/form.html");

/// Router exposing the form page and the eligibility JSON endpoints.
pub fn eligibility_router<C>(service: Arc<EligibilityService<C>>) -> Router
where
    C: Classifier + ?Sized + 'static,
{
    Router::new()
        .route("/", get(form_handler))
        .route("/api/v1/eligibility/schema", get(schema_handler))
        .route(
            "/api/v1/eligibility/preview",
            post(preview_handler::<C>),
        )
        .route(
            "/api/v1/eligibility/predict",
            post(predict_handler::<C>),
        )
        .route("/api/v1/eligibility/batch", post(batch_handler::<C>))
        .with_state(service)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub csv: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaView {
    pub features: Vec<&'static str>,
    pub bounds: BoundsView,
    pub home_ownership: Vec<OptionView>,
    pub loan_intent: Vec<OptionView>,
    pub loan_grade: Vec<OptionView>,
    pub defaults: RawApplication,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundsView {
    pub age: InputBounds<u32>,
    pub annual_income: InputBounds<f64>,
    pub employment_length_years: InputBounds<u32>,
    pub loan_amount: InputBounds<f64>,
    pub interest_rate_pct: InputBounds<f64>,
    pub credit_history_years: InputBounds<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub value: &'static str,
    pub label: &'static str,
}

fn options<C: Category>() -> Vec<OptionView> {
    C::all()
        .iter()
        .map(|option| OptionView {
            value: option.wire_name(),
            label: option.label(),
        })
        .collect()
}

pub fn schema_view() -> SchemaView {
    SchemaView {
        features: FEATURE_NAMES.to_vec(),
        bounds: BoundsView {
            age: AGE_BOUNDS,
            annual_income: ANNUAL_INCOME_BOUNDS,
            employment_length_years: EMPLOYMENT_LENGTH_BOUNDS,
            loan_amount: LOAN_AMOUNT_BOUNDS,
            interest_rate_pct: INTEREST_RATE_BOUNDS,
            credit_history_years: CREDIT_HISTORY_BOUNDS,
        },
        home_ownership: options::<HomeOwnership>(),
        loan_intent: options::<LoanIntent>(),
        loan_grade: options::<LoanGrade>(),
        defaults: RawApplication::default(),
    }
}

pub(crate) async fn form_handler() -> Response {
    (
        [(header::CONTENT_TYPE, mime::TEXT_HTML_UTF_8.as_ref())],
        FORM_PAGE,
    )
        .into_response()
}

pub(crate) async fn schema_handler() -> Json<SchemaView> {
    Json(schema_view())
}

pub(crate) async fn preview_handler<C>(
    State(service): State<Arc<EligibilityService<C>>>,
    Json(application): Json<RawApplication>,
) -> Response
where
    C: Classifier + ?Sized + 'static,
{
    let preview = service.preview(application);
    (StatusCode::OK, Json(preview)).into_response()
}

pub(crate) async fn predict_handler<C>(
    State(service): State<Arc<EligibilityService<C>>>,
    Json(application): Json<RawApplication>,
) -> Response
where
    C: Classifier + ?Sized + 'static,
{
    match service.predict(application) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn batch_handler<C>(
    State(service): State<Arc<EligibilityService<C>>>,
    Json(request): Json<BatchRequest>,
) -> Response
where
    C: Classifier + ?Sized + 'static,
{
    let applications = match read_applications(Cursor::new(request.csv.into_bytes())) {
        Ok(applications) => applications,
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };

    match service.predict_batch(applications) {
        Ok(outcomes) => (StatusCode::OK, Json(json!({ "outcomes": outcomes }))).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
