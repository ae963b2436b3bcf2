use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::eligibility::router::{self, eligibility_router, BatchRequest};
use crate::eligibility::service::EligibilityService;

fn json_request(path: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request builds")
}

fn worked_example_json() -> Value {
    json!({
        "age": 30,
        "annual_income": 50000,
        "employment_length_years": 5,
        "loan_amount": 10000,
        "interest_rate_pct": 10.0,
        "credit_history_years": 10,
        "home_ownership": "owner",
        "prior_default": false,
        "loan_intent": "vehicle",
        "loan_grade": "A"
    })
}

#[tokio::test]
async fn predict_route_returns_report() {
    let (service, _) = service_with_label(0);
    let app = eligibility_router(Arc::new(service));

    let response = app
        .oneshot(json_request(
            "/api/v1/eligibility/predict",
            &worked_example_json(),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["prediction"], "approved");
    assert_eq!(body["label"], 0);
    assert_eq!(body["loan_to_income_ratio"], 0.2);
    assert_eq!(body["features"].as_array().map(Vec::len), Some(22));
    assert!(body["decided_at"].is_string());
}

#[tokio::test]
async fn preview_route_skips_the_decision() {
    let (service, classifier) = service_with_label(1);
    let app = eligibility_router(Arc::new(service));

    let response = app
        .oneshot(json_request(
            "/api/v1/eligibility/preview",
            &worked_example_json(),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert!(body.get("prediction").is_none());
    assert_eq!(body["chart"]["slices"][1]["label"], "Loan amount");
    assert!(classifier.calls().is_empty());
}

#[tokio::test]
async fn unknown_category_is_rejected_by_extractor() {
    let (service, _) = service_with_label(0);
    let app = eligibility_router(Arc::new(service));
    let mut payload = worked_example_json();
    payload["loan_grade"] = json!("G");

    let response = app
        .oneshot(json_request("/api/v1/eligibility/predict", &payload))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn predict_handler_reports_classifier_failure() {
    let service = Arc::new(EligibilityService::new(Arc::new(SilentClassifier)));

    let response = router::predict_handler::<SilentClassifier>(
        State(service),
        axum::Json(owner_vehicle_application()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "classifier returned no label");
}

#[tokio::test]
async fn batch_handler_scores_csv() {
    let (service, _) = service_with_label(0);
    let csv = format!(
        "{CSV_HEADER}30,50000,5,10000,10.0,10,owner,no,vehicle,A\n52,120000,20,35000,7.5,25,Hypothèque,non,Mariage,B\n"
    );

    let response = router::batch_handler::<RecordingClassifier>(
        State(Arc::new(service)),
        axum::Json(BatchRequest { csv }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let outcomes = body["outcomes"].as_array().expect("outcomes array");
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[1]["loan_to_income_ratio"], 0.29);
    assert_eq!(outcomes[1]["prediction"], "approved");
}

#[tokio::test]
async fn batch_handler_rejects_bad_csv() {
    let (service, classifier) = service_with_label(0);
    let csv = format!("{CSV_HEADER}30,50000,5,10000,10.0,10,igloo,no,vehicle,A\n");

    let response = router::batch_handler::<RecordingClassifier>(
        State(Arc::new(service)),
        axum::Json(BatchRequest { csv }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .starts_with("row 1: home_ownership"));
    assert!(classifier.calls().is_empty());
}

#[tokio::test]
async fn form_page_is_served_as_html() {
    let (service, _) = service_with_label(0);
    let app = eligibility_router(Arc::new(service));

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).expect("request builds"))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let page = String::from_utf8(body.to_vec()).expect("utf-8 page");
    assert!(page.contains("/api/v1/eligibility/predict"));
    assert!(page.contains(r#"min="5000" max="500000""#));
}

#[tokio::test]
async fn form_page_falls_back_on_cleared_numbers() {
    let (service, _) = service_with_label(0);
    let app = eligibility_router(Arc::new(service));

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).expect("request builds"))
        .await
        .expect("route responds");

    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let page = String::from_utf8(body.to_vec()).expect("utf-8 page");
    assert!(page.contains("Number.isFinite(value) ? value : parse(input.min)"));
    assert!(page.contains("JSON.parse(text)"));
    assert!(page.contains("document.getElementById('adjustments').textContent = preview.error"));
}

#[tokio::test]
async fn preview_rejects_missing_numbers() {
    let (service, classifier) = service_with_label(0);
    let app = eligibility_router(Arc::new(service));
    let mut body = worked_example_json();
    body["annual_income"] = Value::Null;

    let response = app
        .oneshot(json_request("/api/v1/eligibility/preview", &body))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(classifier.calls().is_empty());
}

#[tokio::test]
async fn schema_route_lists_features_and_options() {
    let (service, _) = service_with_label(0);
    let app = eligibility_router(Arc::new(service));

    let response = app
        .oneshot(
            Request::get("/api/v1/eligibility/schema")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route responds");

    let body = read_json_body(response).await;
    assert_eq!(body["features"][21], "cb_person_default_on_file_1");
    assert_eq!(body["bounds"]["age"]["min"], 18);
    assert_eq!(body["bounds"]["loan_amount"]["max"], 50000.0);
    assert_eq!(body["loan_intent"][0]["value"], "real_estate");
    assert_eq!(body["loan_grade"].as_array().map(Vec::len), Some(6));
    assert_eq!(body["defaults"]["home_ownership"], "renter");
}
