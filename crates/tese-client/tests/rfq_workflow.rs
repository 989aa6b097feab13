mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use tese_client::{ClientError, RfqWorkflow};
use tese_shared::quotation::CounterOffer;
use tese_shared::rfq::{NewRfqRequest, RfqStatus, RfqType};
use tese_shared::{ListParams, QuotationVersionId, RfqError, RfqId};

use common::{authorized, buyer, client, quote_json, rfq_json, spawn};

#[derive(Clone, Default)]
struct Calls {
    accept: Arc<AtomicUsize>,
}

async fn create_rfq(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })));
    }
    let mut rfq = rfq_json("rfq_new", "submitted", json!([]));
    rfq["title"] = body["title"].clone();
    rfq["budget_min"] = body["budget_min"].clone();
    rfq["budget_max"] = body["budget_max"].clone();
    if body["title"] == "Corrupted" {
        rfq["budget_min"] = json!(900_000);
        rfq["budget_max"] = json!(1);
    }
    (StatusCode::OK, Json(json!({ "rfq_request": rfq })))
}

async fn get_rfq(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    match id.as_str() {
        "rfq_embedded" => {
            let quotes = json!([quote_json("quo_own", "rfq_embedded", "sent")]);
            (StatusCode::OK, Json(json!({ "rfq_request": rfq_json(&id, "quoted", quotes) })))
        }
        "rfq_bare" => (
            StatusCode::OK,
            Json(json!({ "rfq_request": rfq_json(&id, "quoted", json!([])) })),
        ),
        "rfq_lapsed" => {
            let quotes = json!([quote_json("quo_own", "rfq_lapsed", "sent")]);
            let mut rfq = rfq_json(&id, "quoted", quotes);
            rfq["expires_at"] = json!("2020-01-01T00:00:00Z");
            (StatusCode::OK, Json(json!({ "rfq_request": rfq })))
        }
        "rfq_inverted" => {
            let quotes = json!([quote_json("quo_own", "rfq_inverted", "sent")]);
            let mut rfq = rfq_json(&id, "quoted", quotes);
            rfq["budget_min"] = json!(900_000);
            rfq["budget_max"] = json!(1);
            (StatusCode::OK, Json(json!({ "rfq_request": rfq })))
        }
        "rfq_closed" => (
            StatusCode::OK,
            Json(json!({ "rfq_request": rfq_json(&id, "converted", json!([])) })),
        ),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))),
    }
}

async fn get_quotation(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    match id.as_str() {
        "quo_elsewhere" => (
            StatusCode::OK,
            Json(json!({ "quotation": quote_json(&id, "rfq_other", "sent") })),
        ),
        "quo_open" => (
            StatusCode::OK,
            Json(json!({ "quotation": quote_json(&id, "rfq_bare", "viewed") })),
        ),
        "quo_accepted" => (
            StatusCode::OK,
            Json(json!({ "quotation": quote_json(&id, "rfq_bare", "accepted") })),
        ),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))),
    }
}

async fn accept_quote(
    State(calls): State<Calls>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    calls.accept.fetch_add(1, Ordering::SeqCst);
    let quotation_id = body["quotation_version_id"].as_str().unwrap_or_default().to_string();
    Json(json!({
        "rfq_request": rfq_json(&id, "accepted", json!([])),
        "quotation_version": quote_json(&quotation_id, &id, "accepted"),
    }))
}

async fn negotiate(Path(id): Path<String>, Json(offer): Json<Value>) -> Json<Value> {
    let mut revised = quote_json("quo_v2", "rfq_bare", "sent");
    revised["version_number"] = json!(2);
    revised["total_amount"] = offer["proposed_amount"].clone();
    revised["parent_version_id"] = json!(id);
    Json(json!({ "quotation": revised }))
}

async fn convert(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "order": { "id": "order_1", "quotation_version_id": id } }))
}

async fn broken_list() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "database unavailable" })),
    )
}

async fn backend() -> (String, Calls) {
    let calls = Calls::default();
    let app = Router::new()
        .route("/store/rfq", post(create_rfq).get(broken_list))
        .route("/store/rfq/{id}", get(get_rfq))
        .route("/store/rfq/{id}/accept-quote", post(accept_quote))
        .route("/store/quotations/{id}", get(get_quotation))
        .route("/store/quotations/{id}/negotiate", post(negotiate))
        .route("/store/quotations/{id}/convert-to-order", post(convert))
        .with_state(calls.clone());
    (spawn(app).await, calls)
}

#[tokio::test]
async fn submit_keeps_budget_and_sends_credentials() {
    let (base, _) = backend().await;
    let backend = client(&base);
    let session = buyer();
    let workflow = RfqWorkflow::new(&backend, &session);

    let request = NewRfqRequest::new("Audit", "Scope 1-3 emissions audit", RfqType::Service)
        .with_budget(Some(100_000), Some(500_000));
    let rfq = workflow.submit(&request).await.unwrap();

    assert_eq!(rfq.status, RfqStatus::Submitted);
    assert_eq!(rfq.title, "Audit");
    assert_eq!(rfq.budget_min, Some(100_000));
    assert_eq!(rfq.budget_max, Some(500_000));
}

#[tokio::test]
async fn inverted_budget_never_reaches_backend() {
    let backend = client("http://127.0.0.1:9");
    let session = buyer();
    let request = NewRfqRequest::new("Audit", "Scope 1-3 emissions audit", RfqType::Service)
        .with_budget(Some(500_000), Some(100_000));
    let err = RfqWorkflow::new(&backend, &session)
        .submit(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rfq(RfqError::BudgetRange { .. })));
}

#[tokio::test]
async fn inverted_budget_from_backend_is_a_contract_error() {
    let (base, calls) = backend().await;
    let backend = client(&base);
    let session = buyer();
    let workflow = RfqWorkflow::new(&backend, &session);

    let request = NewRfqRequest::new("Corrupted", "Scope 1-3 emissions audit", RfqType::Service)
        .with_budget(Some(100_000), Some(500_000));
    let err = workflow.submit(&request).await.unwrap_err();
    assert!(matches!(err, ClientError::Contract(_)), "{err}");
    assert!(!err.is_validation());

    let err = workflow
        .accept_quote(&RfqId::new("rfq_inverted"), &QuotationVersionId::new("quo_own"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Contract(_)), "{err}");
    assert_eq!(calls.accept.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn lapsed_rfq_cannot_accept() {
    let (base, calls) = backend().await;
    let backend = client(&base);
    let session = buyer();

    let err = RfqWorkflow::new(&backend, &session)
        .accept_quote(&RfqId::new("rfq_lapsed"), &QuotationVersionId::new("quo_own"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rfq(RfqError::Lapsed(ref id)) if id.as_str() == "rfq_lapsed"));
    assert_eq!(calls.accept.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn accepting_a_foreign_quote_is_refused() {
    let (base, calls) = backend().await;
    let backend = client(&base);
    let session = buyer();
    let workflow = RfqWorkflow::new(&backend, &session);

    let err = workflow
        .accept_quote(&RfqId::new("rfq_embedded"), &QuotationVersionId::new("quo_stranger"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rfq(RfqError::ForeignQuotation { .. })));

    // Without an embedded list the quotation is fetched and its owner checked.
    let err = workflow
        .accept_quote(&RfqId::new("rfq_bare"), &QuotationVersionId::new("quo_elsewhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rfq(RfqError::ForeignQuotation { .. })));

    assert_eq!(calls.accept.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn accepting_own_quote_moves_rfq_to_accepted() {
    let (base, calls) = backend().await;
    let backend = client(&base);
    let session = buyer();

    let accepted = RfqWorkflow::new(&backend, &session)
        .accept_quote(&RfqId::new("rfq_embedded"), &QuotationVersionId::new("quo_own"))
        .await
        .unwrap();
    assert_eq!(accepted.rfq_request.status, RfqStatus::Accepted);
    assert_eq!(accepted.quotation_version.id.as_str(), "quo_own");
    assert_eq!(calls.accept.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn terminal_rfq_cannot_accept() {
    let (base, calls) = backend().await;
    let backend = client(&base);
    let session = buyer();

    let err = RfqWorkflow::new(&backend, &session)
        .accept_quote(&RfqId::new("rfq_closed"), &QuotationVersionId::new("quo_own"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rfq(RfqError::ReadOnly { .. })));
    assert_eq!(calls.accept.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn counter_offer_yields_superseding_version() {
    let (base, _) = backend().await;
    let backend = client(&base);
    let session = buyer();

    let revised = RfqWorkflow::new(&backend, &session)
        .negotiate(&QuotationVersionId::new("quo_open"), &CounterOffer::new(200_000))
        .await
        .unwrap();
    assert_eq!(revised.id.as_str(), "quo_v2");
    assert_eq!(revised.total_amount, 200_000);
    assert!(revised.supersedes(&QuotationVersionId::new("quo_open")));
}

#[tokio::test]
async fn only_accepted_quotes_convert_to_orders() {
    let (base, _) = backend().await;
    let backend = client(&base);
    let session = buyer();
    let workflow = RfqWorkflow::new(&backend, &session);

    let err = workflow
        .convert_to_order(&QuotationVersionId::new("quo_open"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rfq(RfqError::QuotationNotAccepted { .. })));

    let order = workflow
        .convert_to_order(&QuotationVersionId::new("quo_accepted"))
        .await
        .unwrap();
    assert_eq!(order.id, "order_1");
    assert_eq!(order.fields["quotation_version_id"], "quo_accepted");
}

#[tokio::test]
async fn failing_list_degrades_to_empty_page() {
    let (base, _) = backend().await;
    let backend = client(&base);
    let session = buyer();
    let params = ListParams::new(10).with_status("submitted");

    let page = backend.list_rfq_requests(&session, &params).await;
    assert!(page.is_empty());
    assert_eq!(page.count, 0);
    assert_eq!(page.limit, 10);

    let err = backend.try_list_rfq_requests(&session, &params).await.unwrap_err();
    match err {
        ClientError::Backend { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_rfq_is_none() {
    let (base, _) = backend().await;
    let backend = client(&base);
    assert!(backend
        .get_rfq_request(&buyer(), &RfqId::new("rfq_missing"))
        .await
        .is_none());
}
