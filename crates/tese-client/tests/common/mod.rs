//! In-process stand-ins for the commerce backend and the Matrix homeserver.

#![allow(dead_code)]

use axum::http::HeaderMap;
use axum::Router;
use serde_json::{json, Value};

use tese_client::{BackendClient, Session};

pub const PUBLISHABLE_KEY: &str = "pk_test";
pub const TOKEN: &str = "buyer-token";
pub const STAMP: &str = "2026-01-01T00:00:00Z";

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn client(base_url: &str) -> BackendClient {
    BackendClient::with_http(reqwest::Client::new(), base_url, PUBLISHABLE_KEY).unwrap()
}

pub fn buyer() -> Session {
    Session::bearer(TOKEN)
}

/// Whether the request carries the storefront key and the buyer's token.
pub fn authorized(headers: &HeaderMap) -> bool {
    let key = headers
        .get("x-publishable-api-key")
        .and_then(|v| v.to_str().ok());
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
    let expected = format!("Bearer {TOKEN}");
    key == Some(PUBLISHABLE_KEY) && auth == Some(expected.as_str())
}

pub fn rfq_json(id: &str, status: &str, quotation_versions: Value) -> Value {
    json!({
        "id": id,
        "customer_id": "cus_1",
        "title": "Audit",
        "description": "Scope 1-3 emissions audit",
        "rfq_type": "service",
        "status": status,
        "currency_code": "USD",
        "quotation_versions": quotation_versions,
        "created_at": STAMP,
        "updated_at": STAMP,
    })
}

pub fn quote_json(id: &str, rfq_id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "rfq_request_id": rfq_id,
        "seller_id": "sel_1",
        "version_number": 1,
        "status": status,
        "total_amount": 250000,
        "currency_code": "USD",
        "created_at": STAMP,
        "updated_at": STAMP,
    })
}

pub fn thread_json(id: &str, status: &str, proposal_count: u32, max_proposals: u32) -> Value {
    json!({
        "id": id,
        "rfq_request_id": "rfq_1",
        "buyer_id": "cus_1",
        "seller_id": "sel_1",
        "status": status,
        "proposal_count": proposal_count,
        "max_proposals": max_proposals,
        "created_at": STAMP,
        "updated_at": STAMP,
    })
}

pub fn message_json(id: &str, thread_id: &str, message_type: &str, content: &str, at: &str) -> Value {
    json!({
        "id": id,
        "thread_id": thread_id,
        "sender_id": "cus_1",
        "sender_type": "buyer",
        "message_type": message_type,
        "content": content,
        "created_at": at,
    })
}
