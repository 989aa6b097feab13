mod common;

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use tese_client::chat::{one_on_one_id, TalkJsProvider};
use tese_client::{ChatProvider, Session};
use tese_shared::chat::ChatTarget;
use tese_shared::ChatError;

use common::{authorized, buyer, client, spawn};

const APP_ID: &str = "tJ5X";

async fn me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "customer": { "id": "cus_1", "email": "buyer@tese.io" } })),
    )
}

#[derive(Clone, Default)]
struct Conversations {
    upserts: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn upsert(
    State(talk): State<Conversations>,
    Path((_app, conversation)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    talk.upserts.lock().unwrap().push((conversation, body));
    Json(json!({}))
}

async fn provider() -> (TalkJsProvider, Conversations) {
    let backend = client(&spawn(Router::new().route("/store/customers/me", get(me))).await);
    let talk = Conversations::default();
    let api = spawn(
        Router::new()
            .route("/v1/{app}/conversations/{id}", put(upsert))
            .with_state(talk.clone()),
    )
    .await;
    let provider =
        TalkJsProvider::new(reqwest::Client::new(), &api, backend, APP_ID, "sk_test").unwrap();
    (provider, talk)
}

#[tokio::test]
async fn conversation_belongs_to_the_resolved_customer() {
    let (talkjs, talk) = provider().await;

    // A customer id in the posted target is not part of the target at all.
    let target: ChatTarget =
        serde_json::from_value(json!({ "seller_id": "sel_1", "customer_id": "cus_victim" }))
            .unwrap();
    let chat = talkjs.open_session(&buyer(), &target).await.unwrap();
    assert_eq!(chat.user_id, "cus_1");
    assert_eq!(chat.peer_id, "sel_1");
    assert_eq!(chat.room_id.as_str(), one_on_one_id("cus_1", "sel_1"));

    talkjs.join(&chat).await.unwrap();
    let upserts = talk.upserts.lock().unwrap().clone();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].0, one_on_one_id("cus_1", "sel_1"));
    assert_eq!(upserts[0].1["participants"], json!(["cus_1", "sel_1"]));
}

#[tokio::test]
async fn unknown_token_cannot_open_a_conversation() {
    let (talkjs, talk) = provider().await;

    let err = talkjs
        .open_session(&Session::bearer("garbage"), &ChatTarget::seller("sel_1"))
        .await
        .unwrap_err();
    assert_eq!(err, ChatError::SessionUnavailable);
    assert!(talk.upserts.lock().unwrap().is_empty());
}
