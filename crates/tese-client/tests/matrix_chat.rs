mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use tese_client::chat::MatrixProvider;
use tese_client::{ChatProvider, ChatView};
use tese_shared::chat::ChatTarget;
use tese_shared::ChatError;

use common::{buyer, client, spawn};

const ROOM: &str = "!deal:tese.io";
const ACCESS_TOKEN: &str = "syt_buyer";

#[derive(Clone, Default)]
struct Homeserver {
    joined: Arc<Mutex<Vec<String>>>,
    sent: Arc<Mutex<Vec<(String, Value)>>>,
    queries: Arc<Mutex<Vec<(String, String)>>>,
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {ACCESS_TOKEN}");
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str())
}

async fn join(
    State(hs): State<Homeserver>,
    headers: HeaderMap,
    Path(room): Path<String>,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "errcode": "M_UNKNOWN_TOKEN", "error": "Unknown token" })),
        );
    }
    hs.joined.lock().unwrap().push(room.clone());
    (StatusCode::OK, Json(json!({ "room_id": room })))
}

async fn messages(
    State(hs): State<Homeserver>,
    Path(room): Path<String>,
    Query(query): Query<std::collections::HashMap<String, String>>,
) -> Json<Value> {
    hs.queries.lock().unwrap().push((
        query.get("dir").cloned().unwrap_or_default(),
        query.get("limit").cloned().unwrap_or_default(),
    ));
    let mut chunk = Vec::new();
    for (id, body) in hs.sent.lock().unwrap().iter().rev() {
        chunk.push(json!({
            "type": "m.room.message",
            "event_id": id,
            "room_id": room,
            "sender": "@cus_1:tese.io",
            "origin_server_ts": 1_700_000_300_000i64,
            "content": body,
        }));
    }
    // Newest first, as `dir=b` pages.
    chunk.extend([
        json!({
            "type": "m.reaction",
            "event_id": "$react",
            "sender": "@sel_1:tese.io",
            "origin_server_ts": 1_700_000_200_000i64,
            "content": { "m.relates_to": { "key": "+1" } },
        }),
        json!({
            "type": "m.room.message",
            "event_id": "$reply",
            "sender": "@sel_1:tese.io",
            "origin_server_ts": 1_700_000_100_000i64,
            "content": { "msgtype": "m.text", "body": "Yes, Scope 3 is included." },
        }),
        json!({
            "type": "m.room.message",
            "event_id": "$photo",
            "sender": "@sel_1:tese.io",
            "origin_server_ts": 1_700_000_050_000i64,
            "content": { "msgtype": "m.image", "body": "site.jpg" },
        }),
        json!({
            "type": "m.room.message",
            "event_id": "$question",
            "sender": "@cus_1:tese.io",
            "origin_server_ts": 1_700_000_000_000i64,
            "content": { "msgtype": "m.text", "body": "Does the audit cover Scope 3?" },
        }),
    ]);
    Json(json!({ "chunk": chunk, "start": "t1", "end": "t0" }))
}

async fn send(
    State(hs): State<Homeserver>,
    Path((_room, _event_type, txn)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let event_id = format!("${txn}");
    hs.sent.lock().unwrap().push((event_id.clone(), body));
    Json(json!({ "event_id": event_id }))
}

async fn homeserver() -> (String, Homeserver) {
    let hs = Homeserver::default();
    let app = Router::new()
        .route("/_matrix/client/v3/rooms/{room}/join", post(join))
        .route("/_matrix/client/v3/rooms/{room}/messages", get(messages))
        .route(
            "/_matrix/client/v3/rooms/{room}/send/{event_type}/{txn}",
            put(send),
        )
        .with_state(hs.clone());
    (spawn(app).await, hs)
}

/// Backend whose token and room endpoints can each be broken.
async fn chat_backend(token_ok: bool, room_ok: bool) -> String {
    let token = move || async move {
        if token_ok {
            (
                StatusCode::OK,
                Json(json!({ "access_token": ACCESS_TOKEN, "user_id": "@cus_1:tese.io" })),
            )
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "token service down" })),
            )
        }
    };
    let room = move |Json(target): Json<Value>| async move {
        if room_ok && target["seller_id"] == "sel_1" {
            (StatusCode::OK, Json(json!({ "room_id": ROOM })))
        } else {
            (StatusCode::BAD_REQUEST, Json(json!({ "message": "no room" })))
        }
    };
    let app = Router::new()
        .route("/store/chat/token", post(token))
        .route("/store/chat/room", post(room));
    spawn(app).await
}

async fn provider(token_ok: bool, room_ok: bool) -> (Arc<MatrixProvider>, Homeserver) {
    let backend = client(&chat_backend(token_ok, room_ok).await);
    let (hs_url, hs) = homeserver().await;
    let provider = MatrixProvider::new(reqwest::Client::new(), &hs_url, backend).unwrap();
    (Arc::new(provider), hs)
}

#[tokio::test]
async fn session_joins_and_reads_text_in_order() {
    let (matrix, hs) = provider(true, true).await;

    let chat = matrix
        .open_session(&buyer(), &ChatTarget::seller("sel_1"))
        .await
        .unwrap();
    assert_eq!(chat.room_id.as_str(), ROOM);
    assert_eq!(chat.user_id, "@cus_1:tese.io");

    matrix.join(&chat).await.unwrap();
    assert_eq!(hs.joined.lock().unwrap().as_slice(), [ROOM.to_string()]);

    let messages = matrix.list_messages(&chat, 50).await.unwrap();
    let ids: Vec<&str> = messages.iter().map(|m| m.event_id.as_str()).collect();
    assert_eq!(ids, ["$question", "$reply"]);
    assert_eq!(
        hs.queries.lock().unwrap().as_slice(),
        [("b".to_string(), "50".to_string())]
    );
}

#[tokio::test]
async fn either_lookup_failing_fails_the_session() {
    for (token_ok, room_ok) in [(false, true), (true, false), (false, false)] {
        let (matrix, _) = provider(token_ok, room_ok).await;
        let err = matrix
            .open_session(&buyer(), &ChatTarget::seller("sel_1"))
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::SessionUnavailable);
    }
}

#[tokio::test]
async fn view_sends_then_shows_own_message() {
    let (matrix, hs) = provider(true, true).await;
    let chat = matrix
        .open_session(&buyer(), &ChatTarget::seller("sel_1"))
        .await
        .unwrap();

    let view = ChatView::new(matrix, chat, 50, Duration::from_secs(60));
    view.activate().await;
    assert_eq!(view.snapshot().messages.len(), 2);

    view.set_input("  Great, please send the contract.  ");
    let event_id = view.send_input().await.unwrap();
    assert!(event_id.is_some());

    let sent = hs.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1["msgtype"], "m.text");
    assert_eq!(sent[0].1["body"], "Great, please send the contract.");

    let state = view.snapshot();
    assert!(state.input.is_empty());
    assert!(state.error.is_none());
    assert_eq!(
        state.messages.last().map(|m| m.content.body.as_str()),
        Some("Great, please send the contract.")
    );
    view.deactivate();
}
