use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use tese_client::chat::ChatViewState;
use tese_client::{
    BackendClient, ChatProvider, ChatProviderKind, ChatView, NegotiationView, RfqWorkflow,
};
use tese_shared::chat::ChatTarget;
use tese_shared::constants::DEFAULT_PAGE_LIMIT;
use tese_shared::negotiation::{MessageDraft, NegotiationLedger};
use tese_shared::quotation::CounterOffer;
use tese_shared::rfq::{NewRfqRequest, RfqUpdate};
use tese_shared::search::{ListingFilter, ProductSearchRequest, ProductSearchResponse};
use tese_shared::services::{ServiceFilter, ServiceQuoteRequest};
use tese_shared::{ChatError, ListParams, Page, QuotationVersionId, RfqId, ThreadId};

use crate::config::StorefrontConfig;
use crate::error::{ApiError, LOGIN_REQUIRED_MESSAGE};
use crate::session::BuyerSession;

#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub chat: Arc<dyn ChatProvider>,
    pub config: Arc<StorefrontConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/rfq", get(list_rfqs).post(create_rfq))
        .route("/rfq/{id}", get(get_rfq).patch(update_rfq))
        .route("/rfq/{id}/accept-quote", post(accept_quote))
        .route("/quotations", get(list_quotations))
        .route("/quotations/{id}", get(get_quotation))
        .route("/quotations/{id}/negotiate", post(negotiate_quotation))
        .route("/quotations/{id}/convert-to-order", post(convert_to_order))
        .route("/negotiations", get(list_negotiations))
        .route("/negotiations/{id}", get(get_negotiation))
        .route(
            "/negotiations/{id}/messages",
            get(list_negotiation_messages).post(send_negotiation_message),
        )
        .route("/services", get(list_services))
        .route("/services/{id}", get(get_service))
        .route("/services/{id}/request-quote", post(request_service_quote))
        .route("/search/products", post(search_products))
        .route("/chat/session", post(open_chat))
        .route("/chat/messages", post(send_chat_message))
        .route("/chat/rooms", get(list_chat_rooms))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    site: String,
    version: &'static str,
    chat: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl ListQuery {
    fn params(self) -> ListParams {
        ListParams {
            status: self.status.filter(|s| !s.is_empty()),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            offset: self.offset.unwrap_or(0),
        }
    }
}

#[derive(Deserialize)]
struct AcceptQuoteBody {
    quotation_version_id: QuotationVersionId,
}

#[derive(Deserialize)]
struct ChatMessageBody {
    #[serde(flatten)]
    target: ChatTarget,
    body: String,
}

fn page_body<T: Serialize>(key: &'static str, page: Page<T>) -> Json<Value> {
    let mut body = json!({
        "count": page.count,
        "offset": page.offset,
        "limit": page.limit,
    });
    body[key] = json!(page.items);
    Json(body)
}

fn ledger_body(ledger: &NegotiationLedger) -> Value {
    json!({
        "negotiation": ledger.thread(),
        "messages": ledger.messages(),
    })
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        site: state.config.site_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        chat: state.chat.kind().as_str(),
    })
}

// -- RFQs --

async fn list_rfqs(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let page = state.backend.list_rfq_requests(&session, &query.params()).await;
    page_body("rfq_requests", page)
}

async fn create_rfq(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Json(request): Json<NewRfqRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let rfq = RfqWorkflow::new(&state.backend, &session).submit(&request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "rfq_request": rfq }))))
}

async fn get_rfq(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<RfqId>,
) -> Result<Json<Value>, ApiError> {
    let rfq = state
        .backend
        .get_rfq_request(&session, &id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("RFQ {id}")))?;
    Ok(Json(json!({ "rfq_request": rfq })))
}

async fn update_rfq(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<RfqId>,
    Json(update): Json<RfqUpdate>,
) -> Result<Json<Value>, ApiError> {
    let rfq = RfqWorkflow::new(&state.backend, &session).update(&id, &update).await?;
    Ok(Json(json!({ "rfq_request": rfq })))
}

async fn accept_quote(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<RfqId>,
    Json(body): Json<AcceptQuoteBody>,
) -> Result<Json<Value>, ApiError> {
    let accepted = RfqWorkflow::new(&state.backend, &session)
        .accept_quote(&id, &body.quotation_version_id)
        .await?;
    Ok(Json(json!(accepted)))
}

// -- Quotations --

async fn list_quotations(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let page = state.backend.list_quotations(&session, &query.params()).await;
    page_body("quotations", page)
}

async fn get_quotation(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<QuotationVersionId>,
) -> Result<Json<Value>, ApiError> {
    let quotation = state
        .backend
        .get_quotation(&session, &id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("quotation {id}")))?;
    Ok(Json(json!({ "quotation": quotation })))
}

async fn negotiate_quotation(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<QuotationVersionId>,
    Json(offer): Json<CounterOffer>,
) -> Result<Json<Value>, ApiError> {
    let revised = RfqWorkflow::new(&state.backend, &session)
        .negotiate(&id, &offer)
        .await?;
    Ok(Json(json!({ "quotation": revised })))
}

async fn convert_to_order(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<QuotationVersionId>,
) -> Result<Json<Value>, ApiError> {
    let order = RfqWorkflow::new(&state.backend, &session)
        .convert_to_order(&id)
        .await?;
    Ok(Json(json!({ "order": order })))
}

// -- Negotiations --

async fn list_negotiations(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let page = state.backend.list_negotiations(&session, &query.params()).await;
    page_body("negotiations", page)
}

async fn get_negotiation(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<ThreadId>,
) -> Result<Json<Value>, ApiError> {
    let view = NegotiationView::load(state.backend.clone(), session, id).await?;
    Ok(Json(ledger_body(&view.snapshot())))
}

async fn list_negotiation_messages(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<ThreadId>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let page = state
        .backend
        .list_negotiation_messages(&session, &id, &query.params())
        .await;
    page_body("messages", page)
}

async fn send_negotiation_message(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<ThreadId>,
    Json(draft): Json<MessageDraft>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let view = NegotiationView::load(state.backend.clone(), session, id).await?;
    let message = view.send(draft).await?;
    let mut body = ledger_body(&view.snapshot());
    body["message"] = json!(message);
    Ok((StatusCode::CREATED, Json(body)))
}

// -- Services --

async fn list_services(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Query(filter): Query<ServiceFilter>,
) -> Json<Value> {
    let page = state.backend.list_services(&session, &filter).await;
    page_body("services", page)
}

async fn get_service(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let service = state
        .backend
        .get_service(&session, &id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("service {id}")))?;
    Ok(Json(json!({ "service": service })))
}

async fn request_service_quote(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Path(id): Path<String>,
    Json(request): Json<ServiceQuoteRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let rfq = state
        .backend
        .request_service_quote(&session, &id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "rfq_request": rfq }))))
}

// -- Search --

async fn search_products(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Json(mut request): Json<ProductSearchRequest>,
) -> Json<ProductSearchResponse> {
    fill_search_defaults(&state.config, &mut request);
    Json(state.backend.search_products(&session, &request).await)
}

/// Default region, plus the listing filter when the page sent none and the
/// country and currency are known.
fn fill_search_defaults(config: &StorefrontConfig, request: &mut ProductSearchRequest) {
    if request.region_id.trim().is_empty() {
        if let Some(region) = &config.default_region {
            request.region_id = region.clone();
        }
    }
    if request.filters.as_deref().is_some_and(|f| !f.trim().is_empty()) {
        return;
    }
    let country = request.country_code.as_ref().or(config.default_country.as_ref());
    let currency = request.currency_code.as_ref().or(config.default_currency.as_ref());
    match (country, currency) {
        (Some(country), Some(currency)) => {
            request.filters = Some(ListingFilter::new(country.as_str(), currency.as_str()).build());
        }
        _ => debug!("Searching without a listing filter"),
    }
}

// -- Chat --

/// Opens the chat session and returns the first page of the transcript.
async fn open_live_chat(
    state: &AppState,
    session: &tese_client::Session,
    target: ChatTarget,
) -> Result<ChatView, ApiError> {
    if state.chat.kind() == ChatProviderKind::Disabled {
        return Err(ChatError::Disabled.into());
    }
    if !session.is_authenticated() {
        return Err(ApiError::Unauthorized(LOGIN_REQUIRED_MESSAGE));
    }
    let chat = state.chat.open_session(session, &target).await?;
    let client = &state.config.client;
    let view = ChatView::new(
        Arc::clone(&state.chat),
        chat,
        client.chat_page_size,
        client.chat_poll_interval,
    );
    view.activate().await;
    Ok(view)
}

fn chat_body(view: &ChatView, snapshot: ChatViewState) -> Value {
    let chat = view.chat();
    json!({
        "session": {
            "room_id": chat.room_id,
            "user_id": chat.user_id,
            "access_token": chat.access_token,
        },
        "messages": snapshot.messages,
        "error": snapshot.error,
    })
}

async fn open_chat(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Json(target): Json<ChatTarget>,
) -> Result<Json<Value>, ApiError> {
    let view = open_live_chat(&state, &session, target).await?;
    let snapshot = view.snapshot();
    view.deactivate();
    info!(room_id = %view.chat().room_id, messages = snapshot.messages.len(), "Chat opened");
    Ok(Json(chat_body(&view, snapshot)))
}

async fn send_chat_message(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
    Json(body): Json<ChatMessageBody>,
) -> Result<Json<Value>, ApiError> {
    if body.body.trim().is_empty() {
        return Err(ChatError::EmptyMessage.into());
    }
    let view = open_live_chat(&state, &session, body.target).await?;
    let sent = view.send(&body.body).await;
    let snapshot = view.snapshot();
    view.deactivate();
    let event_id = sent?;

    let mut response = chat_body(&view, snapshot);
    response["event_id"] = json!(event_id);
    Ok(Json(response))
}

async fn list_chat_rooms(
    State(state): State<AppState>,
    BuyerSession(session): BuyerSession,
) -> Json<Value> {
    let rooms = state.backend.list_chat_rooms(&session).await;
    Json(json!({ "rooms": rooms }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting storefront HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
