use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use tese_client::ClientError;
use tese_shared::constants::CHAT_UNAVAILABLE_MESSAGE;
use tese_shared::ChatError;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to message the seller.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

fn chat_status(e: &ChatError) -> (StatusCode, String) {
    match e {
        ChatError::SessionUnavailable => {
            (StatusCode::BAD_GATEWAY, CHAT_UNAVAILABLE_MESSAGE.to_string())
        }
        ChatError::Disabled => (StatusCode::NOT_FOUND, e.to_string()),
        ChatError::EmptyMessage => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        ChatError::SendInProgress => (StatusCode::CONFLICT, e.to_string()),
        ChatError::Homeserver(_) => {
            (StatusCode::BAD_GATEWAY, CHAT_UNAVAILABLE_MESSAGE.to_string())
        }
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Chat(e) => chat_status(e),
            ApiError::Client(ClientError::Chat(e)) => chat_status(e),
            ApiError::Client(e) if e.is_not_found() => (StatusCode::NOT_FOUND, e.to_string()),
            ApiError::Client(e) if e.is_validation() => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            ApiError::Client(ClientError::InFlight) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Client(ClientError::Backend { status, message })
                if (400..500).contains(status) =>
            {
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST);
                (status, message.clone())
            }
            ApiError::Client(_) => (
                StatusCode::BAD_GATEWAY,
                "The marketplace backend is unavailable".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
