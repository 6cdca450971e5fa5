use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::event::EventBus;
use crate::game::service::GameService;
use crate::game::GameError;
use crate::websockets::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub game_service: Arc<GameService>,
    pub event_bus: EventBus,
    pub connections: Arc<dyn ConnectionManager>,
}

impl AppState {
    pub fn new(
        game_service: Arc<GameService>,
        event_bus: EventBus,
        connections: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            game_service,
            event_bus,
            connections,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A domain rejection: local to the submitting action, produces no
    /// mutation and no broadcast.
    #[error(transparent)]
    Rejected(#[from] GameError),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::StorageError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Rejected(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
