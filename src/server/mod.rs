pub mod routes;
pub mod ws;

use crate::errors::PricingError;
use crate::state::{AppState, ErrorResponse};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::sync::Arc;

/// Build the HTTP + WS router. Static dashboard assets are served from
/// `config.dashboard_dir` for any other path.
pub fn router(state: Arc<AppState>) -> axum::Router {
    let dashboard = state.config.dashboard_dir.clone();

    axum::Router::new()
        .route("/api/valuation", axum::routing::post(routes::post_valuation))
        .route("/api/heatmap", axum::routing::post(routes::post_heatmap))
        .route("/api/counters", axum::routing::get(routes::get_counters))
        .route("/api/health", axum::routing::get(routes::get_health))
        .route("/ws", axum::routing::get(ws::ws_handler))
        .fallback_service(
            tower_http::services::ServeDir::new(&dashboard)
                .fallback(tower_http::services::ServeFile::new(dashboard.join("index.html"))),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

/// Error returned from handlers: status plus a JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse {
                error: msg.into(),
                kind: "internal",
            },
        }
    }
}

impl From<PricingError> for ApiError {
    fn from(e: PricingError) -> Self {
        let status = match e {
            PricingError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            body: ErrorResponse::from(&e),
        }
    }
}

impl From<&PricingError> for ErrorResponse {
    fn from(e: &PricingError) -> Self {
        Self {
            error: e.to_string(),
            kind: e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
