//! HTTP surface of the console.
//!
//! - `GET  /identities` directory contents and availability
//! - `GET  /views`      operator and caller views
//! - `POST /intents`    apply an [`OperatorIntent`], respond with the new views
//! - `GET  /health`     liveness

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use callverify_directory::IdentityOption;
use callverify_session::SessionError;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::adapter::{OperatorIntent, PresentationAdapter};
use crate::views::ConsoleViews;

#[derive(Debug, Serialize)]
pub struct IdentitiesResponse {
    pub available: bool,
    pub error: Option<String>,
    pub identities: Vec<IdentityOption>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Rejected operator intent.
pub struct ApiError(SessionError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SessionError::InvalidTransition { .. } => StatusCode::CONFLICT,
            SessionError::Validation(_) | SessionError::UnknownIdentity(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SessionError::RuntimeStopped => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            tracing::error!("intent failed: {}", self.0);
        } else {
            tracing::debug!("intent rejected: {}", self.0);
        }
        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(adapter: Arc<PresentationAdapter>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/identities", get(identities))
        .route("/views", get(views))
        .route("/intents", post(intents))
        .route("/health", get(health))
        .layer(cors)
        .with_state(adapter)
}

async fn identities(State(adapter): State<Arc<PresentationAdapter>>) -> Json<IdentitiesResponse> {
    let directory = adapter.directory();
    Json(IdentitiesResponse {
        available: directory.is_available(),
        error: directory.load_error().map(str::to_string),
        identities: directory.options(),
    })
}

async fn views(State(adapter): State<Arc<PresentationAdapter>>) -> Json<ConsoleViews> {
    Json(adapter.views().await)
}

async fn intents(
    State(adapter): State<Arc<PresentationAdapter>>,
    Json(intent): Json<OperatorIntent>,
) -> Result<Json<ConsoleViews>, ApiError> {
    adapter.apply(intent).await.map(Json).map_err(ApiError)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
