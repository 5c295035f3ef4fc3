//! HTTP API endpoints.
//!
//! Read access to the match, configuration updates and question submission for
//! tools that don't hold a WebSocket open.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::MatchConfig;
use crate::engine::MatchSnapshot;
use crate::questions::{NewQuestion, SubmitError};
use crate::state::AppState;
use crate::ws;

/// Full application router: WebSocket, JSON API and the raw question files
pub fn router(state: Arc<AppState>, data_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/state", get(get_state))
        .route("/api/config", get(get_config).put(put_config))
        .route("/api/add-question", post(add_question))
        .nest_service("/data", ServeDir::new(data_dir.as_ref()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Current match snapshot.
///
/// GET /api/state
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<MatchSnapshot> {
    Json(state.snapshot().await)
}

/// GET /api/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<MatchConfig> {
    Json(state.config().await)
}

/// Replace the match configuration.
///
/// PUT /api/config
///
/// Values are clamped into range and the applied config is echoed back.
/// A running match is reset.
pub async fn put_config(
    State(state): State<Arc<AppState>>,
    Json(config): Json<MatchConfig>,
) -> Json<MatchConfig> {
    Json(state.update_config(config).await)
}

/// Store a new question.
///
/// POST /api/add-question
///
/// Responds `201 { "added": question }`, or an error status with `{ "message": ... }`.
pub async fn add_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewQuestion>, JsonRejection>,
) -> Response {
    let Json(candidate) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!("Rejected question payload: {}", rejection.body_text());
            return message(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.submit_question(candidate).await {
        Ok((question, _)) => (StatusCode::CREATED, Json(json!({ "added": question }))).into_response(),
        Err(e) => message(submit_status(&e), e.to_string()),
    }
}

fn submit_status(e: &SubmitError) -> StatusCode {
    match e {
        SubmitError::Invalid(_) | SubmitError::Rejected(_) => StatusCode::BAD_REQUEST,
        SubmitError::Duplicate(_) => StatusCode::CONFLICT,
        SubmitError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SubmitError::Http(_) => StatusCode::BAD_GATEWAY,
    }
}

fn message(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}
