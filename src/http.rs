//! HTTP front door: `POST /signal/{signalId}` drives the signal handler.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc, time::Instant};
use thiserror::Error;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::dispatch::{DispatchError, SignalHandler};
use crate::metrics::DispatchMetrics;
use crate::types::SignalId;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn SignalHandler>,
    pub metrics: Arc<DispatchMetrics>,
}

impl AppState {
    pub fn new(handler: Arc<dyn SignalHandler>) -> Self {
        Self {
            handler,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalResponse {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid signal id: {0}")]
    InvalidSignalId(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("dispatch task failed: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidSignalId(_) | ApiError::Dispatch(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error_message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/signal/:signal_id", post(receive_signal))
        .route("/stats", get(stats))
        .route("/healthz", get(|| async { "ok" }))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new().include_headers(false)),
        )
        .with_state(state)
}

pub async fn receive_signal(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<SignalResponse>, ApiError> {
    let signal = raw
        .trim()
        .parse::<i64>()
        .map(SignalId)
        .map_err(|_| ApiError::InvalidSignalId(raw.clone()))?;

    // Dispatch is synchronous and may block inside the algorithm.
    let handler = Arc::clone(&state.handler);
    let started = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || handler.handle_signal(signal))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    state.metrics.observe(signal, &outcome, started.elapsed());

    let report = outcome?;
    Ok(Json(SignalResponse {
        message: format!("Signal {} processed.", report.signal),
    }))
}

pub async fn stats(State(state): State<AppState>) -> Json<BTreeMap<String, String>> {
    Json(state.metrics.snapshot_kv())
}
