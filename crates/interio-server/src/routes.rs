use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use interio_contracts::requests::{EditRequest, GenerateRequest, SemanticEditRequest};
use interio_contracts::responses::{EditResponse, GenerateResponse, HealthResponse};
use interio_engine::{default_provider_registry, ImageRouter};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Settings;
use crate::cors::{cors_middleware, CorsPolicy};
use crate::error::ApiError;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub router: ImageRouter,
}

/// Builds the HTTP surface around an already-populated router.
pub fn build_app(router: ImageRouter, cors: CorsPolicy, max_body_bytes: usize) -> Router {
    let state = AppState { router };
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/edit", post(edit))
        .route("/api/edit/semantic", post(semantic_edit))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn_with_state(Arc::new(cors), cors_middleware))
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

/// The production app: built-in providers configured from `settings`.
pub fn app_from_settings(settings: &Settings) -> Router {
    let registry = default_provider_registry(&settings.provider_settings());
    build_app(
        ImageRouter::new(registry),
        CorsPolicy::new(settings.cors_origins.iter().cloned()),
        settings.max_body_bytes,
    )
}

async fn trace_request(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "request",
        %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    async move {
        let started = Instant::now();
        let mut response = next.run(request).await;
        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request complete"
        );
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok(API_VERSION))
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.router.generate(&request).await?))
}

async fn edit(
    State(state): State<AppState>,
    payload: Result<Json<EditRequest>, JsonRejection>,
) -> Result<Json<EditResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.router.edit(&request).await?))
}

async fn semantic_edit(
    State(state): State<AppState>,
    payload: Result<Json<SemanticEditRequest>, JsonRejection>,
) -> Result<Json<EditResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.router.semantic_edit(&request).await?))
}
