//! HTTP front end for the field mapper.
//!
//! `POST /field-mapper` takes a [`MapRequest`] body and answers with the
//! [`MappingResult`](esg_model::MappingResult). Every failure is a 500 with an
//! [`ErrorResponse`] body.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use esg_map::{AliasRepository, MappingEngine};
use esg_model::{ErrorResponse, MapRequest};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

/// Shared, read-only state behind every request.
#[derive(Debug, Clone)]
pub struct AppState {
    engine: MappingEngine,
    repository: Option<Arc<AliasRepository>>,
}

impl AppState {
    pub fn new(engine: MappingEngine) -> Self {
        Self {
            engine,
            repository: None,
        }
    }

    /// Enables per-company alias overrides stored in `repository`.
    #[must_use]
    pub fn with_repository(mut self, repository: AliasRepository) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    pub fn engine(&self) -> &MappingEngine {
        &self.engine
    }

    /// Engine for a company: the shared one, or one over the company's
    /// merged dictionary when overrides exist.
    fn engine_for(&self, company_id: &str) -> Result<MappingEngine> {
        let Some(repository) = &self.repository else {
            return Ok(self.engine.clone());
        };
        match repository.load(company_id)? {
            Some(overrides) => {
                let merged = self.engine.dictionary().merged_with(&overrides);
                tracing::debug!(company_id, "using company alias overrides");
                Ok(self.engine.with_dictionary(Arc::new(merged)))
            }
            None => Ok(self.engine.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    entities: usize,
    ai_fallback: bool,
}

/// Failure of a single request, rendered as 500 `{"error": ...}`.
struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = format!("{:#}", self.0);
        tracing::warn!(error = %message, "field mapping request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(message)),
        )
            .into_response()
    }
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        entities: state.engine.dictionary().len(),
        ai_fallback: state.engine.has_resolver(),
    })
}

async fn map_fields(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request = MapRequest::from_json(&body)?;
    let engine = state.engine_for(&request.company_id)?;
    let result = engine.map_request(&request).await;
    tracing::info!(
        entity = %request.target_entity,
        headers = request.source_headers.len(),
        mapped = result.mappings.len(),
        suggested = result.suggestions.len(),
        unmapped = result.unmapped.len(),
        "field mapping request served"
    );
    Ok((StatusCode::OK, Json(result)).into_response())
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/field-mapper", post(map_fields))
        .layer(cors)
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "field mapper listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve http")?;
    tracing::info!("field mapper stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
