//! HTTP API Layer
//!
//! REST and WebSocket surface of the fraud consensus service, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: claim analysis, batch submission and status, stats, progress
//! - **Middleware**: request ids, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(manager, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use axum::{
    http::HeaderName,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use engine_batch::BatchJobManager;

use crate::config::ServiceConfig;
use crate::handlers::{batches, claims, health, progress, stats};
use crate::middleware::{audit_middleware, REQUEST_ID_HEADER};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: BatchJobManager,
    pub config: ServiceConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `manager` - Batch job manager owning the pipeline and task store
/// * `config` - Service configuration
pub fn create_router(manager: BatchJobManager, config: ServiceConfig) -> Router {
    let state = AppState { manager, config };
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let public_routes = Router::new().route("/health", get(health::health_check));

    let batch_routes = Router::new()
        .route("/", post(batches::submit_batch))
        .route("/:id", get(batches::get_status))
        .route("/:id/results", get(batches::get_results));

    let api_routes = Router::new()
        .route("/analyze-claim", post(claims::analyze_claim))
        .route("/stats", get(stats::get_stats))
        .nest("/batches", batch_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    // Progress channel, one WebSocket per observer
    let ws_routes = Router::new().route("/ws/:id", get(progress::progress_socket));

    Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
