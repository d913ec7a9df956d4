pub mod api;
pub mod config;
pub mod services;
pub mod utils;

use crate::config::RouterConfig;
use crate::services::extraction::ExtractionEngine;
use crate::services::registry::StorageRegistry;
use crate::services::writer::{AtomicFsWriter, FileWriter, LocalFsWriter};
use crate::services::trace;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_archive,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::upload::UploadForm,
            api::handlers::upload::UploadResponse,
            api::handlers::upload::OutcomeResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "files", description = "Archive upload and extraction"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: RouterConfig,
    pub engine: Arc<ExtractionEngine>,
}

impl AppState {
    /// Builds the registry and writer once; both are shared read-only by
    /// every request afterwards.
    pub fn new(config: RouterConfig) -> Self {
        let registry = Arc::new(StorageRegistry::standard(&config.media_root));
        let writer: Arc<dyn FileWriter> = if config.atomic_writes {
            Arc::new(AtomicFsWriter)
        } else {
            Arc::new(LocalFsWriter)
        };
        Self {
            engine: Arc::new(ExtractionEngine::new(registry, writer)),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    // multipart overhead
    let upload_limit = state.config.max_file_size.saturating_add(1024 * 1024);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api/upload/",
            post(api::handlers::upload::upload_archive)
                .layer(axum::extract::DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/upload",
            post(api::handlers::upload::upload_archive)
                .layer(axum::extract::DefaultBodyLimit::max(upload_limit)),
        )
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        // Inside the trace id middleware, so the `http` span carries the bound
        // token whether it came in on the request or was minted here.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http",
                        method = %request.method(),
                        uri = %request.uri(),
                        trace_id = %trace::current(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    tracing::info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                    tracing::info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                }),
        )
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::trace_id::trace_id_middleware,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([state.config.trace_header.clone()]),
        )
        .with_state(state)
}

