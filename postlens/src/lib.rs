//! # postlens: text extraction and suggestions for social media posts
//!
//! `postlens` is a small HTTP service. A client uploads a PDF or an image of a social media post;
//! the service extracts its text and asks a large language model for five short suggestions on
//! how to improve engagement. Nothing is persisted: every request is handled in memory and
//! forgotten once the response is written.
//!
//! ## Request Flow
//!
//! `POST /upload` takes a `multipart/form-data` body with a single `file` part. The handler
//! streams that part into memory, aborting as soon as it exceeds the configured upload limit,
//! and hands it to the [`pipeline`]:
//!
//! 1. The declared content type picks an extraction strategy ([`extraction`]): `application/pdf`
//!    goes to the PDF text layer reader, any `image/*` type goes to Tesseract OCR, anything else
//!    is rejected.
//! 2. Text that is empty once whitespace is trimmed is rejected before any network call.
//! 3. The text is sent to an OpenAI-compatible chat completions endpoint ([`analysis`]). This
//!    step never fails the request: if the service is unreachable, the response carries a fixed
//!    sentinel instead of suggestions.
//!
//! The response is `{"extractedText": ..., "suggestions": ...}`; errors are
//! `{"errorKind": ..., "message": ...}` with a 4xx or 5xx status ([`errors`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use postlens::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = postlens::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     postlens::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`config`] for the YAML layout and environment overrides. The suggestion service
//! credential is read from `OPENROUTER_API_KEY`.

pub mod analysis;
pub mod api;
pub mod config;
pub mod errors;
pub mod extraction;
mod openapi;
pub mod pipeline;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use crate::analysis::{Analyze, SuggestionClient};
use crate::config::CorsOrigin;
use crate::extraction::Extractors;
use crate::openapi::ApiDoc;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{
    Json, Router,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Room left on top of the upload limit for multipart boundaries and part headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across all request handlers.
///
/// The extraction strategies and the analyzer sit behind trait objects so tests can swap in
/// stubs without touching the router.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .extractors(extractors)
///     .analyzer(analyzer)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub extractors: Extractors,
    pub analyzer: Arc<dyn Analyze>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // `AllowOrigin::list` rejects `*`, so the wildcard maps to `Any`
    let allow_origin = if config.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::from(Any)
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// # Errors
///
/// Returns an error if the CORS configuration cannot be turned into header values.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let body_limit = usize::try_from(state.config.limits.max_upload_size)?.saturating_add(MULTIPART_OVERHEAD_BYTES);

    let router = Router::new()
        .route("/", get(api::handlers::health::health))
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/upload",
            post(api::handlers::documents::upload_document).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state.clone())
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] builds the extraction strategies, the suggestion client
///    and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal is received, in-flight requests finish and
///    telemetry is flushed
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with the production collaborators
    pub fn new(config: Config) -> anyhow::Result<Self> {
        info!(
            model = %config.analysis.model,
            tesseract = %config.ocr.tesseract_path,
            max_upload_size = config.limits.max_upload_size,
            api_key_configured = config.analysis.api_key.is_some(),
            "Starting postlens"
        );

        let analyzer = SuggestionClient::new(&config.analysis)?;
        let state = AppState::builder()
            .config(config.clone())
            .extractors(Extractors::from_config(&config.ocr))
            .analyzer(Arc::new(analyzer))
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Server listening on http://{}, available at http://localhost:{}", bind_addr, self.config.port);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
