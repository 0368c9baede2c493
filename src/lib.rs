//! # pdfseal: PDF password-encryption service
//!
//! `pdfseal` accepts a PDF file and a password over HTTP and returns a
//! password-encrypted copy of that PDF, either as a downloadable file or as a
//! base64-encoded JSON payload. The cryptographic work is delegated to the
//! qpdf command-line tool; the service's own logic is request validation,
//! per-request temporary-file lifecycle management, and response-format
//! negotiation.
//!
//! ## Request Flow
//!
//! A `POST /upload` request moves through a strictly linear pipeline:
//!
//! 1. **Intake** — the multipart body is parsed into the `pdf` file part and
//!    the `password`, `filename`, and `return_base64` fields.
//! 2. **Validation** — requests missing the file or the password are rejected
//!    with a 400 before anything touches disk.
//! 3. **Staging** — the upload is written to a unique temp path under the
//!    configured data directory. The [`staging::TempFiles`] guard created
//!    here owns both temp paths and removes them on every exit path.
//! 4. **Encryption** — qpdf is spawned with a fixed argument array (equal
//!    owner/user passwords, 256-bit keys, all document permissions disabled)
//!    and awaited asynchronously, so a slow encryption never stalls other
//!    requests.
//! 5. **Response** — inline base64 JSON when the client asked for it
//!    (`return_base64` or `Accept: application/json`), a streamed attachment
//!    download otherwise.
//!
//! Requests share nothing: temp paths embed a fresh UUID per request, so no
//! locks are needed and concurrent requests cannot observe each other's
//! files.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use pdfseal::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = pdfseal::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     pdfseal::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
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
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod encryptor;
pub mod errors;
mod openapi;
pub mod staging;
mod static_assets;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use crate::config::CorsOrigin;
use crate::encryptor::{PdfEncryptor, QpdfEncryptor};
use crate::openapi::ApiDoc;
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// Holds the configuration loaded at startup and the encryption backend. The
/// encryptor sits behind a trait object so tests can substitute an in-process
/// fake for the real qpdf invocation.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub encryptor: Arc<dyn PdfEncryptor>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;
    let wildcard = cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard));

    let mut cors = if cors_config.allow_credentials {
        // Wildcard method/header grants are invalid alongside credentials
        CorsLayer::new()
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new().allow_methods(Any).allow_headers(Any)
    };

    if wildcard {
        cors = cors.allow_origin(Any);
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        cors = cors.allow_origin(origins);
    }

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - `GET /health` — liveness probe
/// - `POST /upload` — the encryption pipeline, with a per-route body limit
///   from `limits.max_upload_bytes`
/// - `GET /upload` — redirect back to the upload page
/// - `GET /docs` — interactive OpenAPI reference
/// - fallback — the embedded web UI
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let upload_limit = state.config.limits.max_upload_bytes;
    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/health", get(api::handlers::health::health))
        .route(
            "/upload",
            post(api::handlers::encrypt::encrypt_pdf)
                .get(api::handlers::encrypt::upload_redirect)
                .layer(DefaultBodyLimit::max(upload_limit as usize)),
        )
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback(api::handlers::static_assets::serve_embedded_asset)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] ensures the data directory exists and
///    builds the router with the qpdf-backed encryptor
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting PDF encryption service with configuration: {:#?}", config);

        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", config.data_dir.display()))?;

        let encryptor: Arc<dyn PdfEncryptor> = Arc::new(QpdfEncryptor::new(
            config.encryption.binary.clone(),
            config.encryption.timeout,
        ));

        let state = AppState {
            config: config.clone(),
            encryptor,
        };
        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "PDF encryption service listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
