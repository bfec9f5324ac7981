//! Axum framework integration.
//!
//! Serves the conversion endpoint, the stored PDFs behind returned
//! `pdfUrl`s and a health check.
//!
//! # Setup
//!
//! ```toml
//! [dependencies]
//! url2pdf-api = { version = "0.1", features = ["axum-integration"] }
//! axum = "0.8"
//! ```
//!
//! # Routes
//!
//! | Route | Method | Handler |
//! |-------|--------|---------|
//! | `/pdf` | any | [`convert`] (non-POST/OPTIONS answered with 405) |
//! | `{blob_route}/{key}` | GET | [`serve_blob`] |
//! | `/health` | GET | [`health`] |
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use url2pdf_api::prelude::*;
//! use url2pdf_api::integrations::axum::router;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = init_browser_pool().await.expect("Failed to initialize browser pool");
//!     let converter = PdfConverter::new(pool, Arc::new(MemoryBlobStore::new()), ConverterConfig::default())
//!         .into_shared();
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, router(converter)).await.unwrap();
//! }
//! ```
//!
//! # Blocking Work
//!
//! Conversions and store reads run on Tokio's blocking pool via
//! `spawn_blocking`; the async workers never wait on the browser.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};

use crate::service::{
    self, ErrorResponse, HealthResponse, HttpReply, InvocationContext, PdfServiceError,
    SharedPdfConverter,
};
use crate::storage::StorageError;

/// Path of the conversion endpoint.
pub const CONVERT_ROUTE: &str = "/pdf";

/// Path of the health check.
pub const HEALTH_ROUTE: &str = "/health";

/// Type alias for the Axum `State` extractor with the shared converter.
pub type ConverterState = State<SharedPdfConverter>;

/// Router with every route, bound to `converter`.
///
/// The blob route comes from the converter's configuration so returned
/// `pdfUrl`s resolve against this router.
pub fn router(converter: SharedPdfConverter) -> Router {
    let blob_path = format!(
        "{}/{{key}}",
        converter.config().blob_route.trim_end_matches('/')
    );
    log::debug!(
        "Routes: {} (convert), {} (blobs), {} (health)",
        CONVERT_ROUTE,
        blob_path,
        HEALTH_ROUTE
    );

    Router::new()
        .route(CONVERT_ROUTE, any(convert))
        .route(&blob_path, get(serve_blob))
        .route(HEALTH_ROUTE, get(health))
        .with_state(converter)
}

/// Conversion endpoint.
///
/// The invocation deadline is fixed when the request arrives, one
/// `execution_limit` ahead.
pub async fn convert(State(converter): ConverterState, method: Method, body: Bytes) -> Response {
    let ctx = InvocationContext::for_config(converter.config());
    let method = method.as_str().to_string();

    let result =
        tokio::task::spawn_blocking(move || service::handle(&converter, &method, &body, &ctx))
            .await;

    match result {
        Ok(reply) => into_response(reply),
        Err(e) => {
            log::error!("❌ Conversion task failed: {}", e);
            into_response(service::error_reply(&PdfServiceError::Internal(
                e.to_string(),
            )))
        }
    }
}

/// Stored PDF by key.
pub async fn serve_blob(State(converter): ConverterState, Path(key): Path<String>) -> Response {
    let store = Arc::clone(converter.store());
    let lookup_key = key.clone();

    let result = tokio::task::spawn_blocking(move || store.get(&lookup_key)).await;

    let reply = match result {
        Ok(Ok(Some(blob))) => {
            log::debug!("📤 Serving blob '{}' ({} bytes)", key, blob.bytes.len());
            HttpReply::empty(200)
                .with_header("Content-Type", blob.metadata.content_type)
                .with_header("Cache-Control", "public, max-age=31536000, immutable")
                .with_body(blob.bytes)
        }
        Ok(Ok(None)) | Ok(Err(StorageError::InvalidKey(_))) => {
            log::debug!("Blob '{}' not found", key);
            not_found()
        }
        Ok(Err(e)) => {
            log::error!("❌ Reading blob '{}' failed: {}", key, e);
            service::error_reply(&PdfServiceError::Storage(e.to_string()))
        }
        Err(e) => {
            log::error!("❌ Blob task failed: {}", e);
            service::error_reply(&PdfServiceError::Internal(e.to_string()))
        }
    };

    into_response(reply)
}

/// Health check with pool statistics.
pub async fn health(State(converter): ConverterState) -> Response {
    // Reading stats takes the pool lock, which a launch may hold for seconds.
    let pool = Arc::clone(converter.pool());
    match tokio::task::spawn_blocking(move || pool.stats()).await {
        Ok(stats) => into_response(HttpReply::json(200, &HealthResponse::with_pool(stats))),
        Err(e) => {
            log::error!("❌ Health task failed: {}", e);
            into_response(HttpReply::json(200, &HealthResponse::default()))
        }
    }
}

fn not_found() -> HttpReply {
    HttpReply::json(
        404,
        &ErrorResponse {
            message: "PDF not found".to_string(),
            error: None,
            code: "NOT_FOUND".to_string(),
        },
    )
}

/// Convert an [`HttpReply`] into an Axum response.
pub fn into_response(reply: HttpReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut headers = HeaderMap::with_capacity(reply.headers.len());
    for (name, value) in &reply.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => log::warn!("⚠️ Dropping invalid header {}: {:?}", name, value),
        }
    }

    (status, headers, Body::from(reply.body)).into_response()
}
