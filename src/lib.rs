//! # url2pdf-api
//!
//! URL-to-PDF endpoint for short-lived, time-boxed hosts such as serverless
//! functions.
//!
//! One headless Chrome process is shared by every request of a host and kept
//! warm between invocations. A request names one URL or an ordered batch;
//! each URL is rendered to PDF, batches are merged into one document, and
//! the result is returned inline, as a link into a blob store, or as raw
//! bytes.
//!
//! ## Features
//!
//! - **Shared Browser**: at most one engine per host, launched lazily,
//!   relaunched when it stops answering, torn down only when the host is
//!   about to run out of time
//! - **Render Budget**: no new URL starts once the request deadline minus a
//!   safety margin has passed; pages already rendered are still returned
//! - **Partial Batches**: failed URLs are skipped, the rest are merged in
//!   request order, capped at five URLs per request by default
//! - **Product Cache**: optionally store results under a product identity and
//!   serve repeats without rendering
//! - **Pluggable Delivery**: base64 JSON, storage URL or direct download
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │   Host (Axum server / serverless adapter)   │
//! └─────────────────┬───────────────────────────┘
//!                   │ method, body, deadline
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  service::handle  →  PdfConverter           │
//! │   validate → cache → render batch → merge   │
//! │            → store → reply                  │
//! └──────┬──────────────────┬───────────────────┘
//!        │                  │
//!        ▼                  ▼
//! ┌──────────────┐   ┌──────────────────────────┐
//! │ BrowserPool  │   │ BlobStore                │
//! │ (one Chrome) │   │ (memory / filesystem)    │
//! └──────────────┘   └──────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use url2pdf_api::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = BrowserPool::builder()
//!         .factory(Box::new(ChromeBrowserFactory::with_defaults()))
//!         .build()?
//!         .into_shared();
//!     pool.warmup().await?;
//!
//!     let converter = PdfConverter::new(
//!         pool,
//!         Arc::new(MemoryBlobStore::new()),
//!         ConverterConfig::default(),
//!     );
//!
//!     let request = ConversionRequest::batch(["https://example.com/a", "https://example.com/b"]);
//!     let ctx = InvocationContext::for_config(converter.config());
//!     let outcome = tokio::task::spawn_blocking(move || converter.convert(&request, &ctx)).await??;
//!
//!     println!("{} page(s) -> {:?}", outcome.processed_pages.unwrap_or(1), outcome.pdf_url);
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Configuration
//!
//! With the `env-config` feature (default), configuration is read from an
//! `app.env` file and the process environment. See [`config::env`] for the
//! full list.
//!
//! ```text
//! PDF_PAGE_CAP=5
//! PDF_EXECUTION_LIMIT_MS=10000
//! PDF_SAFETY_MARGIN_MS=2000
//! PDF_DELIVERY=storage-url
//! PDF_CACHE=off
//! PUBLIC_BASE_URL=https://pdf.example.com
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `env-config` | Environment-based configuration (default) |
//! | `axum-integration` | Axum router for the endpoint, blob and health routes |
//! | `server` | The `url2pdf-server` binary |
//! | `test-utils` | Mock browser factory for testing |
//!
//! ## Testing
//!
//! For testing without Chrome, enable the `test-utils` feature and use
//! [`MockBrowserFactory`](factory::mock::MockBrowserFactory). Its pages
//! print real one-page PDFs, so merged output can be inspected:
//!
//! ```rust,ignore
//! use url2pdf_api::factory::mock::MockBrowserFactory;
//!
//! let factory = MockBrowserFactory::new().with_failing_url("https://down.example");
//! let pool = BrowserPool::builder().factory(Box::new(factory)).build()?;
//! ```

#![doc(html_root_url = "https://docs.rs/url2pdf-api/0.1.0")]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod budget;
pub mod config;
pub mod error;
pub mod factory;
pub mod handle;
pub mod merge;
pub mod pool;
pub mod prelude;
pub mod service;
pub mod stats;
pub mod storage;
pub mod traits;

// Internal modules (not publicly exposed)
pub(crate) mod tracked;

// ============================================================================
// Feature-gated modules
// ============================================================================

/// Web framework integrations.
///
/// Enable `axum-integration` to use them.
#[cfg(feature = "axum-integration")]
pub mod integrations;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

// Core types
pub use budget::{RenderBudget, remaining_budget};
pub use config::{CachePolicy, ConverterConfig, ConverterConfigBuilder, DeliveryStrategy};
pub use error::{BrowserPoolError, Result};
pub use factory::{BrowserFactory, ChromeBrowserFactory, create_chrome_options};
pub use handle::{BrowserHandle, PageSession};
pub use merge::{MergeError, PdfMerger};
pub use pool::{BrowserPool, BrowserPoolBuilder, SharedBrowserPool};
pub use service::{ConversionRequest, InvocationContext, PdfConverter, PdfServiceError};
pub use stats::PoolStats;
pub use storage::{BlobStore, FsBlobStore, MemoryBlobStore, StorageError};
pub use traits::{Healthcheck, PrintProfile, RenderBrowser, RenderPage};

// Feature-gated re-exports
#[cfg(feature = "env-config")]
pub use config::env::{chrome_path_from_env, from_env};

#[cfg(feature = "env-config")]
pub use pool::init_browser_pool;
