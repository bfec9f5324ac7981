//! Conversion service module.
//!
//! The **framework-agnostic core** of the URL-to-PDF endpoint: request and
//! response types, the conversion pipeline and a transport-neutral request
//! handler.
//!
//! # Module Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       service module                             │
//! │                                                                  │
//! │  types.rs             pdf.rs                 endpoint.rs         │
//! │  ConversionRequest    PdfConverter           handle()            │
//! │  PageOutcome          InvocationContext      HttpReply           │
//! │  ConvertResponse                                                 │
//! │  PdfServiceError                                                 │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │ used by
//!                                 ▼
//!            integrations::axum (server) / any serverless adapter
//! ```
//!
//! # Design Philosophy
//!
//! **Thin handler, thick service.** [`PdfConverter`] owns validation,
//! caching, rendering, merging and storing. [`handle`] maps methods and
//! bodies onto it and shapes the reply. Framework glue only moves bytes.
//!
//! # Blocking Behavior
//!
//! ⚠️ [`PdfConverter::convert`] and [`handle`] block the calling thread for
//! the whole render. From async code, wrap them:
//!
//! ```rust,ignore
//! let reply = tokio::task::spawn_blocking(move || {
//!     handle(&converter, "POST", &body, &ctx)
//! })
//! .await?;
//! ```
//!
//! # Error Handling
//!
//! Every failure is a [`PdfServiceError`] with an HTTP status and a stable
//! code:
//!
//! ```rust
//! use url2pdf_api::service::{ErrorResponse, PdfServiceError};
//!
//! let error = PdfServiceError::MissingTargets;
//! let body = ErrorResponse::from(&error);
//!
//! assert_eq!(error.status_code(), 400);
//! assert_eq!(body.message, "Page URL not defined");
//! ```

mod endpoint;
mod pdf;
mod types;

// ============================================================================
// Re-exports: Types
// ============================================================================

pub use types::BatchReport;
pub use types::ConversionOutcome;
pub use types::ConversionRequest;
pub use types::ConvertResponse;
pub use types::ErrorResponse;
pub use types::HealthResponse;
pub use types::PageOutcome;
pub use types::PageTargets;
pub use types::PdfServiceError;
pub use types::ProductId;
pub use types::SkipReason;

pub use pdf::InvocationContext;
pub use pdf::PdfConverter;
pub use pdf::SharedPdfConverter;

pub use endpoint::HttpReply;

// ============================================================================
// Re-exports: Functions
// ============================================================================

pub use endpoint::error_reply;
pub use endpoint::handle;
pub use endpoint::success_reply;

// ============================================================================
// Re-exports: Constants
// ============================================================================

pub use endpoint::CONTENT_TYPE_JSON;
pub use endpoint::CONTENT_TYPE_PDF;
pub use endpoint::CORS_HEADERS;
pub use types::MESSAGE_CACHED;
pub use types::MESSAGE_GENERATED;

// ============================================================================
// Module-level tests
// ============================================================================
