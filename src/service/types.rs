//! Shared types for the conversion service.
//!
//! These types are framework-agnostic. They define the request body the
//! endpoint accepts, the per-URL results of a batch, the JSON bodies the
//! endpoint returns and the error taxonomy with its HTTP mapping.
//!
//! # Overview
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ConversionRequest`] | Decoded POST body |
//! | [`PageOutcome`] / [`BatchReport`] | Per-URL result of a batch |
//! | [`ConversionOutcome`] | Finished document plus delivery details |
//! | [`ConvertResponse`] | JSON success body |
//! | [`PdfServiceError`] | Error types with HTTP status mapping |
//! | [`ErrorResponse`] | JSON error body |
//! | [`HealthResponse`] | Health check body |
//!
//! # Request Body
//!
//! ```json
//! { "pageToPdf": ["https://a.example", "https://b.example"],
//!   "productId": 42,
//!   "productName": "Blue Widget" }
//! ```
//!
//! `pageToPdf` may also be a single string. `productId` may be a string or a
//! number.

use serde::{Deserialize, Serialize};

use crate::stats::PoolStats;

/// Success message for freshly rendered documents.
pub const MESSAGE_GENERATED: &str = "PDF generated successfully";

/// Success message for documents served from the cache.
pub const MESSAGE_CACHED: &str = "PDF retrieved from cache";

// ============================================================================
// Request Types
// ============================================================================

/// One URL or an ordered list of URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageTargets {
    One(String),
    Many(Vec<String>),
}

impl PageTargets {
    /// Targets in request order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(url) => std::slice::from_ref(url),
            Self::Many(urls) => urls,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// Product identifier as sent by clients, either `"42"` or `42`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Text(String),
    Number(serde_json::Number),
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Body of a conversion request.
///
/// # Fields
///
/// | Field | JSON name | Required |
/// |-------|-----------|----------|
/// | `page_to_pdf` | `pageToPdf` | yes |
/// | `product_id` | `productId` | with product caching |
/// | `product_name` | `productName` | with product caching |
///
/// Absent fields decode to `None` so the converter can answer with its own
/// 400 rather than a decoding error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_to_pdf: Option<PageTargets>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl ConversionRequest {
    /// Request for a single URL.
    pub fn single<S: Into<String>>(url: S) -> Self {
        Self {
            page_to_pdf: Some(PageTargets::One(url.into())),
            ..Default::default()
        }
    }

    /// Request for an ordered batch of URLs.
    pub fn batch<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            page_to_pdf: Some(PageTargets::Many(urls.into_iter().map(Into::into).collect())),
            ..Default::default()
        }
    }

    /// Attach a product identity.
    pub fn with_product<N: Into<String>, I: Into<String>>(mut self, name: N, id: I) -> Self {
        self.product_name = Some(name.into());
        self.product_id = Some(ProductId::Text(id.into()));
        self
    }

    /// Requested URLs, empty when `pageToPdf` was absent.
    pub fn targets(&self) -> &[String] {
        self.page_to_pdf.as_ref().map(PageTargets::as_slice).unwrap_or(&[])
    }
}

// ============================================================================
// Batch Results
// ============================================================================

/// Why a URL was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The request budget ran out before this URL.
    BudgetExhausted,
    /// The URL sits beyond the page cap.
    PageCap,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BudgetExhausted => write!(f, "time budget exhausted"),
            Self::PageCap => write!(f, "beyond page cap"),
        }
    }
}

/// Result for one requested URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Rendered { url: String, bytes: usize },
    Failed { url: String, reason: String },
    Skipped { url: String, reason: SkipReason },
}

impl PageOutcome {
    pub fn url(&self) -> &str {
        match self {
            Self::Rendered { url, .. } | Self::Failed { url, .. } | Self::Skipped { url, .. } => url,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

/// Per-URL outcomes of one request, in request order.
///
/// There is exactly one outcome per requested URL, including URLs beyond the
/// page cap, so [`total`](Self::total) equals the request size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<PageOutcome>,
}

impl BatchReport {
    /// URLs that produced a document.
    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rendered()).count()
    }

    /// URLs requested.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PageOutcome::Failed { .. }))
            .count()
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PageOutcome::Skipped { reason: r, .. } if *r == reason))
            .count()
    }
}

/// A finished document and how it can be delivered.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    /// The PDF.
    pub bytes: Vec<u8>,

    /// Download name, always ending in `.pdf`.
    pub filename: String,

    /// Key the document is stored under, if it was stored.
    pub blob_key: Option<String>,

    /// Public URL of the stored document.
    pub pdf_url: Option<String>,

    /// Batch page counts; `None` for single-URL requests.
    pub processed_pages: Option<usize>,
    pub total_pages: Option<usize>,

    /// Served from the cache without rendering.
    pub cached: bool,

    /// Per-URL outcomes; empty for cache hits.
    pub report: BatchReport,
}

// ============================================================================
// Response Types
// ============================================================================

/// JSON body of a successful conversion.
///
/// Exactly one of `pdf_url` and `pdf` is set, depending on the delivery
/// strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub success: bool,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,

    /// Base64 of the PDF bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,

    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_pages: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

impl ConvertResponse {
    /// Success body for `outcome` without a document reference.
    ///
    /// Callers fill in `pdf_url` or `pdf`.
    pub fn for_outcome(outcome: &ConversionOutcome) -> Self {
        Self {
            success: true,
            message: if outcome.cached { MESSAGE_CACHED } else { MESSAGE_GENERATED }.to_string(),
            pdf_url: None,
            pdf: None,
            filename: outcome.filename.clone(),
            processed_pages: outcome.processed_pages,
            total_pages: outcome.total_pages,
            cached: outcome.cached,
        }
    }
}

/// Health check body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy",
            service: "url2pdf-api",
            pool: None,
        }
    }
}

impl HealthResponse {
    pub fn with_pool(stats: PoolStats) -> Self {
        Self {
            pool: Some(stats),
            ..Self::default()
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Request-level errors.
///
/// Client mistakes map to 400/405. Everything that goes wrong on our side
/// maps to 500 with the cause in the `error` field.
///
/// Failures of individual URLs inside a batch are not errors; they show up
/// as [`PageOutcome::Failed`].
#[derive(Debug, Clone, PartialEq)]
pub enum PdfServiceError {
    /// `pageToPdf` is absent, empty or blank.
    MissingTargets,

    /// The only target of a single-URL request is not an absolute URL.
    InvalidUrl(String),

    /// Product caching is on and `productId` or `productName` is missing.
    MissingProductIdentity,

    /// The body is not valid JSON of the expected shape.
    MalformedBody(String),

    /// Any method other than `POST` or `OPTIONS`.
    MethodNotSupported(String),

    /// The engine could not be launched or a page could not be opened.
    BrowserUnavailable(String),

    /// The only URL of a single-URL request failed.
    RenderFailed(String),

    /// No URL of a batch produced a page.
    NothingRendered { requested: usize },

    /// The blob store rejected a read or write.
    Storage(String),

    /// Merging or another unexpected step failed.
    Internal(String),
}

impl std::fmt::Display for PdfServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTargets => write!(f, "Page URL not defined"),
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            Self::MissingProductIdentity => write!(f, "Product id and name are required"),
            Self::MalformedBody(msg) => write!(f, "Invalid request body: {}", msg),
            Self::MethodNotSupported(method) => write!(f, "Method {} not allowed", method),
            Self::BrowserUnavailable(msg) => write!(f, "Browser unavailable: {}", msg),
            Self::RenderFailed(msg) => write!(f, "Rendering failed: {}", msg),
            Self::NothingRendered { requested } => {
                write!(f, "None of {} page(s) could be rendered", requested)
            }
            Self::Storage(msg) => write!(f, "Storage failed: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for PdfServiceError {}

impl PdfServiceError {
    /// HTTP status code for this error.
    ///
    /// | Status | Errors |
    /// |--------|--------|
    /// | 400 | `MissingTargets`, `InvalidUrl`, `MissingProductIdentity`, `MalformedBody` |
    /// | 405 | `MethodNotSupported` |
    /// | 500 | everything else |
    ///
    /// # Examples
    ///
    /// ```rust
    /// use url2pdf_api::service::PdfServiceError;
    ///
    /// assert_eq!(PdfServiceError::MissingTargets.status_code(), 400);
    /// assert_eq!(PdfServiceError::Storage("disk full".into()).status_code(), 500);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            // Client errors
            Self::MissingTargets
            | Self::InvalidUrl(_)
            | Self::MissingProductIdentity
            | Self::MalformedBody(_) => 400,

            Self::MethodNotSupported(_) => 405,

            // Server errors
            Self::BrowserUnavailable(_)
            | Self::RenderFailed(_)
            | Self::NothingRendered { .. }
            | Self::Storage(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingTargets => "MISSING_URL",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::MissingProductIdentity => "MISSING_PRODUCT",
            Self::MalformedBody(_) => "MALFORMED_BODY",
            Self::MethodNotSupported(_) => "METHOD_NOT_ALLOWED",
            Self::BrowserUnavailable(_) => "BROWSER_UNAVAILABLE",
            Self::RenderFailed(_) => "RENDER_FAILED",
            Self::NothingRendered { .. } => "NOTHING_RENDERED",
            Self::Storage(_) => "STORAGE_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns `true` if the whole request is worth sending again.
    ///
    /// Nothing is retried inside a request; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            // Client errors - must fix request
            Self::MissingTargets
            | Self::InvalidUrl(_)
            | Self::MissingProductIdentity
            | Self::MalformedBody(_)
            | Self::MethodNotSupported(_) => false,

            // Engine and storage hiccups
            Self::BrowserUnavailable(_)
            | Self::RenderFailed(_)
            | Self::NothingRendered { .. }
            | Self::Storage(_) => true,

            Self::Internal(_) => false,
        }
    }

    /// Top-level `message` for the JSON body.
    ///
    /// Client errors carry their own message; server errors share one and put
    /// the cause in `error`.
    pub fn public_message(&self) -> String {
        match self {
            Self::MethodNotSupported(_) => "Method not allowed".to_string(),
            e if e.status_code() == 400 => e.to_string(),
            _ => "PDF generation failed".to_string(),
        }
    }
}

/// JSON error body: `{ "message": ..., "error": ..., "code": ... }`.
///
/// `error` is present for server errors only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// See [`PdfServiceError::error_code()`].
    pub code: String,
}

impl From<&PdfServiceError> for ErrorResponse {
    fn from(err: &PdfServiceError) -> Self {
        Self {
            message: err.public_message(),
            error: (err.status_code() >= 500).then(|| err.to_string()),
            code: err.error_code().to_string(),
        }
    }
}

impl From<PdfServiceError> for ErrorResponse {
    fn from(err: PdfServiceError) -> Self {
        Self::from(&err)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
