//! Error types for the browser pool and render engine.
//!
//! This module provides [`BrowserPoolError`], the error type returned by
//! everything that touches the headless engine (launching it, opening a
//! page, navigating, printing), and a convenient [`Result`] type alias.
//!
//! Request-level failures (bad input, storage, empty batches) live in
//! [`PdfServiceError`](crate::service::PdfServiceError), which wraps these.
//!
//! # Example
//!
//! ```rust
//! use url2pdf_api::{BrowserPoolError, Result};
//!
//! fn render() -> Result<Vec<u8>> {
//!     Err(BrowserPoolError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string()))
//! }
//!
//! match render() {
//!     Ok(pdf) => println!("Generated {} bytes", pdf.len()),
//!     Err(BrowserPoolError::ShuttingDown) => println!("Pool is shutting down"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

/// Errors that can occur while driving the headless engine.
///
/// # Example
///
/// ```rust
/// use url2pdf_api::BrowserPoolError;
///
/// fn describe(error: &BrowserPoolError) -> &'static str {
///     match error {
///         BrowserPoolError::BrowserCreation(_) => "launch",
///         BrowserPoolError::HealthCheckFailed(_) => "ping",
///         BrowserPoolError::PageSession(_) => "page",
///         BrowserPoolError::Navigation(_) => "navigate",
///         BrowserPoolError::Render(_) => "print",
///         BrowserPoolError::ShuttingDown => "shutdown",
///         BrowserPoolError::Configuration(_) => "config",
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BrowserPoolError {
    /// The engine process could not be started.
    ///
    /// # Common Causes
    ///
    /// - Chrome/Chromium binary not found or not executable
    /// - Invalid launch flags
    /// - Process limits reached on the host
    ///
    /// # Example
    ///
    /// ```rust
    /// use url2pdf_api::BrowserPoolError;
    ///
    /// let error = BrowserPoolError::BrowserCreation("Chrome binary not found".to_string());
    /// assert_eq!(error.to_string(), "Failed to create browser: Chrome binary not found");
    /// ```
    #[error("Failed to create browser: {0}")]
    BrowserCreation(String),

    /// The liveness probe against a running engine failed.
    ///
    /// The pool treats this as "not alive" and relaunches on the next
    /// acquisition, so callers rarely see it directly.
    #[error("Browser health check failed: {0}")]
    HealthCheckFailed(String),

    /// A page (tab) could not be opened or configured.
    #[error("Failed to open page: {0}")]
    PageSession(String),

    /// Navigation to a target URL failed or timed out.
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// The engine failed to print the loaded document to PDF.
    #[error("PDF rendering failed: {0}")]
    Render(String),

    /// Operation attempted after [`BrowserPool::shutdown()`](crate::BrowserPool::shutdown).
    ///
    /// Handle it by stopping pending work rather than retrying.
    #[error("Pool is shutting down")]
    ShuttingDown,

    /// Invalid configuration provided.
    ///
    /// # Common Causes
    ///
    /// - `page_cap` is set to 0
    /// - `safety_margin` is not smaller than `execution_limit`
    /// - Launch options could not be built
    ///
    /// # Prevention
    ///
    /// Use [`ConverterConfigBuilder`](crate::ConverterConfigBuilder)
    /// which validates configuration at build time.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Convenience conversion from [`String`] to [`BrowserPoolError::Configuration`].
///
/// # Example
///
/// ```rust
/// use url2pdf_api::BrowserPoolError;
///
/// let error: BrowserPoolError = "invalid configuration".to_string().into();
/// assert!(matches!(error, BrowserPoolError::Configuration(_)));
/// ```
impl From<String> for BrowserPoolError {
    fn from(msg: String) -> Self {
        BrowserPoolError::Configuration(msg)
    }
}

/// Convenience conversion from `&str` to [`BrowserPoolError::Configuration`].
impl From<&str> for BrowserPoolError {
    fn from(msg: &str) -> Self {
        BrowserPoolError::Configuration(msg.to_string())
    }
}

/// Result type alias using [`BrowserPoolError`].
pub type Result<T> = std::result::Result<T, BrowserPoolError>;

// ============================================================================
// Unit Tests
// ============================================================================
