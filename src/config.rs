//! Configuration for the converter.
//!
//! This module provides [`ConverterConfig`] and [`ConverterConfigBuilder`]
//! for the render budget, the batch page cap, how results are delivered and
//! whether results are cached by product identity.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use url2pdf_api::{ConverterConfigBuilder, DeliveryStrategy};
//!
//! let config = ConverterConfigBuilder::new()
//!     .page_cap(5)
//!     .execution_limit(Duration::from_secs(10))
//!     .safety_margin(Duration::from_secs(2))
//!     .delivery(DeliveryStrategy::InlineBase64)
//!     .build()
//!     .expect("Invalid configuration");
//!
//! assert_eq!(config.page_cap, 5);
//! ```
//!
//! # Environment Configuration
//!
//! When the `env-config` feature is enabled, you can load configuration
//! from environment variables (and an optional `app.env` file):
//!
//! ```rust,ignore
//! use url2pdf_api::config::env::from_env;
//!
//! let config = from_env()?;
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How a successful conversion is handed back to the caller.
///
/// | Strategy | Response |
/// |----------|----------|
/// | `InlineBase64` | JSON with the PDF base64-encoded in `pdf` |
/// | `StorageUrl` | JSON with a `pdfUrl` pointing at the blob store |
/// | `DirectBytes` | raw `application/pdf` body as an attachment |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryStrategy {
    InlineBase64,
    #[default]
    StorageUrl,
    DirectBytes,
}

impl DeliveryStrategy {
    /// Whether this strategy needs the PDF written to the blob store.
    pub fn requires_storage(&self) -> bool {
        matches!(self, Self::StorageUrl)
    }
}

impl FromStr for DeliveryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline-base64" | "inline" | "base64" => Ok(Self::InlineBase64),
            "storage-url" | "url" | "storage" => Ok(Self::StorageUrl),
            "direct-bytes" | "bytes" | "direct" => Ok(Self::DirectBytes),
            other => Err(format!("unknown delivery strategy '{}'", other)),
        }
    }
}

impl fmt::Display for DeliveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InlineBase64 => "inline-base64",
            Self::StorageUrl => "storage-url",
            Self::DirectBytes => "direct-bytes",
        })
    }
}

/// Whether finished documents are cached under a product-derived key.
///
/// With `ProductIdentity`, requests must carry `productId` and
/// `productName`; a stored entry for the same pair is returned without
/// touching the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    #[default]
    Off,
    ProductIdentity,
}

impl FromStr for CachePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "false" | "0" => Ok(Self::Off),
            "product" | "product-identity" | "on" | "true" | "1" => Ok(Self::ProductIdentity),
            other => Err(format!("unknown cache policy '{}'", other)),
        }
    }
}

/// Converter configuration.
///
/// Controls the render budget, batch limits, delivery and caching.
///
/// # Budget Arithmetic
///
/// ```text
/// |<------------------ execution_limit (10s) ------------------>|
/// |<------- usable budget (8s) ------->|<-- safety_margin (2s) ->|
/// ^ request start                      ^ no new URL starts after here
/// ```
///
/// `operation_timeout` bounds a single navigation or print and is enforced
/// by the render engine, independently of the request budget.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Maximum number of URLs attempted from one batch request.
    ///
    /// Default: 5
    pub page_cap: usize,

    /// Wall-clock allowance the host grants one invocation.
    ///
    /// Used as the deadline when the host supplies no remaining-time signal.
    ///
    /// Default: 10 seconds
    pub execution_limit: Duration,

    /// Slack kept back from the deadline for merging, storing and replying.
    ///
    /// Default: 2 seconds
    pub safety_margin: Duration,

    /// Per-operation timeout for navigation and printing.
    ///
    /// Default: 8 seconds
    pub operation_timeout: Duration,

    /// Upper bound on waiting for `document.readyState === 'complete'`
    /// after navigation.
    ///
    /// Default: 2 seconds
    pub ready_wait: Duration,

    /// When the host reports less remaining time than this at the end of a
    /// request, the shared browser is closed instead of kept warm.
    ///
    /// Default: 1 second
    pub teardown_threshold: Duration,

    /// How results are returned.
    ///
    /// Default: [`DeliveryStrategy::StorageUrl`]
    pub delivery: DeliveryStrategy,

    /// Result caching.
    ///
    /// Default: [`CachePolicy::Off`]
    pub cache_policy: CachePolicy,

    /// Externally reachable base URL used to build `pdfUrl`.
    ///
    /// Default: `http://localhost:8080`
    pub public_base_url: String,

    /// Path under `public_base_url` where stored PDFs are served.
    ///
    /// Default: `/blobs/pdfs`
    pub blob_route: String,
}

impl Default for ConverterConfig {
    /// Production-ready defaults matching a 10 second serverless function.
    ///
    /// | Setting | Default |
    /// |---------|---------|
    /// | `page_cap` | 5 |
    /// | `execution_limit` | 10s |
    /// | `safety_margin` | 2s |
    /// | `operation_timeout` | 8s |
    /// | `ready_wait` | 2s |
    /// | `teardown_threshold` | 1s |
    /// | `delivery` | storage-url |
    /// | `cache_policy` | off |
    fn default() -> Self {
        Self {
            page_cap: 5,
            execution_limit: Duration::from_secs(10),
            safety_margin: Duration::from_secs(2),
            operation_timeout: Duration::from_secs(8),
            ready_wait: Duration::from_secs(2),
            teardown_threshold: Duration::from_secs(1),
            delivery: DeliveryStrategy::default(),
            cache_policy: CachePolicy::default(),
            public_base_url: "http://localhost:8080".to_string(),
            blob_route: "/blobs/pdfs".to_string(),
        }
    }
}

impl ConverterConfig {
    /// Public URL of a stored blob.
    ///
    /// # Example
    ///
    /// ```rust
    /// use url2pdf_api::ConverterConfig;
    ///
    /// let config = ConverterConfig::default();
    /// assert_eq!(
    ///     config.blob_url("1700000000000-abc.pdf"),
    ///     "http://localhost:8080/blobs/pdfs/1700000000000-abc.pdf"
    /// );
    /// ```
    pub fn blob_url(&self, key: &str) -> String {
        format!(
            "{}{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.blob_route.trim_end_matches('/'),
            urlencoding::encode(key)
        )
    }
}

/// Builder for [`ConverterConfig`] with validation.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use url2pdf_api::{CachePolicy, ConverterConfigBuilder};
///
/// let config = ConverterConfigBuilder::new()
///     .cache_policy(CachePolicy::ProductIdentity)
///     .operation_timeout(Duration::from_secs(5))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.cache_policy, CachePolicy::ProductIdentity);
/// ```
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: ConverterConfig::default(),
        }
    }

    /// Set the maximum number of URLs attempted per batch.
    ///
    /// Must be greater than 0.
    pub fn page_cap(mut self, cap: usize) -> Self {
        self.config.page_cap = cap;
        self
    }

    /// Set the per-invocation execution allowance.
    pub fn execution_limit(mut self, limit: Duration) -> Self {
        self.config.execution_limit = limit;
        self
    }

    /// Set the safety margin subtracted from the deadline.
    ///
    /// Must be smaller than the execution limit.
    pub fn safety_margin(mut self, margin: Duration) -> Self {
        self.config.safety_margin = margin;
        self
    }

    /// Set the per-navigation/print timeout.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = timeout;
        self
    }

    /// Set the maximum wait for document readiness after navigation.
    pub fn ready_wait(mut self, wait: Duration) -> Self {
        self.config.ready_wait = wait;
        self
    }

    /// Set the remaining-time threshold below which the browser is closed.
    pub fn teardown_threshold(mut self, threshold: Duration) -> Self {
        self.config.teardown_threshold = threshold;
        self
    }

    /// Set the delivery strategy.
    pub fn delivery(mut self, delivery: DeliveryStrategy) -> Self {
        self.config.delivery = delivery;
        self
    }

    /// Set the cache policy.
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.config.cache_policy = policy;
        self
    }

    /// Set the public base URL used for `pdfUrl`.
    pub fn public_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.public_base_url = url.into();
        self
    }

    /// Set the route under which blobs are served.
    pub fn blob_route<S: Into<String>>(mut self, route: S) -> Self {
        self.config.blob_route = route.into();
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - Returns error if `page_cap` is 0
    /// - Returns error if `safety_margin >= execution_limit`
    /// - Returns error if `operation_timeout` is zero
    /// - Returns error if `blob_route` does not start with `/`
    /// - Returns error if `public_base_url` is not an absolute URL
    pub fn build(self) -> std::result::Result<ConverterConfig, String> {
        let config = self.config;

        if config.page_cap == 0 {
            return Err("page_cap must be greater than 0".to_string());
        }

        if config.safety_margin >= config.execution_limit {
            return Err("safety_margin must be smaller than execution_limit".to_string());
        }

        if config.operation_timeout.is_zero() {
            return Err("operation_timeout must be greater than 0".to_string());
        }

        if !config.blob_route.starts_with('/') {
            return Err("blob_route must start with '/'".to_string());
        }

        if url::Url::parse(&config.public_base_url).is_err() {
            return Err(format!(
                "public_base_url '{}' is not an absolute URL",
                config.public_base_url
            ));
        }

        Ok(config)
    }
}

impl Default for ConverterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Configuration (feature-gated)
// ============================================================================

/// Environment-based configuration loading.
///
/// This module is only available when the `env-config` feature is enabled.
/// It loads an optional `app.env` file via `dotenvy`, then reads:
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `PDF_PAGE_CAP` | usize | 5 | Max URLs per batch |
/// | `PDF_EXECUTION_LIMIT_MS` | u64 | 10000 | Execution allowance |
/// | `PDF_SAFETY_MARGIN_MS` | u64 | 2000 | Budget safety margin |
/// | `PDF_OPERATION_TIMEOUT_MS` | u64 | 8000 | Navigation/print timeout |
/// | `PDF_READY_WAIT_MS` | u64 | 2000 | Readiness wait |
/// | `PDF_TEARDOWN_THRESHOLD_MS` | u64 | 1000 | Browser teardown threshold |
/// | `PDF_DELIVERY` | String | storage-url | Delivery strategy |
/// | `PDF_CACHE` | String | off | Cache policy |
/// | `PUBLIC_BASE_URL` or `URL` | String | `http://localhost:8080` | Base for `pdfUrl` |
/// | `PDF_BLOB_ROUTE` | String | `/blobs/pdfs` | Blob serving route |
/// | `PDF_BLOB_DIR` | String | unset | Filesystem blob directory |
/// | `CHROME_PATH` | String | auto | Custom Chrome binary path |
/// | `BIND_ADDR` | String | `0.0.0.0:8080` | Server listen address |
///
/// # Example `app.env` File
///
/// ```text
/// PDF_PAGE_CAP=5
/// PDF_DELIVERY=storage-url
/// PDF_CACHE=product
/// PDF_BLOB_DIR=/tmp/pdfs
/// PUBLIC_BASE_URL=https://pdf.example.com
/// # CHROME_PATH=/usr/bin/chromium
/// ```
#[cfg(feature = "env-config")]
pub mod env {
    use super::*;
    use crate::error::BrowserPoolError;

    /// Default environment file name.
    pub const ENV_FILE_NAME: &str = "app.env";

    /// Default listen address for the bundled server.
    pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

    /// Load environment variables from `app.env` file.
    ///
    /// # Errors
    ///
    /// Returns `dotenvy::Error` if the file was not found or couldn't be parsed.
    pub fn load_env_file() -> Result<std::path::PathBuf, dotenvy::Error> {
        dotenvy::from_filename(ENV_FILE_NAME)
    }

    fn millis(name: &str, default: u64) -> Duration {
        Duration::from_millis(
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default),
        )
    }

    /// Load configuration from environment variables.
    ///
    /// Also loads `app.env` if present. Unparseable numbers fall back to
    /// their defaults; unknown delivery or cache names are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserPoolError::Configuration`] if configuration values are invalid.
    pub fn from_env() -> Result<ConverterConfig, BrowserPoolError> {
        match load_env_file() {
            Ok(path) => {
                log::info!("📄 Loaded configuration from: {:?}", path);
            }
            Err(e) => {
                log::debug!(
                    "📄 No {} file found or failed to load: {} (using environment variables and defaults)",
                    ENV_FILE_NAME,
                    e
                );
            }
        }

        let page_cap = std::env::var("PDF_PAGE_CAP")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let execution_limit = millis("PDF_EXECUTION_LIMIT_MS", 10_000);
        let safety_margin = millis("PDF_SAFETY_MARGIN_MS", 2_000);
        let operation_timeout = millis("PDF_OPERATION_TIMEOUT_MS", 8_000);
        let ready_wait = millis("PDF_READY_WAIT_MS", 2_000);
        let teardown_threshold = millis("PDF_TEARDOWN_THRESHOLD_MS", 1_000);

        let delivery = match std::env::var("PDF_DELIVERY") {
            Ok(value) => value.parse().map_err(BrowserPoolError::Configuration)?,
            Err(_) => DeliveryStrategy::default(),
        };

        let cache_policy = match std::env::var("PDF_CACHE") {
            Ok(value) => value.parse().map_err(BrowserPoolError::Configuration)?,
            Err(_) => CachePolicy::default(),
        };

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .or_else(|_| std::env::var("URL"))
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let blob_route =
            std::env::var("PDF_BLOB_ROUTE").unwrap_or_else(|_| "/blobs/pdfs".to_string());

        log::info!("⚙️ Loading converter configuration from environment:");
        log::info!("   - Page cap: {}", page_cap);
        log::info!(
            "   - Budget: {:?} limit, {:?} margin",
            execution_limit,
            safety_margin
        );
        log::info!("   - Operation timeout: {:?}", operation_timeout);
        log::info!("   - Delivery: {}", delivery);
        log::info!("   - Cache: {:?}", cache_policy);
        log::info!("   - Public base URL: {}", public_base_url);

        ConverterConfigBuilder::new()
            .page_cap(page_cap)
            .execution_limit(execution_limit)
            .safety_margin(safety_margin)
            .operation_timeout(operation_timeout)
            .ready_wait(ready_wait)
            .teardown_threshold(teardown_threshold)
            .delivery(delivery)
            .cache_policy(cache_policy)
            .public_base_url(public_base_url)
            .blob_route(blob_route)
            .build()
            .map_err(BrowserPoolError::Configuration)
    }

    /// Get Chrome path from environment (`CHROME_PATH`).
    ///
    /// **Note:** Call [`from_env`] or [`load_env_file`] first if you're
    /// using a configuration file.
    pub fn chrome_path_from_env() -> Option<String> {
        std::env::var("CHROME_PATH").ok()
    }

    /// Get the filesystem blob directory from environment (`PDF_BLOB_DIR`).
    ///
    /// `None` means results are kept in memory only.
    pub fn blob_dir_from_env() -> Option<std::path::PathBuf> {
        std::env::var("PDF_BLOB_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(std::path::PathBuf::from)
    }

    /// Get the listen address from environment (`BIND_ADDR`).
    pub fn bind_addr_from_env() -> String {
        std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
