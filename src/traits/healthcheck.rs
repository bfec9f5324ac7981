//! Liveness check for engine processes.
//!
//! The pool never runs a background keep-alive loop. Instead it asks the
//! stored browser for a [`ping()`](Healthcheck::ping) on every acquisition
//! and relaunches when the probe fails:
//!
//! ```text
//! acquire()
//!    │
//!    ├── stored browser ── ping() ──→ ✓ reuse
//!    │                          └───→ ✗ drop + relaunch
//!    └── nothing stored ───────────→ launch
//! ```

use crate::error::Result;

/// Trait for engine handles that can report whether they are still usable.
///
/// # Thread Safety
///
/// Requires `Send + Sync` because one handle is shared by every request
/// running on the host.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use url2pdf_api::{BrowserPoolError, Healthcheck, Result};
///
/// struct MyBrowser {
///     inner: SomeBrowserType,
/// }
///
/// impl Healthcheck for MyBrowser {
///     fn ping(&self) -> Result<()> {
///         self.inner
///             .version()
///             .map(|_| ())
///             .map_err(|e| BrowserPoolError::HealthCheckFailed(e.to_string()))
///     }
/// }
/// ```
pub trait Healthcheck: Send + Sync {
    /// Perform a lightweight liveness probe.
    ///
    /// Runs on the request path, so it must be cheap and must not open
    /// pages that outlive the call.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserPoolError::HealthCheckFailed`](crate::BrowserPoolError::HealthCheckFailed)
    /// if the process is gone or unresponsive.
    fn ping(&self) -> Result<()>;

    /// `ping()` folded into a boolean.
    fn is_alive(&self) -> bool {
        self.ping().is_ok()
    }
}
