//! Handles to the shared engine and RAII page sessions.
//!
//! [`BrowserHandle`] is what [`BrowserPool::acquire()`](crate::BrowserPool::acquire)
//! returns: a cheap clone of the one engine the host keeps warm. Dropping it
//! does nothing to the engine. Each request opens its own [`PageSession`]
//! from the handle, and the session closes its page when dropped, even if
//! the request returns early or panics.
//!
//! # Usage Pattern
//!
//! ```rust,ignore
//! use url2pdf_api::{PageTimeouts, PrintProfile};
//!
//! let browser = pool.acquire()?;
//! let mut session = browser.open_session(&timeouts)?;
//!
//! let pdf = session.render("https://example.com", &PrintProfile::batch())?;
//!
//! // page closed here, engine stays alive in the pool
//! drop(session);
//! ```

use std::time::Duration;

use crate::error::Result;
use crate::tracked::TrackedBrowser;
use crate::traits::{Healthcheck, PageTimeouts, PrintProfile, RenderPage};

/// Shared handle to the pool's engine.
///
/// # Thread Safety
///
/// `BrowserHandle` is `Send + Sync` and `Clone`; concurrent requests may
/// hold handles to the same engine. Pages are never shared.
#[derive(Clone)]
pub struct BrowserHandle {
    tracked: TrackedBrowser,
}

impl BrowserHandle {
    pub(crate) fn new(tracked: TrackedBrowser) -> Self {
        Self { tracked }
    }

    /// The engine's unique ID, for log correlation.
    pub fn id(&self) -> u64 {
        self.tracked.id()
    }

    /// Time since the engine was launched.
    pub fn age(&self) -> Duration {
        self.tracked.age()
    }

    /// Whether the engine still answers its liveness probe.
    pub fn is_alive(&self) -> bool {
        self.tracked.is_alive()
    }

    /// Open a page owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserPoolError::PageSession`](crate::BrowserPoolError::PageSession)
    /// if the engine cannot open a page.
    pub fn open_session(&self, timeouts: &PageTimeouts) -> Result<PageSession> {
        let page = self.tracked.browser().open_page(timeouts).inspect_err(|e| {
            log::error!("❌ Browser {} could not open a page: {}", self.id(), e);
        })?;

        log::debug!("📑 Page session opened on browser {}", self.id());

        Ok(PageSession {
            page: Some(page),
            browser_id: self.id(),
            rendered: 0,
        })
    }
}

impl std::fmt::Debug for BrowserHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserHandle")
            .field("id", &self.id())
            .field("age", &self.age())
            .finish()
    }
}

/// One request's page on the shared engine.
///
/// The page is closed when the session is dropped.
pub struct PageSession {
    page: Option<Box<dyn RenderPage>>,
    browser_id: u64,
    rendered: usize,
}

impl PageSession {
    /// Navigate to `url` and print it with `profile`.
    ///
    /// The page is reused across calls; URLs are rendered one at a time.
    ///
    /// # Errors
    ///
    /// - [`BrowserPoolError::Navigation`](crate::BrowserPoolError::Navigation)
    ///   if the page does not load within the operation timeout
    /// - [`BrowserPoolError::Render`](crate::BrowserPoolError::Render)
    ///   if printing fails
    pub fn render(&mut self, url: &str, profile: &PrintProfile) -> Result<Vec<u8>> {
        let page = self.page.as_mut().ok_or_else(|| {
            crate::BrowserPoolError::PageSession("session already closed".to_string())
        })?;

        page.navigate(url)?;
        let bytes = page.print_pdf(profile)?;
        self.rendered += 1;
        Ok(bytes)
    }

    /// Number of successful renders on this session.
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    /// Close the page now instead of at drop.
    pub fn close(&mut self) {
        if let Some(mut page) = self.page.take() {
            page.close();
            log::debug!(
                "📑 Page session on browser {} closed after {} render(s)",
                self.browser_id,
                self.rendered
            );
        }
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSession")
            .field("browser_id", &self.browser_id)
            .field("rendered", &self.rendered)
            .field("open", &self.page.is_some())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
