//! Render capability: an engine that opens pages and prints them to PDF.

use std::time::Duration;

use super::Healthcheck;
use crate::error::Result;

/// A4 paper width in inches.
pub const A4_WIDTH_IN: f64 = 8.27;

/// A4 paper height in inches.
pub const A4_HEIGHT_IN: f64 = 11.69;

/// Timeouts applied to a page when it is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTimeouts {
    /// Bound on one navigation.
    pub navigation: Duration,
    /// Bound on every other engine call made through the page.
    pub default: Duration,
    /// Bound on waiting for the document to report `complete` after navigation.
    pub ready_wait: Duration,
}

impl PageTimeouts {
    /// Same bound for navigation and every other call.
    pub fn uniform(operation_timeout: Duration, ready_wait: Duration) -> Self {
        Self {
            navigation: operation_timeout,
            default: operation_timeout,
            ready_wait,
        }
    }
}

/// Page margins in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl PageMargins {
    /// 1px top and bottom, nothing at the sides.
    pub const HAIRLINE: PageMargins = PageMargins {
        top: 1.0,
        right: 0.0,
        bottom: 1.0,
        left: 0.0,
    };

    /// Convert CSS pixels to inches (96 px per inch).
    pub fn px_to_inches(px: f64) -> f64 {
        px / 96.0
    }
}

/// Static print settings handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintProfile {
    pub scale: f64,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
    pub display_header_footer: bool,
    pub landscape: bool,
    pub paper_width: f64,
    pub paper_height: f64,
    pub margins: PageMargins,
}

impl PrintProfile {
    /// Profile for pages that are merged into one document.
    ///
    /// A4, backgrounds on, CSS page size honoured, hairline margins.
    pub fn batch() -> Self {
        Self {
            scale: 1.0,
            print_background: true,
            prefer_css_page_size: true,
            display_header_footer: false,
            landscape: false,
            paper_width: A4_WIDTH_IN,
            paper_height: A4_HEIGHT_IN,
            margins: PageMargins::HAIRLINE,
        }
    }

    /// Profile for a lone URL: the batch profile at half scale.
    pub fn single_page() -> Self {
        Self {
            scale: 0.5,
            ..Self::batch()
        }
    }
}

/// A running engine process shared by every request on the host.
///
/// Pages opened from it are owned by exactly one request.
pub trait RenderBrowser: Healthcheck {
    /// Open a fresh page with the given timeouts applied.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserPoolError::PageSession`](crate::BrowserPoolError::PageSession)
    /// if the engine cannot create or configure the page.
    fn open_page(&self, timeouts: &PageTimeouts) -> Result<Box<dyn RenderPage>>;

    /// Terminate the engine process. Idempotent.
    fn close(&self);
}

/// One page (tab) of a [`RenderBrowser`].
pub trait RenderPage: Send {
    /// Navigate to `url` and wait until the document is ready or the
    /// readiness wait runs out.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserPoolError::Navigation`](crate::BrowserPoolError::Navigation)
    /// on load failure or timeout.
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Print the currently loaded document.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserPoolError::Render`](crate::BrowserPoolError::Render)
    /// if printing fails.
    fn print_pdf(&mut self, profile: &PrintProfile) -> Result<Vec<u8>>;

    /// Close the page. Idempotent; failures are logged, not returned.
    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_profile_is_half_scale_batch() {
        let batch = PrintProfile::batch();
        let single = PrintProfile::single_page();

        assert_eq!(single.scale, 0.5);
        assert_eq!(batch.scale, 1.0);
        assert!(!single.display_header_footer);
        assert_eq!(single.margins, PageMargins::HAIRLINE);
        assert_eq!(single.paper_width, batch.paper_width);
    }

    #[test]
    fn test_px_to_inches() {
        assert_eq!(PageMargins::px_to_inches(96.0), 1.0);
        assert_eq!(PageMargins::px_to_inches(0.0), 0.0);
    }

    #[test]
    fn test_uniform_timeouts() {
        let t = PageTimeouts::uniform(Duration::from_secs(8), Duration::from_secs(2));
        assert_eq!(t.navigation, t.default);
        assert_eq!(t.ready_wait, Duration::from_secs(2));
    }
}
