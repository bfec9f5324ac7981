//! Mock engine for testing.
//!
//! [`MockBrowserFactory`] launches an in-process fake engine whose pages
//! "print" real one-page PDFs (built with `lopdf`) labelled with the URL
//! they were navigated to. Merges can therefore be checked page by page
//! without Chrome installed.
//!
//! # Feature Flag
//!
//! This module is only available when:
//! - The `test-utils` feature is enabled, OR
//! - During testing (`#[cfg(test)]`)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use url2pdf_api::factory::mock::MockBrowserFactory;
//!
//! let factory = MockBrowserFactory::new()
//!     .with_failing_url("https://broken.example")
//!     .with_navigation_delay(Duration::from_millis(50));
//! let probe = factory.probe();
//!
//! // ... hand `factory` to a pool, run requests ...
//!
//! assert_eq!(probe.creation_count(), 1);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lopdf::{Document, Object, Stream, dictionary};

use super::BrowserFactory;
use crate::error::{BrowserPoolError, Result};
use crate::traits::{Healthcheck, PageTimeouts, PrintProfile, RenderBrowser, RenderPage};

/// Counters and logs shared by a factory, its browsers and their pages.
#[derive(Debug, Default)]
struct MockState {
    creation_count: AtomicUsize,
    kill_epoch: AtomicUsize,
    browsers_closed: AtomicUsize,
    pages_opened: AtomicUsize,
    pages_closed: AtomicUsize,
    navigations: Mutex<Vec<String>>,
    prints: Mutex<Vec<(String, f64)>>,
}

impl MockState {
    fn record<T>(log: &Mutex<Vec<T>>, entry: T) {
        match log.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    fn snapshot<T: Clone>(log: &Mutex<Vec<T>>) -> Vec<T> {
        match log.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Read-only view of what a [`MockBrowserFactory`] and its engines did.
///
/// Stays valid after the factory itself has been moved into a pool.
#[derive(Debug, Clone)]
pub struct MockProbe {
    state: Arc<MockState>,
}

impl MockProbe {
    /// Number of launch attempts, successful or not.
    pub fn creation_count(&self) -> usize {
        self.state.creation_count.load(Ordering::SeqCst)
    }

    /// Number of engines closed through [`RenderBrowser::close`].
    pub fn browsers_closed(&self) -> usize {
        self.state.browsers_closed.load(Ordering::SeqCst)
    }

    pub fn pages_opened(&self) -> usize {
        self.state.pages_opened.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.state.pages_closed.load(Ordering::SeqCst)
    }

    /// Every URL navigation was attempted for, in order.
    pub fn navigations(&self) -> Vec<String> {
        MockState::snapshot(&self.state.navigations)
    }

    /// `(url, scale)` for every successful print, in order.
    pub fn prints(&self) -> Vec<(String, f64)> {
        MockState::snapshot(&self.state.prints)
    }

    /// Make every engine launched so far fail its liveness probe,
    /// as if the process had crashed.
    pub fn kill_browsers(&self) {
        self.state.kill_epoch.store(self.creation_count(), Ordering::SeqCst);
    }
}

/// Mock factory for testing the pool and converter.
#[derive(Clone)]
pub struct MockBrowserFactory {
    should_fail: bool,
    error_message: String,
    fail_after: Option<usize>,
    failing_urls: Vec<String>,
    failing_prints: Vec<String>,
    navigation_delay: Duration,
    state: Arc<MockState>,
}

impl MockBrowserFactory {
    /// Create a factory whose engines always launch and render.
    pub fn new() -> Self {
        Self {
            should_fail: false,
            error_message: String::new(),
            fail_after: None,
            failing_urls: Vec::new(),
            failing_prints: Vec::new(),
            navigation_delay: Duration::ZERO,
            state: Arc::new(MockState::default()),
        }
    }

    /// Create a factory that always fails to launch.
    pub fn always_fails<S: Into<String>>(message: S) -> Self {
        Self {
            should_fail: true,
            error_message: message.into(),
            ..Self::new()
        }
    }

    /// Create a factory that launches `n` engines and then fails.
    pub fn fail_after_n<S: Into<String>>(n: usize, message: S) -> Self {
        Self {
            error_message: message.into(),
            fail_after: Some(n),
            ..Self::new()
        }
    }

    /// Navigation to `url` fails with a navigation error.
    pub fn with_failing_url<S: Into<String>>(mut self, url: S) -> Self {
        self.failing_urls.push(url.into());
        self
    }

    /// Navigation to `url` succeeds but printing it fails.
    pub fn with_failing_print<S: Into<String>>(mut self, url: S) -> Self {
        self.failing_prints.push(url.into());
        self
    }

    /// Every navigation sleeps for `delay` before completing.
    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }

    /// Handle to the shared counters.
    pub fn probe(&self) -> MockProbe {
        MockProbe {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of launch attempts made through this factory.
    pub fn creation_count(&self) -> usize {
        self.state.creation_count.load(Ordering::SeqCst)
    }
}

impl Default for MockBrowserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserFactory for MockBrowserFactory {
    fn create(&self) -> Result<Arc<dyn RenderBrowser>> {
        let count = self.state.creation_count.fetch_add(1, Ordering::SeqCst);

        if self.should_fail {
            log::debug!("MockBrowserFactory: Returning configured failure");
            return Err(BrowserPoolError::BrowserCreation(self.error_message.clone()));
        }

        if let Some(fail_after) = self.fail_after
            && count >= fail_after
        {
            log::debug!("MockBrowserFactory: Failing after {} creations", fail_after);
            return Err(BrowserPoolError::BrowserCreation(self.error_message.clone()));
        }

        log::debug!("MockBrowserFactory: Launching mock engine #{}", count + 1);

        Ok(Arc::new(MockBrowser {
            generation: count + 1,
            closed: AtomicBool::new(false),
            factory: self.clone(),
        }))
    }
}

impl std::fmt::Debug for MockBrowserFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBrowserFactory")
            .field("should_fail", &self.should_fail)
            .field("error_message", &self.error_message)
            .field("creation_count", &self.creation_count())
            .field("fail_after", &self.fail_after)
            .field("failing_urls", &self.failing_urls)
            .finish()
    }
}

struct MockBrowser {
    generation: usize,
    closed: AtomicBool,
    factory: MockBrowserFactory,
}

impl Healthcheck for MockBrowser {
    fn ping(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrowserPoolError::HealthCheckFailed("closed".to_string()));
        }
        if self.generation <= self.factory.state.kill_epoch.load(Ordering::SeqCst) {
            return Err(BrowserPoolError::HealthCheckFailed("process gone".to_string()));
        }
        Ok(())
    }
}

impl RenderBrowser for MockBrowser {
    fn open_page(&self, _timeouts: &PageTimeouts) -> Result<Box<dyn RenderPage>> {
        self.ping()
            .map_err(|e| BrowserPoolError::PageSession(e.to_string()))?;
        self.factory.state.pages_opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockPage {
            factory: self.factory.clone(),
            current_url: None,
            closed: false,
        }))
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.factory
                .state
                .browsers_closed
                .fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct MockPage {
    factory: MockBrowserFactory,
    current_url: Option<String>,
    closed: bool,
}

impl RenderPage for MockPage {
    fn navigate(&mut self, url: &str) -> Result<()> {
        MockState::record(&self.factory.state.navigations, url.to_string());

        if !self.factory.navigation_delay.is_zero() {
            std::thread::sleep(self.factory.navigation_delay);
        }

        if self.factory.failing_urls.iter().any(|u| u == url) {
            self.current_url = None;
            return Err(BrowserPoolError::Navigation(format!(
                "net::ERR_NAME_NOT_RESOLVED at {}",
                url
            )));
        }

        self.current_url = Some(url.to_string());
        Ok(())
    }

    fn print_pdf(&mut self, profile: &PrintProfile) -> Result<Vec<u8>> {
        let url = self
            .current_url
            .clone()
            .ok_or_else(|| BrowserPoolError::Render("nothing loaded".to_string()))?;

        if self.factory.failing_prints.iter().any(|u| *u == url) {
            return Err(BrowserPoolError::Render(format!("printToPDF failed for {}", url)));
        }

        let bytes = single_page_pdf(&url).map_err(|e| BrowserPoolError::Render(e.to_string()))?;
        MockState::record(&self.factory.state.prints, (url, profile.scale));
        Ok(bytes)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.factory.state.pages_closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockPage {
    fn drop(&mut self) {
        self.close();
    }
}

/// Build a one-page A4 PDF whose only content is `label` in Helvetica.
///
/// # Errors
///
/// Returns the I/O error from serialising the document.
pub fn single_page_pdf(label: &str) -> std::io::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let escaped = label
        .replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)");
    let content = format!("BT /F1 12 Tf 36 800 Td ({}) Tj ET", escaped).into_bytes();
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(out)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn timeouts() -> PageTimeouts {
        PageTimeouts::uniform(Duration::from_secs(8), Duration::ZERO)
    }

    #[test]
    fn test_mock_factory_always_fails() {
        let factory = MockBrowserFactory::always_fails("Test error");

        match factory.create() {
            Err(BrowserPoolError::BrowserCreation(msg)) => assert_eq!(msg, "Test error"),
            _ => panic!("Expected BrowserCreation error"),
        }
        assert_eq!(factory.creation_count(), 1);
    }

    #[test]
    fn test_mock_factory_fail_after_n() {
        let factory = MockBrowserFactory::fail_after_n(2, "Exhausted");

        assert!(factory.create().is_ok());
        assert!(factory.create().is_ok());

        match factory.create() {
            Err(BrowserPoolError::BrowserCreation(msg)) => assert_eq!(msg, "Exhausted"),
            _ => panic!("Expected BrowserCreation error"),
        }
        assert_eq!(factory.creation_count(), 3);
    }

    #[test]
    fn test_mock_page_renders_labelled_pdf() {
        let factory = MockBrowserFactory::new();
        let probe = factory.probe();
        let browser = factory.create().unwrap();

        let mut page = browser.open_page(&timeouts()).unwrap();
        page.navigate("https://a.example").unwrap();
        let bytes = page.print_pdf(&PrintProfile::single_page()).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert_eq!(probe.prints(), vec![("https://a.example".to_string(), 0.5)]);

        drop(page);
        assert_eq!(probe.pages_opened(), 1);
        assert_eq!(probe.pages_closed(), 1);
    }

    #[test]
    fn test_mock_failing_url_and_print() {
        let factory = MockBrowserFactory::new()
            .with_failing_url("https://down.example")
            .with_failing_print("https://ugly.example");
        let browser = factory.create().unwrap();
        let mut page = browser.open_page(&timeouts()).unwrap();

        assert!(matches!(
            page.navigate("https://down.example"),
            Err(BrowserPoolError::Navigation(_))
        ));
        assert!(matches!(
            page.print_pdf(&PrintProfile::batch()),
            Err(BrowserPoolError::Render(_))
        ));

        page.navigate("https://ugly.example").unwrap();
        assert!(page.print_pdf(&PrintProfile::batch()).is_err());
    }

    #[test]
    fn test_mock_kill_and_close() {
        let factory = MockBrowserFactory::new();
        let probe = factory.probe();

        let first = factory.create().unwrap();
        assert!(first.is_alive());

        probe.kill_browsers();
        assert!(!first.is_alive());

        let second = factory.create().unwrap();
        assert!(second.is_alive());

        second.close();
        second.close();
        assert!(!second.is_alive());
        assert_eq!(probe.browsers_closed(), 1);
        assert!(second.open_page(&timeouts()).is_err());
    }

    #[test]
    fn test_mock_factory_debug() {
        let factory = MockBrowserFactory::always_fails("Test");
        let debug_str = format!("{:?}", factory);

        assert!(debug_str.contains("MockBrowserFactory"));
        assert!(debug_str.contains("should_fail"));
    }
}
