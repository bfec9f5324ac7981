//! Chrome-backed render engine.
//!
//! [`ChromeBrowserFactory`] launches Chrome with a sandbox-compatible flag
//! set suitable for serverless containers. [`ChromeBrowser`] and its pages
//! implement the [`RenderBrowser`]/[`RenderPage`] traits on top of
//! `headless_chrome`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};

use super::BrowserFactory;
use crate::error::{BrowserPoolError, Result};
use crate::traits::{
    Healthcheck, PageMargins, PageTimeouts, PrintProfile, RenderBrowser, RenderPage,
};

/// Readiness poll interval after navigation.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Factory for Chrome/Chromium engines.
///
/// # Example
///
/// ```rust,ignore
/// use url2pdf_api::ChromeBrowserFactory;
///
/// // Auto-detect Chrome
/// let factory = ChromeBrowserFactory::with_defaults();
///
/// // Or use custom path
/// let factory = ChromeBrowserFactory::with_path("/usr/bin/chromium".to_string());
/// ```
pub struct ChromeBrowserFactory {
    /// Generates launch options for each launch.
    launch_options_fn: Box<dyn Fn() -> Result<LaunchOptions<'static>> + Send + Sync>,
}

impl ChromeBrowserFactory {
    /// Create factory with custom launch options function.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use url2pdf_api::{ChromeBrowserFactory, create_chrome_options, BrowserPoolError};
    ///
    /// let factory = ChromeBrowserFactory::new(|| {
    ///     create_chrome_options(Some("/custom/path"))
    ///         .map_err(|e| BrowserPoolError::Configuration(e.to_string()))
    /// });
    /// ```
    pub fn new<F>(launch_options_fn: F) -> Self
    where
        F: Fn() -> Result<LaunchOptions<'static>> + Send + Sync + 'static,
    {
        Self {
            launch_options_fn: Box::new(launch_options_fn),
        }
    }

    /// Create factory that lets `headless_chrome` locate the binary.
    pub fn with_defaults() -> Self {
        log::debug!("🔧 Creating ChromeBrowserFactory with auto-detect");
        Self::new(|| {
            create_chrome_options(None).map_err(|e| BrowserPoolError::Configuration(e.to_string()))
        })
    }

    /// Create factory with custom Chrome binary path.
    pub fn with_path(chrome_path: String) -> Self {
        log::debug!("🔧 Creating ChromeBrowserFactory with custom path: {}", chrome_path);
        Self::new(move || {
            create_chrome_options(Some(&chrome_path))
                .map_err(|e| BrowserPoolError::Configuration(e.to_string()))
        })
    }

    /// `with_path` when a path is given, `with_defaults` otherwise.
    pub fn from_optional_path(chrome_path: Option<String>) -> Self {
        match chrome_path {
            Some(path) => Self::with_path(path),
            None => Self::with_defaults(),
        }
    }
}

impl BrowserFactory for ChromeBrowserFactory {
    /// Launch Chrome.
    ///
    /// # Errors
    ///
    /// * [`BrowserPoolError::Configuration`] if launch options generation fails.
    /// * [`BrowserPoolError::BrowserCreation`] if Chrome fails to launch.
    fn create(&self) -> Result<Arc<dyn RenderBrowser>> {
        log::trace!("🔧 ChromeBrowserFactory::create() called");

        let options = (self.launch_options_fn)()?;

        log::debug!("🚀 Launching Chrome browser...");
        let browser = Browser::new(options).map_err(|e| {
            log::error!("❌ Chrome launch failed: {}", e);
            BrowserPoolError::BrowserCreation(e.to_string())
        })?;

        Ok(Arc::new(ChromeBrowser::new(browser)))
    }
}

/// Create Chrome launch options with optional custom path.
///
/// The flag set keeps Chrome runnable inside restricted containers:
///
/// - `--disable-dev-shm-usage` - use /tmp instead of a tiny /dev/shm
/// - `--disable-setuid-sandbox`, `--no-sandbox` - no privileged sandbox helper
/// - `--disable-gpu` - no GPU in the container
/// - `--disable-background-timer-throttling`
/// - `--disable-backgrounding-occluded-windows`
/// - `--disable-renderer-backgrounding` - keep headless tabs at full speed
///
/// # Errors
///
/// Returns error if the options builder fails.
pub fn create_chrome_options(
    chrome_path: Option<&str>,
) -> std::result::Result<LaunchOptions<'static>, Box<dyn std::error::Error + Send + Sync>> {
    match chrome_path {
        Some(path) => log::debug!("🔧 Creating Chrome options with custom path: {}", path),
        None => log::debug!("🔧 Creating Chrome options (auto-detect browser)"),
    }

    let mut builder = LaunchOptions::default_builder();

    if let Some(path) = chrome_path {
        builder.path(Some(path.to_string().into()));
    }

    builder
        .headless(true)
        .sandbox(false)
        .disable_default_args(true)
        .args(vec![
            "--disable-dev-shm-usage".as_ref(),
            "--disable-setuid-sandbox".as_ref(),
            "--no-sandbox".as_ref(),
            "--disable-gpu".as_ref(),
            "--disable-background-timer-throttling".as_ref(),
            "--disable-backgrounding-occluded-windows".as_ref(),
            "--disable-renderer-backgrounding".as_ref(),
        ])
        .build()
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            let path_msg = chrome_path.unwrap_or("auto-detect");
            log::error!("❌ Failed to build Chrome launch options (path: {}): {}", path_msg, e);
            e.into()
        })
}

/// A launched Chrome process.
///
/// The process lives as long as the inner `Browser`; [`close`](RenderBrowser::close)
/// drops it, which kills the process.
pub struct ChromeBrowser {
    browser: Mutex<Option<Browser>>,
}

impl ChromeBrowser {
    pub fn new(browser: Browser) -> Self {
        Self {
            browser: Mutex::new(Some(browser)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Browser>> {
        self.browser.lock().unwrap_or_else(|poisoned| {
            log::warn!("⚠️ Chrome handle mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl Healthcheck for ChromeBrowser {
    fn ping(&self) -> Result<()> {
        let guard = self.lock();
        let browser = guard
            .as_ref()
            .ok_or_else(|| BrowserPoolError::HealthCheckFailed("browser closed".to_string()))?;

        browser
            .get_version()
            .map(|_| ())
            .map_err(|e| BrowserPoolError::HealthCheckFailed(e.to_string()))
    }
}

impl RenderBrowser for ChromeBrowser {
    fn open_page(&self, timeouts: &PageTimeouts) -> Result<Box<dyn RenderPage>> {
        let tab = {
            let guard = self.lock();
            let browser = guard.as_ref().ok_or_else(|| {
                BrowserPoolError::PageSession("browser already closed".to_string())
            })?;
            browser
                .new_tab()
                .map_err(|e| BrowserPoolError::PageSession(e.to_string()))?
        };

        tab.set_default_timeout(timeouts.default.max(timeouts.navigation));
        log::trace!("📑 Opened tab with {:?} timeout", timeouts.navigation);

        Ok(Box::new(ChromePage {
            tab,
            ready_wait: timeouts.ready_wait,
            closed: false,
        }))
    }

    fn close(&self) {
        if self.lock().take().is_some() {
            log::info!("🛑 Chrome process closed");
        }
    }
}

struct ChromePage {
    tab: Arc<Tab>,
    ready_wait: Duration,
    closed: bool,
}

impl ChromePage {
    /// Poll `document.readyState` until `complete` or the wait runs out.
    fn wait_until_ready(&self) {
        let start = Instant::now();

        while start.elapsed() < self.ready_wait {
            let complete = self
                .tab
                .evaluate("document.readyState === 'complete'", false)
                .map(|result| result.value.and_then(|v| v.as_bool()).unwrap_or(false))
                .unwrap_or(false);

            if complete {
                log::trace!("Document ready after {:?}", start.elapsed());
                return;
            }

            std::thread::sleep(READY_POLL_INTERVAL);
        }

        log::debug!(
            "Document not complete after {:?}, printing anyway",
            self.ready_wait
        );
    }
}

impl RenderPage for ChromePage {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserPoolError::Navigation(e.to_string()))?
            .wait_until_navigated()
            .map_err(|e| BrowserPoolError::Navigation(e.to_string()))?;

        self.wait_until_ready();
        Ok(())
    }

    fn print_pdf(&mut self, profile: &PrintProfile) -> Result<Vec<u8>> {
        self.tab
            .print_to_pdf(Some(print_options(profile)))
            .map_err(|e| BrowserPoolError::Render(e.to_string()))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.tab.close(true) {
            log::warn!("⚠️ Failed to close tab (continuing anyway): {}", e);
        }
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        self.close();
    }
}

fn print_options(profile: &PrintProfile) -> PrintToPdfOptions {
    PrintToPdfOptions {
        landscape: Some(profile.landscape),
        display_header_footer: Some(profile.display_header_footer),
        print_background: Some(profile.print_background),
        scale: Some(profile.scale),
        paper_width: Some(profile.paper_width),
        paper_height: Some(profile.paper_height),
        margin_top: Some(PageMargins::px_to_inches(profile.margins.top)),
        margin_bottom: Some(PageMargins::px_to_inches(profile.margins.bottom)),
        margin_left: Some(PageMargins::px_to_inches(profile.margins.left)),
        margin_right: Some(PageMargins::px_to_inches(profile.margins.right)),
        prefer_css_page_size: Some(profile.prefer_css_page_size),
        ..Default::default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
