//! Engine factories.
//!
//! This module provides the [`BrowserFactory`] trait and implementations
//! that launch a render engine for the pool.
//!
//! # Available Factories
//!
//! | Factory | Description |
//! |---------|-------------|
//! | [`ChromeBrowserFactory`] | Launches headless Chrome/Chromium |
//! | [`mock::MockBrowserFactory`] | In-process fake engine for tests (feature-gated) |
//!
//! # Example
//!
//! ```rust,ignore
//! use url2pdf_api::{BrowserFactory, ChromeBrowserFactory};
//!
//! let factory = ChromeBrowserFactory::with_defaults();
//! let browser = factory.create()?;
//! ```

mod chrome;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use chrome::{ChromeBrowser, ChromeBrowserFactory, create_chrome_options};

use std::sync::Arc;

use crate::error::Result;
use crate::traits::RenderBrowser;

/// Trait for launching render engines.
///
/// # Thread Safety
///
/// Requires `Send + Sync` because the pool may launch from any request
/// thread.
///
/// # Implementors
///
/// - [`ChromeBrowserFactory`] - Launches Chrome/Chromium
/// - [`mock::MockBrowserFactory`] - For testing (when `test-utils` feature enabled)
pub trait BrowserFactory: Send + Sync {
    /// Launch a new engine process.
    ///
    /// # Errors
    ///
    /// - [`BrowserPoolError::Configuration`](crate::BrowserPoolError::Configuration) -
    ///   Invalid launch options
    /// - [`BrowserPoolError::BrowserCreation`](crate::BrowserPoolError::BrowserCreation) -
    ///   Binary not found, launch fails, etc.
    fn create(&self) -> Result<Arc<dyn RenderBrowser>>;
}
