//! Traits at the engine boundary.
//!
//! - **Liveness**: [`Healthcheck`] lets the pool decide reuse vs. relaunch
//! - **Rendering**: [`RenderBrowser`] and [`RenderPage`] describe the
//!   headless engine as the converter sees it, so it can be swapped for a
//!   mock in tests
//!
//! # Implementing a Custom Engine
//!
//! ```rust,ignore
//! use url2pdf_api::{Healthcheck, PageTimeouts, RenderBrowser, RenderPage, Result};
//!
//! struct MyEngine;
//!
//! impl Healthcheck for MyEngine {
//!     fn ping(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! impl RenderBrowser for MyEngine {
//!     fn open_page(&self, timeouts: &PageTimeouts) -> Result<Box<dyn RenderPage>> {
//!         todo!()
//!     }
//!
//!     fn close(&self) {}
//! }
//! ```

mod healthcheck;
mod render;

pub use healthcheck::Healthcheck;
pub use render::{
    A4_HEIGHT_IN, A4_WIDTH_IN, PageMargins, PageTimeouts, PrintProfile, RenderBrowser, RenderPage,
};
