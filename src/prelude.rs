//! Convenient imports for common usage patterns.
//!
//! ```rust,ignore
//! use url2pdf_api::prelude::*;
//! ```
//!
//! This imports the pool, the converter and its request/context types, the
//! configuration types, both blob stores and the engine factory.
//!
//! # Example
//!
//! ```rust,ignore
//! use url2pdf_api::prelude::*;
//!
//! let pool = BrowserPool::builder()
//!     .factory(Box::new(ChromeBrowserFactory::with_defaults()))
//!     .build()?
//!     .into_shared();
//!
//! let converter = PdfConverter::new(pool, Arc::new(MemoryBlobStore::new()), ConverterConfig::default());
//! let ctx = InvocationContext::for_config(converter.config());
//! let outcome = converter.convert(&ConversionRequest::single("https://example.com"), &ctx)?;
//! ```

// Core types
pub use crate::budget::RenderBudget;
pub use crate::config::{CachePolicy, ConverterConfig, ConverterConfigBuilder, DeliveryStrategy};
pub use crate::error::BrowserPoolError;
pub use crate::factory::{BrowserFactory, ChromeBrowserFactory};
pub use crate::handle::BrowserHandle;
pub use crate::pool::{BrowserPool, BrowserPoolBuilder, SharedBrowserPool};
pub use crate::service::{
    ConversionOutcome, ConversionRequest, InvocationContext, PdfConverter, PdfServiceError,
    SharedPdfConverter,
};
pub use crate::stats::PoolStats;
pub use crate::storage::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use crate::traits::Healthcheck;

// Feature-gated exports
#[cfg(feature = "env-config")]
pub use crate::config::env::from_env;

#[cfg(feature = "env-config")]
pub use crate::pool::init_browser_pool;

// Commonly needed with the shared pool and stores
pub use std::sync::Arc;
