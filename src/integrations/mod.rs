//! Web framework integrations.
//!
//! The conversion service itself is framework-agnostic (see
//! [`crate::service::handle`]). This module wires it into a web framework.
//!
//! # Available Integrations
//!
//! | Framework | Feature Flag | Module |
//! |-----------|--------------|--------|
//! | Axum | `axum-integration` | `axum` |
//!
//! # Enabling Integrations
//!
//! ```toml
//! [dependencies]
//! url2pdf-api = { version = "0.1", features = ["axum-integration"] }
//! ```
//!
//! # Common Pattern
//!
//! 1. Build a `BrowserPool` during startup and warm it up
//! 2. Wrap it, a blob store and a `ConverterConfig` in a `PdfConverter`
//! 3. Hand the shared converter to the framework's state
//! 4. Call `service::handle` from a blocking task in the handler
//!
//! Other hosts, such as a serverless runtime adapter, follow the same steps
//! and call `service::handle` with their own method, body and deadline.

#[cfg(feature = "axum-integration")]
pub mod axum;
