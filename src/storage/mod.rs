//! Blob storage for finished PDFs.
//!
//! The converter writes every delivered document through a [`BlobStore`]
//! and, when product caching is on, reads it back under an identity key.
//!
//! # Available Stores
//!
//! | Store | Description |
//! |-------|-------------|
//! | [`MemoryBlobStore`] | Process-local map, lost on restart |
//! | [`FsBlobStore`] | Directory of data files plus JSON metadata sidecars |
//!
//! # Keys
//!
//! ```text
//! random per result:   1718000000000-3f9a1c2e.pdf
//! product identity:    blue-widget-deluxe-42
//! ```
//!
//! Keys are restricted to ASCII letters, digits, `-`, `_` and `.` so they
//! are safe as file names and URL path segments.

mod fs;
mod memory;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type recorded for every stored PDF.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Errors from a [`BlobStore`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid blob key '{0}'")]
    InvalidKey(String),

    #[error("I/O error for blob '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt metadata for blob '{key}': {source}")]
    Metadata {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Metadata stored next to each blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    pub content_type: String,
    pub created_at: DateTime<Utc>,

    /// Pages rendered into the document, for batch results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_pages: Option<usize>,

    /// Pages requested, for batch results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
}

impl BlobMetadata {
    /// PDF metadata stamped with the current time.
    pub fn pdf_now() -> Self {
        Self {
            content_type: PDF_CONTENT_TYPE.to_string(),
            created_at: Utc::now(),
            processed_pages: None,
            total_pages: None,
        }
    }

    /// Attach batch page counts.
    pub fn with_page_counts(mut self, processed: usize, total: usize) -> Self {
        self.processed_pages = Some(processed);
        self.total_pages = Some(total);
        self
    }
}

/// A blob read back from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub metadata: BlobMetadata,
}

/// Key-addressed byte storage with metadata.
///
/// Entries are written once and treated as immutable; `put` on an existing
/// key replaces it.
///
/// # Thread Safety
///
/// Requires `Send + Sync`; one store is shared by every request.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidKey`] for unsafe keys, [`StorageError::Io`]
    /// when the backend fails.
    fn put(&self, key: &str, bytes: &[u8], metadata: &BlobMetadata) -> Result<(), StorageError>;

    /// Fetch the blob stored under `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Backend failures other than "not found".
    fn get(&self, key: &str) -> Result<Option<StoredBlob>, StorageError>;
}

/// Reject keys that are not safe file names / path segments.
///
/// # Errors
///
/// [`StorageError::InvalidKey`].
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let well_formed = !key.is_empty()
        && key.len() <= 200
        && !key.starts_with('.')
        && !key.contains("..")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if well_formed {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Fresh, non-deterministic key: `<unix-millis>-<8 hex chars>.pdf`.
pub fn random_blob_key() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}.pdf", Utc::now().timestamp_millis(), &suffix[..8])
}

/// Lowercase, map runs of anything but ASCII letters/digits to one `-`,
/// trim `-` from both ends.
pub fn sanitize_key_part(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Deterministic key for a product: `<sanitized-name>-<sanitized-id>`.
///
/// `None` when either part sanitises to nothing.
///
/// # Example
///
/// ```rust
/// use url2pdf_api::storage::cache_key;
///
/// assert_eq!(
///     cache_key("Blue Widget (Deluxe)", "42").as_deref(),
///     Some("blue-widget-deluxe-42")
/// );
/// assert_eq!(cache_key("???", "42"), None);
/// ```
pub fn cache_key(product_name: &str, product_id: &str) -> Option<String> {
    let name = sanitize_key_part(product_name);
    let id = sanitize_key_part(product_id);

    if name.is_empty() || id.is_empty() {
        return None;
    }

    Some(format!("{}-{}", name, id))
}

// ============================================================================
// Unit Tests
// ============================================================================
