//! Tracked engine with metadata for the pool.
//!
//! Wraps the shared [`RenderBrowser`] with an id for log correlation and a
//! launch timestamp.
//!
//! ```text
//! TrackedBrowser
//! ├── id: u64 (unique identifier)
//! ├── browser: Arc<dyn RenderBrowser> (shared with every handle)
//! └── created_at: Instant
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::traits::{Healthcheck, RenderBrowser};

/// An engine instance as stored by the pool.
#[derive(Clone)]
pub(crate) struct TrackedBrowser {
    /// Assigned sequentially, starting at 1.
    id: u64,

    browser: Arc<dyn RenderBrowser>,

    created_at: Instant,
}

impl TrackedBrowser {
    /// Wrap a freshly launched engine.
    pub(crate) fn new(browser: Arc<dyn RenderBrowser>) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        Self {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            browser,
            created_at: Instant::now(),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn browser(&self) -> &Arc<dyn RenderBrowser> {
        &self.browser
    }

    #[inline]
    pub(crate) fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Terminate the process behind this entry.
    pub(crate) fn close(&self) {
        log::debug!("🛑 Closing browser {} (age {:?})", self.id, self.age());
        self.browser.close();
    }
}

impl Healthcheck for TrackedBrowser {
    fn ping(&self) -> Result<()> {
        log::trace!("🔍 Pinging browser {}...", self.id);

        self.browser.ping().inspect_err(|e| {
            log::warn!("⚠️ Browser {} ping failed: {}", self.id, e);
        })
    }
}

impl std::fmt::Debug for TrackedBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedBrowser")
            .field("id", &self.id)
            .field("age", &self.age())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
