//! Process-wide browser pool.
//!
//! This module provides [`BrowserPool`], which keeps at most one live
//! engine process per host and hands out shared [`BrowserHandle`]s to it.
//!
//! # Overview
//!
//! - **Lazy launch**: the engine starts on the first acquisition
//! - **Warm reuse**: later acquisitions get the same engine while it answers
//!   its liveness probe
//! - **Relaunch on death**: a stored engine that fails its probe is dropped
//!   and replaced on the spot
//! - **Caller-decided teardown**: [`release(true)`](BrowserPool::release)
//!   closes the engine, `release(false)` keeps it warm
//!
//! # Architecture
//!
//! ```text
//! BrowserPool
//!   ├─ slot: Mutex<Option<TrackedBrowser>>   (the one shared engine)
//!   ├─ factory: Box<dyn BrowserFactory>      (how to launch it)
//!   └─ counters                              (launches, reuses, teardowns)
//! ```
//!
//! # Critical Invariants
//!
//! 1. **Single engine**: the slot mutex is held across probe *and* launch, so
//!    two racing callers can never both launch
//! 2. **Shutdown flag**: checked before every acquisition
//! 3. **Pages are not pooled**: each request opens and closes its own
//!
//! # Example
//!
//! ```rust,no_run
//! use url2pdf_api::{BrowserPool, ChromeBrowserFactory};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = BrowserPool::builder()
//!         .factory(Box::new(ChromeBrowserFactory::with_defaults()))
//!         .build()?;
//!
//!     let browser = pool.acquire()?;
//!     // ... open a page session, render ...
//!     drop(browser);
//!
//!     // keep warm for the next invocation
//!     pool.release(false);
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{BrowserPoolError, Result};
use crate::factory::BrowserFactory;
use crate::handle::BrowserHandle;
use crate::stats::PoolStats;
use crate::tracked::TrackedBrowser;
use crate::traits::Healthcheck;

/// Shared pool type used by the converter and the HTTP layer.
pub type SharedBrowserPool = Arc<BrowserPool>;

/// Keeps one engine process alive across requests.
///
/// # Thread Safety
///
/// `BrowserPool` is `Send + Sync`; share it as [`SharedBrowserPool`].
pub struct BrowserPool {
    slot: Mutex<Option<TrackedBrowser>>,
    factory: Box<dyn BrowserFactory>,
    shutting_down: AtomicBool,
    launches: AtomicU64,
    launch_failures: AtomicU64,
    reuses: AtomicU64,
    teardowns: AtomicU64,
}

impl BrowserPool {
    /// Create a new builder for constructing a pool.
    pub fn builder() -> BrowserPoolBuilder {
        BrowserPoolBuilder::new()
    }

    /// Convert into the shared form.
    pub fn into_shared(self) -> SharedBrowserPool {
        log::debug!("🔒 Converting BrowserPool into shared Arc");
        Arc::new(self)
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<TrackedBrowser>> {
        self.slot.lock().unwrap_or_else(|poisoned| {
            log::warn!("⚠️ Browser slot mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Get a handle to the live engine, launching one if needed.
    ///
    /// # Flow
    ///
    /// ```text
    /// lock slot
    ///   ├── stored + ping ok ─→ reuse
    ///   ├── stored + ping err ─→ close, launch
    ///   └── empty ─────────────→ launch
    /// ```
    ///
    /// The lock is held while launching; concurrent callers wait and then
    /// reuse the new engine.
    ///
    /// # Errors
    ///
    /// - [`BrowserPoolError::ShuttingDown`] after [`shutdown()`](Self::shutdown)
    /// - [`BrowserPoolError::BrowserCreation`] if the engine cannot start
    pub fn acquire(&self) -> Result<BrowserHandle> {
        if self.shutting_down.load(Ordering::Acquire) {
            log::debug!("🛑 Acquire rejected, pool is shutting down");
            return Err(BrowserPoolError::ShuttingDown);
        }

        let mut slot = self.lock_slot();

        if let Some(tracked) = slot.as_ref() {
            if tracked.ping().is_ok() {
                self.reuses.fetch_add(1, Ordering::Relaxed);
                log::debug!("♻️ Reusing warm browser {}", tracked.id());
                return Ok(BrowserHandle::new(tracked.clone()));
            }

            log::warn!(
                "⚠️ Stored browser {} is no longer alive, relaunching",
                tracked.id()
            );
            tracked.close();
            *slot = None;
        }

        log::info!("🚀 Launching browser...");
        let browser = self.factory.create().inspect_err(|e| {
            self.launch_failures.fetch_add(1, Ordering::Relaxed);
            log::error!("❌ Browser launch failed: {}", e);
        })?;

        let tracked = TrackedBrowser::new(browser);
        self.launches.fetch_add(1, Ordering::Relaxed);
        log::info!("✅ Browser {} launched", tracked.id());

        let handle = BrowserHandle::new(tracked.clone());
        *slot = Some(tracked);
        Ok(handle)
    }

    /// Release the shared engine.
    ///
    /// `force_close = true` closes the process and clears the slot, so the
    /// next acquisition launches fresh. `false` is a no-op: the engine is
    /// kept warm. Handles still held elsewhere keep pointing at the closed
    /// engine and fail on their next page.
    pub fn release(&self, force_close: bool) {
        if !force_close {
            log::trace!("Keeping browser warm");
            return;
        }

        let taken = self.lock_slot().take();
        if let Some(tracked) = taken {
            tracked.close();
            self.teardowns.fetch_add(1, Ordering::Relaxed);
            log::info!("🧹 Browser {} torn down", tracked.id());
        }
    }

    /// Launch the engine ahead of the first request.
    ///
    /// Runs the blocking launch on Tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`acquire()`](Self::acquire).
    pub async fn warmup(self: &Arc<Self>) -> Result<()> {
        log::info!("🔥 Warming up browser pool...");
        let pool = Arc::clone(self);

        tokio::task::spawn_blocking(move || pool.acquire().map(|_| ()))
            .await
            .map_err(|e| BrowserPoolError::BrowserCreation(format!("warmup task failed: {}", e)))?
    }

    /// Reject new acquisitions and close the engine.
    pub fn shutdown(&self) {
        log::info!("🛑 Shutting down browser pool...");
        self.shutting_down.store(true, Ordering::Release);
        self.release(true);

        let stats = self.stats();
        log::info!(
            "✅ Shutdown complete - launches: {}, reuses: {}, teardowns: {}",
            stats.launches,
            stats.reuses,
            stats.teardowns
        );
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Current statistics.
    ///
    /// `alive` reflects whether an engine is stored; it does not probe.
    pub fn stats(&self) -> PoolStats {
        let browser_id = self.lock_slot().as_ref().map(TrackedBrowser::id);

        PoolStats {
            alive: browser_id.is_some(),
            browser_id,
            launches: self.launches.load(Ordering::Relaxed),
            launch_failures: self.launch_failures.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            teardowns: self.teardowns.load(Ordering::Relaxed),
        }
    }
}

impl Drop for BrowserPool {
    fn drop(&mut self) {
        log::debug!("🧹 BrowserPool Drop triggered - closing browser");
        let slot = self.slot.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(tracked) = slot.take() {
            tracked.close();
        }
    }
}

impl std::fmt::Debug for BrowserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserPool")
            .field("stats", &self.stats())
            .field("shutting_down", &self.is_shutting_down())
            .finish_non_exhaustive()
    }
}

/// Builder for [`BrowserPool`].
///
/// # Example
///
/// ```rust,ignore
/// use url2pdf_api::{BrowserPool, ChromeBrowserFactory};
///
/// let pool = BrowserPool::builder()
///     .factory(Box::new(ChromeBrowserFactory::with_defaults()))
///     .build()?;
/// ```
pub struct BrowserPoolBuilder {
    factory: Option<Box<dyn BrowserFactory>>,
}

impl BrowserPoolBuilder {
    pub fn new() -> Self {
        Self { factory: None }
    }

    /// Set the factory used to launch the engine. Required.
    pub fn factory(mut self, factory: Box<dyn BrowserFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Build the pool. Nothing is launched yet.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserPoolError::Configuration`] if no factory was set.
    pub fn build(self) -> Result<BrowserPool> {
        let factory = self.factory.ok_or_else(|| {
            BrowserPoolError::Configuration("No browser factory provided".to_string())
        })?;

        log::info!("✅ Browser pool built (lazy launch)");

        Ok(BrowserPool {
            slot: Mutex::new(None),
            factory,
            shutting_down: AtomicBool::new(false),
            launches: AtomicU64::new(0),
            launch_failures: AtomicU64::new(0),
            reuses: AtomicU64::new(0),
            teardowns: AtomicU64::new(0),
        })
    }
}

impl Default for BrowserPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Initialization (feature-gated)
// ============================================================================

/// Build a Chrome-backed pool from the environment and warm it up.
///
/// Reads `CHROME_PATH` (auto-detect when unset). A failed warmup is logged
/// and left to the first request to retry.
///
/// # Errors
///
/// Returns [`BrowserPoolError::Configuration`] if the pool cannot be built.
#[cfg(feature = "env-config")]
pub async fn init_browser_pool() -> Result<SharedBrowserPool> {
    use crate::config::env::chrome_path_from_env;
    use crate::factory::ChromeBrowserFactory;

    log::info!("Initializing browser pool from environment...");

    let chrome_path = chrome_path_from_env();
    log::info!(
        "   - Chrome path: {}",
        chrome_path.as_deref().unwrap_or("auto-detect")
    );

    let pool = BrowserPool::builder()
        .factory(Box::new(ChromeBrowserFactory::from_optional_path(chrome_path)))
        .build()?
        .into_shared();

    if let Err(e) = pool.warmup().await {
        log::warn!("⚠️ Warmup failed, will launch on first request: {}", e);
    }

    Ok(pool)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::mock::MockBrowserFactory;

    fn pool_with(factory: MockBrowserFactory) -> BrowserPool {
        BrowserPool::builder()
            .factory(Box::new(factory))
            .build()
            .unwrap()
    }

    #[test]
    fn test_pool_builder_missing_factory() {
        match BrowserPool::builder().build() {
            Err(BrowserPoolError::Configuration(msg)) => {
                assert!(msg.contains("No browser factory provided"), "got: {}", msg);
            }
            _ => panic!("Expected Configuration error for missing factory"),
        }
    }

    /// Verifies the first acquire launches and the second reuses.
    #[test]
    fn test_acquire_reuses_live_browser() {
        let factory = MockBrowserFactory::new();
        let probe = factory.probe();
        let pool = pool_with(factory);

        let first = pool.acquire().unwrap();
        let second = pool.acquire().unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(probe.creation_count(), 1);

        let stats = pool.stats();
        assert_eq!(stats.launches, 1);
        assert_eq!(stats.reuses, 1);
        assert!(stats.alive);
    }

    /// Verifies a dead engine is replaced on the next acquire.
    #[test]
    fn test_acquire_relaunches_dead_browser() {
        let factory = MockBrowserFactory::new();
        let probe = factory.probe();
        let pool = pool_with(factory);

        let first = pool.acquire().unwrap();
        probe.kill_browsers();
        let second = pool.acquire().unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(probe.creation_count(), 2);
        assert_eq!(pool.stats().launches, 2);
    }

    /// Verifies release(false) keeps the engine and release(true) closes it.
    #[test]
    fn test_release_semantics() {
        let factory = MockBrowserFactory::new();
        let probe = factory.probe();
        let pool = pool_with(factory);

        let handle = pool.acquire().unwrap();
        pool.release(false);
        assert!(handle.is_alive());
        assert_eq!(probe.browsers_closed(), 0);

        pool.release(true);
        assert!(!handle.is_alive());
        assert_eq!(probe.browsers_closed(), 1);
        assert!(!pool.stats().alive);
        assert_eq!(pool.stats().teardowns, 1);

        // Releasing an empty slot is harmless
        pool.release(true);
        assert_eq!(pool.stats().teardowns, 1);

        pool.acquire().unwrap();
        assert_eq!(probe.creation_count(), 2);
    }

    /// Verifies launch failures surface and are counted.
    #[test]
    fn test_launch_failure() {
        let pool = pool_with(MockBrowserFactory::always_fails("no chrome"));

        match pool.acquire() {
            Err(BrowserPoolError::BrowserCreation(msg)) => assert_eq!(msg, "no chrome"),
            other => panic!("Expected BrowserCreation, got {:?}", other),
        }
        assert_eq!(pool.stats().launch_failures, 1);
        assert!(!pool.stats().alive);
    }

    /// Verifies shutdown closes the engine and rejects later acquires.
    #[test]
    fn test_shutdown() {
        let factory = MockBrowserFactory::new();
        let probe = factory.probe();
        let pool = pool_with(factory);

        pool.acquire().unwrap();
        pool.shutdown();

        assert!(pool.is_shutting_down());
        assert_eq!(probe.browsers_closed(), 1);
        assert!(matches!(pool.acquire(), Err(BrowserPoolError::ShuttingDown)));
    }

    /// Verifies dropping the pool closes the engine.
    #[test]
    fn test_drop_closes_browser() {
        let factory = MockBrowserFactory::new();
        let probe = factory.probe();
        let pool = pool_with(factory);

        pool.acquire().unwrap();
        drop(pool);

        assert_eq!(probe.browsers_closed(), 1);
    }

    /// Verifies warmup surfaces launch failures without a running runtime.
    #[test]
    fn test_warmup_launch_failure() {
        let pool = pool_with(MockBrowserFactory::always_fails("no chrome")).into_shared();

        let result = tokio_test::block_on(pool.warmup());

        assert!(matches!(result, Err(BrowserPoolError::BrowserCreation(_))));
        assert_eq!(pool.stats().launch_failures, 1);
    }

    /// Verifies warmup launches through the blocking pool.
    #[tokio::test]
    async fn test_warmup() {
        let factory = MockBrowserFactory::new();
        let probe = factory.probe();
        let pool = pool_with(factory).into_shared();

        pool.warmup().await.unwrap();
        assert_eq!(probe.creation_count(), 1);

        pool.warmup().await.unwrap();
        assert_eq!(probe.creation_count(), 1);
    }
}
