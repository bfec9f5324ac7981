//! Core conversion pipeline (framework-agnostic).
//!
//! [`PdfConverter::convert`] is **synchronous/blocking**: it drives the
//! browser engine and the blob store directly. Call it from a blocking
//! context such as `tokio::task::spawn_blocking`.
//!
//! # Request Flow
//!
//! ```text
//! validate ──✗──→ 400, no browser touched
//!    │
//!    ▼
//! cache lookup (product identity only) ──hit──→ stored bytes
//!    │ miss
//!    ▼
//! acquire browser ─→ open page ─→ render URLs in order ─→ merge (N > 1)
//!                                    │ budget check before each URL
//!                                    ▼
//!                                  store ─→ outcome
//!    │
//!    ▼
//! page closed, browser torn down only if the host is nearly out of time
//! ```
//!
//! # Batches
//!
//! URLs are rendered one at a time on one page. Only the first
//! `page_cap` URLs are attempted. Before each URL the [`RenderBudget`] is
//! checked; once it is spent, the remaining URLs are skipped and whatever
//! was already rendered is merged and returned. A URL that fails to load or
//! print is logged and left out; the request still succeeds as long as one
//! page was produced.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::budget::RenderBudget;
use crate::config::{CachePolicy, ConverterConfig};
use crate::handle::PageSession;
use crate::merge::PdfMerger;
use crate::pool::SharedBrowserPool;
use crate::service::types::{
    BatchReport, ConversionOutcome, ConversionRequest, PageOutcome, PdfServiceError, SkipReason,
};
use crate::storage::{BlobMetadata, BlobStore, cache_key, random_blob_key};
use crate::traits::{PageTimeouts, PrintProfile};

/// Longest URL prefix written to logs.
const LOG_URL_MAX_LEN: usize = 80;

// ============================================================================
// Invocation Context
// ============================================================================

/// What the host tells us about the current invocation.
///
/// Serverless hosts expose the time left before they kill the invocation.
/// The context carries it as an absolute deadline so it can be read at any
/// point of the request.
#[derive(Debug, Clone, Copy)]
pub struct InvocationContext {
    deadline: Instant,
}

impl InvocationContext {
    pub fn with_deadline(deadline: Instant) -> Self {
        Self { deadline }
    }

    /// Deadline `remaining` from now.
    pub fn with_remaining(remaining: Duration) -> Self {
        Self::with_deadline(Instant::now() + remaining)
    }

    /// Deadline of `config.execution_limit` from now, for hosts with no
    /// remaining-time signal of their own.
    pub fn for_config(config: &ConverterConfig) -> Self {
        Self::with_remaining(config.execution_limit)
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the host deadline, zero once it has passed.
    pub fn remaining_time(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Render budget running from now to the deadline minus `safety_margin`.
    pub fn render_budget(&self, safety_margin: Duration) -> RenderBudget {
        RenderBudget::until(self.deadline, safety_margin)
    }
}

// ============================================================================
// Converter
// ============================================================================

/// Shared converter.
pub type SharedPdfConverter = Arc<PdfConverter>;

/// Turns [`ConversionRequest`]s into PDFs.
///
/// Holds the shared browser pool, the blob store and the configuration.
/// One converter serves every request of the process.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use url2pdf_api::service::{ConversionRequest, InvocationContext, PdfConverter};
///
/// let converter = PdfConverter::new(pool, Arc::new(MemoryBlobStore::new()), config);
/// let ctx = InvocationContext::for_config(converter.config());
///
/// let outcome = converter.convert(&ConversionRequest::single("https://example.com"), &ctx)?;
/// println!("{} -> {:?}", outcome.filename, outcome.pdf_url);
/// ```
pub struct PdfConverter {
    pool: SharedBrowserPool,
    store: Arc<dyn BlobStore>,
    config: ConverterConfig,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
struct ValidatedRequest {
    targets: Vec<String>,
    cache_key: Option<String>,
}

/// Pages rendered by one batch, with their position in the request.
struct RenderedBatch {
    report: BatchReport,
    documents: Vec<(usize, Vec<u8>)>,
}

impl PdfConverter {
    pub fn new(pool: SharedBrowserPool, store: Arc<dyn BlobStore>, config: ConverterConfig) -> Self {
        Self {
            pool,
            store,
            config,
        }
    }

    pub fn into_shared(self) -> SharedPdfConverter {
        Arc::new(self)
    }

    pub fn pool(&self) -> &SharedBrowserPool {
        &self.pool
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Run one request to completion.
    ///
    /// After validation succeeds, the browser teardown check runs no matter
    /// how the request ends: if the host has less than
    /// `teardown_threshold` left, the shared browser is closed.
    ///
    /// # Errors
    ///
    /// - 400 family when validation fails (nothing else runs)
    /// - [`PdfServiceError::BrowserUnavailable`] if the engine cannot start
    ///   or open a page
    /// - [`PdfServiceError::RenderFailed`] if the only URL of a single-URL
    ///   request fails
    /// - [`PdfServiceError::NothingRendered`] if no URL produced a page
    /// - [`PdfServiceError::Storage`] if the result cannot be stored
    pub fn convert(
        &self,
        request: &ConversionRequest,
        ctx: &InvocationContext,
    ) -> Result<ConversionOutcome, PdfServiceError> {
        let validated = validate_request(request, &self.config).inspect_err(|e| {
            log::debug!("Rejected request: {}", e);
        })?;

        let started = Instant::now();
        log::info!(
            "📄 Converting {} URL(s), first: {}",
            validated.targets.len(),
            truncate_url(&validated.targets[0], LOG_URL_MAX_LEN)
        );

        let result = self.execute(&validated, ctx);
        self.release_browser(ctx);

        match &result {
            Ok(outcome) => log::info!(
                "✅ PDF ready: {} ({} bytes{}) in {:?}",
                outcome.filename,
                outcome.bytes.len(),
                if outcome.cached { ", cached" } else { "" },
                started.elapsed()
            ),
            Err(e) => log::error!("❌ Conversion failed after {:?}: {}", started.elapsed(), e),
        }

        result
    }

    fn execute(
        &self,
        request: &ValidatedRequest,
        ctx: &InvocationContext,
    ) -> Result<ConversionOutcome, PdfServiceError> {
        if let Some(key) = &request.cache_key {
            if let Some(hit) = self.lookup_cached(key) {
                return Ok(hit);
            }
        }

        let budget = ctx.render_budget(self.config.safety_margin);

        let browser = self
            .pool
            .acquire()
            .map_err(|e| PdfServiceError::BrowserUnavailable(e.to_string()))?;

        let timeouts = PageTimeouts::uniform(self.config.operation_timeout, self.config.ready_wait);
        let mut session = browser
            .open_session(&timeouts)
            .map_err(|e| PdfServiceError::BrowserUnavailable(e.to_string()))?;

        let single = request.targets.len() == 1;
        let profile = if single {
            PrintProfile::single_page()
        } else {
            PrintProfile::batch()
        };

        let batch = self.render_batch(&mut session, &request.targets, &profile, &budget);
        session.close();

        let (bytes, report) = if single {
            single_document(batch)?
        } else {
            merge_documents(batch)?
        };

        let counts = (!single).then(|| (report.processed(), report.total()));
        self.persist(request, bytes, counts, report)
    }

    /// Render `targets` in order on one page session.
    ///
    /// Never fails: every URL ends up as one [`PageOutcome`].
    fn render_batch(
        &self,
        session: &mut PageSession,
        targets: &[String],
        profile: &PrintProfile,
        budget: &RenderBudget,
    ) -> RenderedBatch {
        let mut outcomes = Vec::with_capacity(targets.len());
        let mut documents = Vec::new();
        let mut exhausted = false;

        if targets.len() > self.config.page_cap {
            log::warn!(
                "⚠️ {} URL(s) requested, only the first {} will be rendered",
                targets.len(),
                self.config.page_cap
            );
        }

        for (index, url) in targets.iter().enumerate() {
            if index >= self.config.page_cap {
                outcomes.push(PageOutcome::Skipped {
                    url: url.clone(),
                    reason: SkipReason::PageCap,
                });
                continue;
            }

            // A lone URL always gets its attempt; only batches check the budget.
            if !exhausted && targets.len() > 1 && budget.should_abort() {
                log::warn!(
                    "⏱️ Render budget spent after {:?}, skipping URL {} and later",
                    budget.elapsed(),
                    index + 1
                );
                exhausted = true;
            }

            if exhausted {
                outcomes.push(PageOutcome::Skipped {
                    url: url.clone(),
                    reason: SkipReason::BudgetExhausted,
                });
                continue;
            }

            if let Err(e) = validate_url(index, url) {
                log::warn!("⚠️ Skipping URL {}: {}", index + 1, e);
                outcomes.push(PageOutcome::Failed {
                    url: url.clone(),
                    reason: e.to_string(),
                });
                continue;
            }

            log::debug!(
                "Rendering URL {}/{}: {}",
                index + 1,
                targets.len(),
                truncate_url(url, LOG_URL_MAX_LEN)
            );

            match session.render(url, profile) {
                Ok(bytes) => {
                    outcomes.push(PageOutcome::Rendered {
                        url: url.clone(),
                        bytes: bytes.len(),
                    });
                    documents.push((index, bytes));
                }
                Err(e) => {
                    log::warn!(
                        "⚠️ Skipping {}: {}",
                        truncate_url(url, LOG_URL_MAX_LEN),
                        e
                    );
                    outcomes.push(PageOutcome::Failed {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        RenderedBatch {
            report: BatchReport { outcomes },
            documents,
        }
    }

    /// Stored result for `key`, if any.
    ///
    /// A failing store read is logged and treated as a miss.
    fn lookup_cached(&self, key: &str) -> Option<ConversionOutcome> {
        let blob = match self.store.get(key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                log::debug!("Cache miss for '{}'", key);
                return None;
            }
            Err(e) => {
                log::warn!("⚠️ Cache lookup for '{}' failed, rendering instead: {}", key, e);
                return None;
            }
        };

        log::info!("📦 Cache hit for '{}' ({} bytes)", key, blob.bytes.len());

        Some(ConversionOutcome {
            filename: pdf_filename(key),
            blob_key: Some(key.to_string()),
            pdf_url: Some(self.config.blob_url(key)),
            processed_pages: blob.metadata.processed_pages,
            total_pages: blob.metadata.total_pages,
            cached: true,
            report: BatchReport::default(),
            bytes: blob.bytes,
        })
    }

    /// Store the document when caching or the delivery strategy needs it.
    fn persist(
        &self,
        request: &ValidatedRequest,
        bytes: Vec<u8>,
        counts: Option<(usize, usize)>,
        report: BatchReport,
    ) -> Result<ConversionOutcome, PdfServiceError> {
        let store_it = request.cache_key.is_some() || self.config.delivery.requires_storage();
        let key = request.cache_key.clone().unwrap_or_else(random_blob_key);

        let pdf_url = if store_it {
            let mut metadata = BlobMetadata::pdf_now();
            if let Some((processed, total)) = counts {
                metadata = metadata.with_page_counts(processed, total);
            }

            self.store
                .put(&key, &bytes, &metadata)
                .map_err(|e| PdfServiceError::Storage(e.to_string()))?;
            log::debug!("💾 Stored result as '{}'", key);

            Some(self.config.blob_url(&key))
        } else {
            None
        };

        Ok(ConversionOutcome {
            filename: pdf_filename(&key),
            blob_key: store_it.then_some(key),
            pdf_url,
            processed_pages: counts.map(|(processed, _)| processed),
            total_pages: counts.map(|(_, total)| total),
            cached: false,
            report,
            bytes,
        })
    }

    /// Close the shared browser if the host is about to freeze us.
    fn release_browser(&self, ctx: &InvocationContext) {
        let remaining = ctx.remaining_time();
        let teardown = remaining < self.config.teardown_threshold;

        if teardown {
            log::info!(
                "⏱️ Only {:?} left in this invocation, closing browser",
                remaining
            );
        }

        self.pool.release(teardown);
    }
}

impl std::fmt::Debug for PdfConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfConverter")
            .field("pool", &self.pool)
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Check targets and, with product caching, derive the cache key.
fn validate_request(
    request: &ConversionRequest,
    config: &ConverterConfig,
) -> Result<ValidatedRequest, PdfServiceError> {
    let raw = request.targets();
    if raw.is_empty() || raw.iter().all(|t| t.trim().is_empty()) {
        return Err(PdfServiceError::MissingTargets);
    }

    // A lone target must be usable. Bad entries in a batch fail on their own
    // when the batch is rendered.
    let targets = match raw {
        [only] => vec![validate_url(0, only)?],
        _ => raw.iter().map(|t| t.trim().to_string()).collect(),
    };

    let cache_key = match config.cache_policy {
        CachePolicy::Off => None,
        CachePolicy::ProductIdentity => {
            let name = request
                .product_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty());
            let id = request
                .product_id
                .as_ref()
                .map(|id| id.to_string())
                .filter(|id| !id.trim().is_empty());

            match (name, id) {
                (Some(name), Some(id)) => {
                    Some(cache_key(name, &id).ok_or(PdfServiceError::MissingProductIdentity)?)
                }
                _ => return Err(PdfServiceError::MissingProductIdentity),
            }
        }
    };

    Ok(ValidatedRequest { targets, cache_key })
}

/// Trim `target` and require an absolute URL.
fn validate_url(index: usize, target: &str) -> Result<String, PdfServiceError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(PdfServiceError::InvalidUrl(format!(
            "URL at position {} is empty",
            index + 1
        )));
    }

    match url::Url::parse(target) {
        Ok(_) => Ok(target.to_string()),
        Err(e) => {
            log::debug!("URL validation failed for '{}': {}", target, e);
            Err(PdfServiceError::InvalidUrl(format!(
                "'{}': {}",
                truncate_url(target, LOG_URL_MAX_LEN),
                e
            )))
        }
    }
}

/// The single rendered document, or why there is none.
fn single_document(mut batch: RenderedBatch) -> Result<(Vec<u8>, BatchReport), PdfServiceError> {
    if let Some((_, bytes)) = batch.documents.pop() {
        return Ok((bytes, batch.report));
    }

    match batch.report.outcomes.first() {
        Some(PageOutcome::Failed { reason, .. }) => Err(PdfServiceError::RenderFailed(reason.clone())),
        Some(PageOutcome::Skipped { reason, .. }) => {
            Err(PdfServiceError::RenderFailed(format!("page skipped: {}", reason)))
        }
        _ => Err(PdfServiceError::NothingRendered { requested: 1 }),
    }
}

/// Merge rendered documents in request order.
///
/// A document the merger cannot read is demoted to a failed outcome.
fn merge_documents(batch: RenderedBatch) -> Result<(Vec<u8>, BatchReport), PdfServiceError> {
    let RenderedBatch {
        mut report,
        documents,
    } = batch;

    let mut merger = PdfMerger::new();
    for (index, bytes) in documents {
        if let Err(e) = merger.append(&bytes) {
            log::warn!("⚠️ Dropping unreadable page {}: {}", index + 1, e);
            let url = report.outcomes[index].url().to_string();
            report.outcomes[index] = PageOutcome::Failed {
                url,
                reason: e.to_string(),
            };
        }
    }

    if merger.document_count() == 0 {
        return Err(PdfServiceError::NothingRendered {
            requested: report.total(),
        });
    }

    log::debug!(
        "Merging {} page(s) from {} document(s)",
        merger.page_count(),
        merger.document_count()
    );

    let merged = merger
        .finalize()
        .map_err(|e| PdfServiceError::Internal(e.to_string()))?;
    Ok((merged, report))
}

/// Download name for a blob key.
fn pdf_filename(key: &str) -> String {
    if key.ends_with(".pdf") {
        key.to_string()
    } else {
        format!("{}.pdf", key)
    }
}

/// Truncate a URL for logging.
fn truncate_url(url: &str, max_len: usize) -> String {
    match url.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &url[..cut]),
        None => url.to_string(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConverterConfigBuilder, DeliveryStrategy};
    use crate::factory::mock::{MockBrowserFactory, MockProbe};
    use crate::pool::BrowserPool;
    use crate::storage::MemoryBlobStore;
    use lopdf::Document;

    fn converter_with(
        factory: MockBrowserFactory,
        config: ConverterConfig,
    ) -> (PdfConverter, MockProbe, Arc<MemoryBlobStore>) {
        let probe = factory.probe();
        let pool = BrowserPool::builder()
            .factory(Box::new(factory))
            .build()
            .unwrap()
            .into_shared();
        let store = Arc::new(MemoryBlobStore::new());
        (PdfConverter::new(pool, store.clone(), config), probe, store)
    }

    fn converter() -> (PdfConverter, MockProbe, Arc<MemoryBlobStore>) {
        converter_with(MockBrowserFactory::new(), ConverterConfig::default())
    }

    fn ctx() -> InvocationContext {
        InvocationContext::with_remaining(Duration::from_secs(10))
    }

    fn page_texts(pdf: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(pdf).unwrap();
        doc.get_pages()
            .values()
            .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    #[test]
    fn test_validate_url_accepts_absolute() {
        assert_eq!(validate_url(0, " https://example.com/a ").unwrap(), "https://example.com/a");
        assert!(validate_url(0, "http://localhost:3000/api").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_relative_and_empty() {
        assert!(matches!(validate_url(0, "example.com"), Err(PdfServiceError::InvalidUrl(_))));
        assert!(matches!(validate_url(0, "/path"), Err(PdfServiceError::InvalidUrl(_))));
        assert!(matches!(validate_url(2, "  "), Err(PdfServiceError::InvalidUrl(msg)) if msg.contains('3')));
    }

    #[test]
    fn test_validate_request_missing_targets() {
        let config = ConverterConfig::default();

        for request in [
            ConversionRequest::default(),
            ConversionRequest::single("   "),
            ConversionRequest::batch(Vec::<String>::new()),
        ] {
            assert_eq!(
                validate_request(&request, &config),
                Err(PdfServiceError::MissingTargets)
            );
        }
    }

    #[test]
    fn test_validate_request_product_identity() {
        let config = ConverterConfigBuilder::new()
            .cache_policy(CachePolicy::ProductIdentity)
            .build()
            .unwrap();

        let bare = ConversionRequest::single("https://x.example");
        assert_eq!(
            validate_request(&bare, &config),
            Err(PdfServiceError::MissingProductIdentity)
        );

        let unusable = bare.clone().with_product("???", "42");
        assert_eq!(
            validate_request(&unusable, &config),
            Err(PdfServiceError::MissingProductIdentity)
        );

        let named = bare.with_product("Blue Widget", "42");
        let validated = validate_request(&named, &config).unwrap();
        assert_eq!(validated.cache_key.as_deref(), Some("blue-widget-42"));
    }

    #[test]
    fn test_invalid_request_never_touches_pool() {
        let (converter, probe, _) = converter();

        let err = converter
            .convert(&ConversionRequest::default(), &ctx())
            .unwrap_err();

        assert_eq!(err, PdfServiceError::MissingTargets);
        assert_eq!(probe.creation_count(), 0);
        assert_eq!(converter.pool().stats().acquisitions(), 0);
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    #[test]
    fn test_single_url_uses_half_scale_and_no_merge() {
        let (converter, probe, store) = converter();

        let outcome = converter
            .convert(&ConversionRequest::single("https://x.example"), &ctx())
            .unwrap();

        assert_eq!(probe.prints(), vec![("https://x.example".to_string(), 0.5)]);
        assert_eq!(outcome.processed_pages, None);
        assert_eq!(outcome.total_pages, None);
        // The mock's own bytes come back untouched.
        assert_eq!(
            outcome.bytes,
            crate::factory::mock::single_page_pdf("https://x.example").unwrap()
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_batch_merges_in_order() {
        let (converter, probe, _) = converter();
        let request =
            ConversionRequest::batch(["https://a.example", "https://b.example", "https://c.example"]);

        let outcome = converter.convert(&request, &ctx()).unwrap();

        assert_eq!(outcome.processed_pages, Some(3));
        assert_eq!(outcome.total_pages, Some(3));
        assert!(probe.prints().iter().all(|(_, scale)| *scale == 1.0));

        let texts = page_texts(&outcome.bytes);
        assert_eq!(texts.len(), 3);
        assert!(texts[0].contains("a.example"));
        assert!(texts[1].contains("b.example"));
        assert!(texts[2].contains("c.example"));
    }

    #[test]
    fn test_batch_skips_failed_url() {
        let factory = MockBrowserFactory::new().with_failing_url("https://b.example");
        let (converter, _, _) = converter_with(factory, ConverterConfig::default());
        let request =
            ConversionRequest::batch(["https://a.example", "https://b.example", "https://c.example"]);

        let outcome = converter.convert(&request, &ctx()).unwrap();

        assert_eq!(outcome.processed_pages, Some(2));
        assert_eq!(outcome.total_pages, Some(3));
        assert_eq!(outcome.report.failed(), 1);

        let texts = page_texts(&outcome.bytes);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("a.example"));
        assert!(texts[1].contains("c.example"));
    }

    #[test]
    fn test_batch_respects_page_cap() {
        let (converter, probe, _) = converter();
        let urls: Vec<String> = (1..=7).map(|i| format!("https://p{}.example", i)).collect();

        let outcome = converter
            .convert(&ConversionRequest::batch(urls.clone()), &ctx())
            .unwrap();

        assert_eq!(probe.navigations(), urls[..5].to_vec());
        assert_eq!(outcome.processed_pages, Some(5));
        assert_eq!(outcome.total_pages, Some(7));
        assert_eq!(outcome.report.skipped(SkipReason::PageCap), 2);
    }

    #[test]
    fn test_budget_exhaustion_stops_new_urls() {
        let factory = MockBrowserFactory::new().with_navigation_delay(Duration::from_millis(100));
        let config = ConverterConfigBuilder::new()
            .safety_margin(Duration::from_millis(50))
            .build()
            .unwrap();
        let (converter, probe, _) = converter_with(factory, config);
        let urls: Vec<String> = (1..=5).map(|i| format!("https://slow{}.example", i)).collect();

        let ctx = InvocationContext::with_remaining(Duration::from_millis(200));
        let outcome = converter.convert(&ConversionRequest::batch(urls), &ctx).unwrap();

        let processed = outcome.processed_pages.unwrap();
        assert!(processed >= 1 && processed <= 2, "processed {}", processed);
        assert_eq!(probe.navigations().len(), processed);
        assert_eq!(
            outcome.report.skipped(SkipReason::BudgetExhausted),
            5 - processed
        );
        assert_eq!(page_texts(&outcome.bytes).len(), processed);
    }

    #[test]
    fn test_single_url_renders_past_budget() {
        let (converter, probe, _) = converter();

        // Less time left than the default safety margin.
        let ctx = InvocationContext::with_remaining(Duration::from_millis(1500));
        let outcome = converter
            .convert(&ConversionRequest::single("https://x.example"), &ctx)
            .unwrap();

        assert_eq!(probe.navigations(), vec!["https://x.example".to_string()]);
        assert_eq!(page_texts(&outcome.bytes).len(), 1);
        assert_eq!(outcome.report.skipped(SkipReason::BudgetExhausted), 0);
    }

    #[test]
    fn test_batch_with_spent_budget_renders_nothing() {
        let (converter, probe, store) = converter();
        let urls: Vec<String> = (1..=3).map(|i| format!("https://late{}.example", i)).collect();

        let ctx = InvocationContext::with_deadline(Instant::now() - Duration::from_millis(1));
        let err = converter
            .convert(&ConversionRequest::batch(urls), &ctx)
            .unwrap_err();

        assert_eq!(err, PdfServiceError::NothingRendered { requested: 3 });
        assert_eq!(err.status_code(), 500);
        assert!(probe.navigations().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_spent_budget_skips_every_batch_url() {
        let (converter, _, _) = converter();
        let urls: Vec<String> = (1..=3).map(|i| format!("https://late{}.example", i)).collect();
        let budget = RenderBudget::until(
            Instant::now() - Duration::from_millis(1),
            converter.config().safety_margin,
        );

        let browser = converter.pool().acquire().unwrap();
        let mut session = browser
            .open_session(&PageTimeouts::uniform(Duration::from_secs(1), Duration::ZERO))
            .unwrap();
        let batch = converter.render_batch(&mut session, &urls, &PrintProfile::batch(), &budget);
        session.close();

        assert!(batch.documents.is_empty());
        assert_eq!(batch.report.skipped(SkipReason::BudgetExhausted), 3);
        assert_eq!(batch.report.total(), 3);
    }

    #[test]
    fn test_malformed_url_in_batch_is_skipped() {
        let (converter, probe, _) = converter();

        let outcome = converter
            .convert(
                &ConversionRequest::batch(["https://a.example", "not a url", "https://c.example"]),
                &ctx(),
            )
            .unwrap();

        assert_eq!(outcome.processed_pages, Some(2));
        assert_eq!(outcome.total_pages, Some(3));
        assert_eq!(outcome.report.failed(), 1);
        assert_eq!(
            probe.navigations(),
            vec!["https://a.example".to_string(), "https://c.example".to_string()]
        );

        let texts = page_texts(&outcome.bytes);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("a.example"));
        assert!(texts[1].contains("c.example"));
    }

    #[test]
    fn test_malformed_single_url_is_bad_request() {
        let (converter, probe, _) = converter();

        let err = converter
            .convert(&ConversionRequest::single("not a url"), &ctx())
            .unwrap_err();

        assert!(matches!(err, PdfServiceError::InvalidUrl(_)));
        assert_eq!(err.status_code(), 400);
        assert_eq!(probe.creation_count(), 0);
    }

    #[test]
    fn test_single_skipped_outcome_names_the_reason() {
        let batch = RenderedBatch {
            report: BatchReport {
                outcomes: vec![PageOutcome::Skipped {
                    url: "https://x.example".to_string(),
                    reason: SkipReason::BudgetExhausted,
                }],
            },
            documents: Vec::new(),
        };

        match single_document(batch) {
            Err(PdfServiceError::RenderFailed(reason)) => {
                assert!(reason.contains("budget"), "got: {}", reason)
            }
            other => panic!("Expected RenderFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_single_url_failure_is_render_error() {
        let factory = MockBrowserFactory::new().with_failing_url("https://x.example");
        let (converter, _, store) = converter_with(factory, ConverterConfig::default());

        let err = converter
            .convert(&ConversionRequest::single("https://x.example"), &ctx())
            .unwrap_err();

        assert!(matches!(err, PdfServiceError::RenderFailed(_)));
        assert_eq!(err.status_code(), 500);
        assert!(store.is_empty());
    }

    #[test]
    fn test_batch_with_no_successes_fails() {
        let factory = MockBrowserFactory::new()
            .with_failing_url("https://a.example")
            .with_failing_print("https://b.example");
        let (converter, _, _) = converter_with(factory, ConverterConfig::default());

        let err = converter
            .convert(
                &ConversionRequest::batch(["https://a.example", "https://b.example"]),
                &ctx(),
            )
            .unwrap_err();

        assert_eq!(err, PdfServiceError::NothingRendered { requested: 2 });
    }

    #[test]
    fn test_launch_failure_is_browser_unavailable() {
        let (converter, _, _) = converter_with(
            MockBrowserFactory::always_fails("no chrome"),
            ConverterConfig::default(),
        );

        let err = converter
            .convert(&ConversionRequest::single("https://x.example"), &ctx())
            .unwrap_err();

        assert!(matches!(err, PdfServiceError::BrowserUnavailable(msg) if msg.contains("no chrome")));
    }

    // -------------------------------------------------------------------------
    // Storage and caching
    // -------------------------------------------------------------------------

    #[test]
    fn test_storage_url_delivery_stores_random_key() {
        let (converter, _, store) = converter();

        let outcome = converter
            .convert(&ConversionRequest::single("https://x.example"), &ctx())
            .unwrap();

        let key = outcome.blob_key.clone().unwrap();
        assert!(key.ends_with(".pdf"));
        assert_eq!(outcome.filename, key);
        assert_eq!(
            outcome.pdf_url.as_deref(),
            Some(format!("http://localhost:8080/blobs/pdfs/{}", key).as_str())
        );
        assert_eq!(store.get(&key).unwrap().unwrap().bytes, outcome.bytes);
    }

    #[test]
    fn test_direct_bytes_without_cache_stores_nothing() {
        let config = ConverterConfigBuilder::new()
            .delivery(DeliveryStrategy::DirectBytes)
            .build()
            .unwrap();
        let (converter, _, store) = converter_with(MockBrowserFactory::new(), config);

        let outcome = converter
            .convert(&ConversionRequest::single("https://x.example"), &ctx())
            .unwrap();

        assert!(store.is_empty());
        assert!(outcome.blob_key.is_none());
        assert!(outcome.pdf_url.is_none());
        assert!(outcome.filename.ends_with(".pdf"));
    }

    #[test]
    fn test_product_cache_renders_once() {
        let config = ConverterConfigBuilder::new()
            .cache_policy(CachePolicy::ProductIdentity)
            .build()
            .unwrap();
        let (converter, probe, store) = converter_with(MockBrowserFactory::new(), config);
        let request = ConversionRequest::batch(["https://a.example", "https://b.example"])
            .with_product("Blue Widget", "42");

        let first = converter.convert(&request, &ctx()).unwrap();
        let second = converter.convert(&request, &ctx()).unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(probe.navigations().len(), 2);
        assert_eq!(second.bytes, first.bytes);
        assert_eq!(second.filename, "blue-widget-42.pdf");
        assert_eq!(second.processed_pages, Some(2));
        assert_eq!(second.total_pages, Some(2));
        assert_eq!(store.keys(), vec!["blue-widget-42".to_string()]);
    }

    // -------------------------------------------------------------------------
    // Browser lifetime
    // -------------------------------------------------------------------------

    #[test]
    fn test_browser_kept_warm_between_requests() {
        let (converter, probe, _) = converter();

        for _ in 0..3 {
            converter
                .convert(&ConversionRequest::single("https://x.example"), &ctx())
                .unwrap();
        }

        assert_eq!(probe.creation_count(), 1);
        assert_eq!(probe.pages_opened(), 3);
        assert_eq!(probe.pages_closed(), 3);
        assert_eq!(probe.browsers_closed(), 0);
    }

    #[test]
    fn test_browser_torn_down_when_host_time_is_short() {
        let config = ConverterConfigBuilder::new()
            .safety_margin(Duration::from_millis(100))
            .build()
            .unwrap();
        let (converter, probe, _) = converter_with(MockBrowserFactory::new(), config);

        let ctx = InvocationContext::with_remaining(Duration::from_millis(900));
        converter
            .convert(&ConversionRequest::single("https://x.example"), &ctx)
            .unwrap();

        assert_eq!(probe.browsers_closed(), 1);
        assert_eq!(converter.pool().stats().teardowns, 1);
        assert!(!converter.pool().stats().alive);
    }

    #[test]
    fn test_teardown_check_runs_on_failure_too() {
        let factory = MockBrowserFactory::new().with_failing_url("https://x.example");
        let (converter, probe, _) = converter_with(factory, ConverterConfig::default());

        let ctx = InvocationContext::with_remaining(Duration::from_millis(500));
        assert!(converter
            .convert(&ConversionRequest::single("https://x.example"), &ctx)
            .is_err());

        assert_eq!(probe.browsers_closed(), 1);
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    #[test]
    fn test_invocation_context_remaining() {
        let ctx = InvocationContext::with_remaining(Duration::from_secs(5));
        assert!(ctx.remaining_time() <= Duration::from_secs(5));
        assert!(ctx.remaining_time() > Duration::from_secs(4));

        let past = InvocationContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(past.remaining_time(), Duration::ZERO);
        assert!(past.render_budget(Duration::ZERO).should_abort());
    }

    #[test]
    fn test_pdf_filename() {
        assert_eq!(pdf_filename("a.pdf"), "a.pdf");
        assert_eq!(pdf_filename("blue-widget-42"), "blue-widget-42.pdf");
    }

    #[test]
    fn test_truncate_url() {
        assert_eq!(truncate_url("https://example.com", 50), "https://example.com");
        let truncated = truncate_url("https://example.com/very/long/path", 10);
        assert_eq!(truncated, "https://ex...");
        assert_eq!(truncate_url("ééééé", 2), "éé...");
    }
}
