//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lopdf::Document;
use url2pdf_api::factory::mock::{MockBrowserFactory, MockProbe};
use url2pdf_api::prelude::*;

/// Converter over a mock engine and an in-memory store.
pub struct Harness {
    pub converter: SharedPdfConverter,
    pub probe: MockProbe,
    pub store: Arc<MemoryBlobStore>,
}

impl Harness {
    pub fn new(factory: MockBrowserFactory, config: ConverterConfig) -> Self {
        let probe = factory.probe();
        let pool = BrowserPool::builder()
            .factory(Box::new(factory))
            .build()
            .expect("pool")
            .into_shared();
        let store = Arc::new(MemoryBlobStore::new());
        let converter = PdfConverter::new(pool, store.clone(), config).into_shared();

        Self {
            converter,
            probe,
            store,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(MockBrowserFactory::new(), ConverterConfig::default())
    }
}

/// Context with a comfortable deadline.
pub fn roomy_ctx() -> InvocationContext {
    InvocationContext::with_remaining(Duration::from_secs(10))
}

/// Text content of each page, in page order.
pub fn page_texts(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("valid pdf");
    doc.get_pages()
        .values()
        .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).expect("content")).into_owned())
        .collect()
}

pub fn urls(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("https://{}{}.example", prefix, i)).collect()
}
