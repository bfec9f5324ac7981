//! Concatenate PDF buffers into one document.
//!
//! Each appended buffer is parsed with `lopdf`, its objects renumbered past
//! everything already collected, and its pages queued in order.
//! [`PdfMerger::finalize`] builds a fresh page tree over the queued pages
//! and writes a compressed document.
//!
//! Attributes a page inherits from its old page tree (`Resources`,
//! `MediaBox`, `CropBox`, `Rotate`) are copied onto the page before the old
//! tree is discarded.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

/// Page attributes that may be inherited from ancestor `Pages` nodes.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed input.
const MAX_TREE_DEPTH: usize = 64;

/// Errors from [`PdfMerger`].
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("document {index} is not a readable PDF: {reason}")]
    Parse { index: usize, reason: String },

    #[error("document {index} is encrypted")]
    Encrypted { index: usize },

    #[error("no pages to merge")]
    Empty,

    #[error("failed to write merged PDF: {0}")]
    Write(String),
}

/// Accumulates PDFs in append order.
///
/// # Example
///
/// ```rust,ignore
/// use url2pdf_api::PdfMerger;
///
/// let mut merger = PdfMerger::new();
/// merger.append(&first_pdf)?;
/// merger.append(&second_pdf)?;
/// let merged = merger.finalize()?;
/// ```
pub struct PdfMerger {
    doc: Document,
    pages: Vec<ObjectId>,
    documents: usize,
}

impl PdfMerger {
    pub fn new() -> Self {
        Self {
            doc: Document::with_version("1.5"),
            pages: Vec::new(),
            documents: 0,
        }
    }

    /// Append every page of `pdf`, returning how many pages it contributed.
    ///
    /// A rejected buffer leaves the merger unchanged.
    ///
    /// # Errors
    ///
    /// [`MergeError::Parse`] or [`MergeError::Encrypted`].
    pub fn append(&mut self, pdf: &[u8]) -> Result<usize, MergeError> {
        let index = self.documents;
        let mut src = Document::load_mem(pdf).map_err(|e| MergeError::Parse {
            index,
            reason: e.to_string(),
        })?;

        if src.is_encrypted() {
            return Err(MergeError::Encrypted { index });
        }

        src.renumber_objects_with(self.doc.max_id + 1);
        let page_ids: Vec<ObjectId> = src.get_pages().values().copied().collect();

        for &page_id in &page_ids {
            flatten_inherited(&mut src, page_id);
        }

        if src.max_id > self.doc.max_id {
            self.doc.max_id = src.max_id;
        }
        self.doc.objects.extend(src.objects);
        self.pages.extend_from_slice(&page_ids);
        self.documents += 1;

        log::trace!("Appended document {} ({} page(s))", index, page_ids.len());
        Ok(page_ids.len())
    }

    /// Pages collected so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Documents accepted so far.
    pub fn document_count(&self) -> usize {
        self.documents
    }

    /// Build the merged document.
    ///
    /// # Errors
    ///
    /// [`MergeError::Empty`] when nothing was appended, [`MergeError::Write`]
    /// if serialisation fails.
    pub fn finalize(self) -> Result<Vec<u8>, MergeError> {
        let Self {
            mut doc, pages, ..
        } = self;

        if pages.is_empty() {
            return Err(MergeError::Empty);
        }

        let pages_id = doc.new_object_id();
        for &page_id in &pages {
            if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
                page.set("Parent", pages_id);
            }
        }

        let kids: Vec<Object> = pages.iter().map(|&id| Object::Reference(id)).collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.prune_objects();
        doc.renumber_objects();
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| MergeError::Write(e.to_string()))?;

        log::debug!("Merged {} page(s) into {} bytes", pages.len(), out.len());
        Ok(out)
    }
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy inherited attributes onto the page itself.
fn flatten_inherited(doc: &mut Document, page_id: ObjectId) {
    let inherited: Vec<(&[u8], Object)> = match doc.get_dictionary(page_id) {
        Ok(page) => INHERITABLE
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|&key| inherited_attribute(doc, page, key).map(|value| (key, value)))
            .collect(),
        Err(_) => return,
    };

    if inherited.is_empty() {
        return;
    }

    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}

fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

// ============================================================================
// Unit Tests
// ============================================================================
