use std::collections::HashMap;
use std::sync::RwLock;

use super::{BlobMetadata, BlobStore, StorageError, StoredBlob, validate_key};

/// In-memory [`BlobStore`].
///
/// Suits a single long-lived process and tests. Contents vanish with the
/// process.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        match self.blobs.read() {
            Ok(blobs) => blobs.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.blobs.read() {
            Ok(blobs) => blobs.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        keys.sort();
        keys
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8], metadata: &BlobMetadata) -> Result<(), StorageError> {
        validate_key(key)?;

        let blob = StoredBlob {
            bytes: bytes.to_vec(),
            metadata: metadata.clone(),
        };

        let mut blobs = self.blobs.write().unwrap_or_else(|p| p.into_inner());
        blobs.insert(key.to_string(), blob);
        log::debug!("💾 Stored blob '{}' ({} bytes) in memory", key, bytes.len());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<StoredBlob>, StorageError> {
        validate_key(key)?;

        let blobs = self.blobs.read().unwrap_or_else(|p| p.into_inner());
        Ok(blobs.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_put_get() {
        let store = MemoryBlobStore::new();
        assert!(store.is_empty());
        assert!(store.get("missing.pdf").unwrap().is_none());

        let meta = BlobMetadata::pdf_now();
        store.put("a.pdf", b"%PDF-1.5", &meta).unwrap();

        let blob = store.get("a.pdf").unwrap().unwrap();
        assert_eq!(blob.bytes, b"%PDF-1.5");
        assert_eq!(blob.metadata, meta);
        assert_eq!(store.keys(), vec!["a.pdf".to_string()]);
    }

    #[test]
    fn test_memory_store_rejects_bad_keys() {
        let store = MemoryBlobStore::new();
        let meta = BlobMetadata::pdf_now();

        assert!(matches!(
            store.put("../escape", b"x", &meta),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(store.get("a/b").is_err());
        assert_eq!(store.len(), 0);
    }
}
