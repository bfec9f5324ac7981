use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{BlobMetadata, BlobStore, StorageError, StoredBlob, validate_key};

/// Directory-backed [`BlobStore`].
///
/// Each blob is two files:
///
/// ```text
/// <root>/<key>.bin        raw bytes
/// <root>/<key>.meta.json  BlobMetadata as JSON
/// ```
///
/// Both are written to a temporary name first and renamed into place, data
/// before metadata, so a reader never sees metadata without its data.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;

        log::info!("💾 Blob store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.bin", key))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.meta.json", key))
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".tmp-{}", uuid::Uuid::new_v4().simple()));
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8], metadata: &BlobMetadata) -> Result<(), StorageError> {
        validate_key(key)?;

        let meta_json = serde_json::to_vec_pretty(metadata).map_err(|source| {
            StorageError::Metadata {
                key: key.to_string(),
                source,
            }
        })?;

        let io_err = |source: io::Error| StorageError::Io {
            key: key.to_string(),
            source,
        };
        write_atomically(&self.data_path(key), bytes).map_err(io_err)?;
        write_atomically(&self.meta_path(key), &meta_json).map_err(io_err)?;

        log::debug!("💾 Stored blob '{}' ({} bytes) on disk", key, bytes.len());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<StoredBlob>, StorageError> {
        validate_key(key)?;

        let io_err = |source: io::Error| StorageError::Io {
            key: key.to_string(),
            source,
        };

        let Some(meta_bytes) = read_optional(&self.meta_path(key)).map_err(io_err)? else {
            return Ok(None);
        };
        let Some(bytes) = read_optional(&self.data_path(key)).map_err(io_err)? else {
            log::warn!("⚠️ Blob '{}' has metadata but no data", key);
            return Ok(None);
        };

        let metadata = serde_json::from_slice(&meta_bytes).map_err(|source| {
            StorageError::Metadata {
                key: key.to_string(),
                source,
            }
        })?;

        Ok(Some(StoredBlob { bytes, metadata }))
    }
}
