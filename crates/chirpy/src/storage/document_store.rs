//! Whole-file JSON document store.
//!
//! The only component in Chirpy that touches the filesystem. The entire
//! [`Document`] is read on every load and rewritten on every store; there is
//! no partial update on disk.
//!
//! # Durability
//!
//! `store` writes the serialized document to a sibling temporary file and
//! renames it over the backing path. A crash mid-write leaves either the
//! previous document or the new one, never a truncated mix. A stale temp
//! file left behind by a crash is overwritten by the next store and is never
//! read.
//!
//! The store does no locking of its own; the repository serializes access.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{ChirpyError, Result};
use crate::model::Document;

const TMP_EXTENSION: &str = "tmp";

/// Filesystem-backed store holding a single JSON [`Document`].
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    /// Create a store for `path`. Nothing is touched on disk until
    /// [`ensure_exists`](Self::ensure_exists), `load`, or `store` is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the backing file containing an empty document if it is absent.
    ///
    /// Idempotent: an existing file is left untouched, whatever it contains.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Storage` if the file or its parent directory
    /// cannot be created.
    pub fn ensure_exists(&self) -> Result<()> {
        match std::fs::metadata(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("creating empty document at {}", self.path.display());
                self.store(&Document::default())
            }
            Err(e) => Err(ChirpyError::storage(&self.path, e)),
        }
    }

    /// Read and decode the full document.
    ///
    /// A missing or empty file decodes to an empty document.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Corruption` if the file has content that is not
    /// a well-formed document, or `ChirpyError::Storage` on read errors.
    pub fn load(&self) -> Result<Document> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::default()),
            Err(e) => return Err(ChirpyError::storage(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Document::default());
        }

        let document: Document =
            serde_json::from_slice(&bytes).map_err(|e| self.corruption(e.to_string()))?;
        document.check_keys().map_err(|reason| self.corruption(reason))?;

        log::debug!(
            "loaded document from {}: {} chirps, {} users",
            self.path.display(),
            document.chirps.len(),
            document.user_count()
        );
        Ok(document)
    }

    /// Serialize the full document and atomically replace the backing file.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Storage` for filesystem errors.
    pub fn store(&self, document: &Document) -> Result<()> {
        let json = serde_json::to_vec(document).map_err(|e| {
            ChirpyError::storage(&self.path, std::io::Error::new(ErrorKind::InvalidData, e))
        })?;
        write_atomic(&self.path, &json)
    }

    /// Delete the backing file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Storage` if the file exists but cannot be removed.
    pub fn reset(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("removed document at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChirpyError::storage(&self.path, e)),
        }
    }

    fn corruption(&self, reason: String) -> ChirpyError {
        log::warn!("document at {} is malformed: {reason}", self.path.display());
        ChirpyError::Corruption {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Path of the sibling temp file used while replacing `path`.
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(TMP_EXTENSION);
    path.with_file_name(name)
}

/// Write `data` to `path` atomically using a sibling temporary file.
///
/// Creates the parent directory if it does not exist.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ChirpyError::storage(parent, e))?;
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, data).map_err(|e| ChirpyError::storage(&tmp, e))?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(ChirpyError::storage(path, e));
    }

    Ok(())
}
