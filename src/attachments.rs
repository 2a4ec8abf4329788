//! Content-addressed storage for basket-item documentation files.
//!
//! Files live at `<root>/<case_id>/<sha256-hex>`. Identical uploads for the
//! same case share one file on disk.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::claim::ClaimError;
use crate::models::StoredAttachment;

/// Largest accepted upload.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Attachment is empty")]
    Empty,
    #[error("Attachment exceeds {MAX_ATTACHMENT_BYTES} bytes")]
    TooLarge,
    #[error("Invalid attachment file name: {0}")]
    InvalidFileName(String),
    #[error("Attachment not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ClaimError {
    fn from(err: StorageError) -> Self {
        tracing::warn!(error = %err, "Attachment store call failed");
        ClaimError::PersistenceFailure(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` for a case and describe the stored file.
    pub async fn store(
        &self,
        case_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredAttachment, StorageError> {
        let file_name = validate_file_name(file_name)?;
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(StorageError::TooLarge);
        }

        let content_hash = content_hash(bytes);
        let dir = self.root.join(case_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(&content_hash);
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(%case_id, hash = %content_hash, "Attachment content already stored");
        } else {
            // Content address only ever holds a complete file.
            let tmp = dir.join(format!("{content_hash}.part"));
            tokio::fs::write(&tmp, bytes).await?;
            tokio::fs::rename(&tmp, &path).await?;
        }

        let stored = StoredAttachment {
            id: Uuid::new_v4(),
            case_id,
            file_name,
            content_hash,
            size_bytes: bytes.len() as u64,
            stored_at: Utc::now(),
        };
        tracing::info!(%case_id, attachment_id = %stored.id, size = stored.size_bytes, "Attachment stored");
        Ok(stored)
    }

    /// Read back stored content by its hash.
    pub async fn read(&self, case_id: Uuid, content_hash: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(case_id, content_hash)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(content_hash.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, case_id: Uuid, content_hash: &str) -> Result<PathBuf, StorageError> {
        if content_hash.len() != 64 || !content_hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StorageError::NotFound(content_hash.to_string()));
        }
        Ok(self.root.join(case_id.to_string()).join(content_hash))
    }
}

/// Lowercase hex SHA-256.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// File names are kept only as display labels; anything path-like is refused.
fn validate_file_name(raw: &str) -> Result<String, StorageError> {
    let name = raw.trim();
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.len() > 255;
    if bad {
        return Err(StorageError::InvalidFileName(raw.to_string()));
    }
    Ok(name.to_string())
}
