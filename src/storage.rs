//! On-disk storage for uploaded ingredient images.
//!
//! Files are content-addressed per user:
//! ```text
//! <DATA_DIR>/
//!   uploads/
//!     <user_id>/
//!       <sha256>.jpg
//! ```

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Image types accepted for upload, with the extension each is stored under.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

/// Errors that can occur while storing an upload.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Payload is not valid base64.
    InvalidEncoding(String),
    /// MIME type outside the allow-list.
    UnsupportedType(String),
    /// Decoded payload exceeds the configured limit.
    TooLarge { size: usize, limit: usize },
    /// Decoded payload is empty.
    Empty,
    /// Invalid user ID (e.g., contains path separators).
    InvalidUserId(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::InvalidEncoding(e) => write!(f, "Invalid base64 image data: {}", e),
            StorageError::UnsupportedType(t) => write!(
                f,
                "Unsupported image type '{}'. Allowed: image/jpeg, image/png, image/webp",
                t
            ),
            StorageError::TooLarge { size, limit } => {
                write!(f, "Image is {} bytes, limit is {} bytes", size, limit)
            }
            StorageError::Empty => write!(f, "Image data is empty"),
            StorageError::InvalidUserId(id) => write!(f, "Invalid user ID: {}", id),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            _ => None,
        }
    }
}

impl StorageError {
    /// Whether the caller sent something unacceptable, as opposed to a server fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, StorageError::IoError(..))
    }
}

/// A stored image.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub path: PathBuf,
    /// Path relative to the uploads directory, e.g. `<user_id>/<hash>.png`
    pub key: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(data_dir: impl AsRef<Path>, max_bytes: usize) -> Self {
        Self {
            root: data_dir.as_ref().join("uploads"),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validates a user ID to prevent path traversal attacks.
    fn validate_user_id(user_id: &str) -> Result<(), StorageError> {
        if user_id.is_empty()
            || user_id.contains('/')
            || user_id.contains('\\')
            || user_id.contains("..")
            || user_id.starts_with('.')
        {
            return Err(StorageError::InvalidUserId(user_id.to_string()));
        }
        Ok(())
    }

    /// Maps an allowed MIME type to its file extension.
    pub fn extension_for(mime_type: &str) -> Result<&'static str, StorageError> {
        let normalized = mime_type.trim().to_lowercase();
        let normalized = if normalized == "image/jpg" {
            "image/jpeg".to_string()
        } else {
            normalized
        };
        ALLOWED_TYPES
            .iter()
            .find(|(mime, _)| *mime == normalized)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| StorageError::UnsupportedType(mime_type.to_string()))
    }

    /// Decodes base64 image data, accepting an optional `data:<mime>;base64,` prefix.
    pub fn decode(&self, data: &str) -> Result<Vec<u8>, StorageError> {
        let payload = match data.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => data,
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| StorageError::InvalidEncoding(e.to_string()))?;
        self.check_size(bytes.len())?;
        Ok(bytes)
    }

    fn check_size(&self, size: usize) -> Result<(), StorageError> {
        if size == 0 {
            return Err(StorageError::Empty);
        }
        if size > self.max_bytes {
            return Err(StorageError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Writes an image under the user's directory, named by its SHA-256.
    ///
    /// Saving identical bytes twice yields the same path.
    pub fn save(
        &self,
        user_id: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredImage, StorageError> {
        Self::validate_user_id(user_id)?;
        let ext = Self::extension_for(mime_type)?;
        self.check_size(bytes.len())?;

        let digest = Sha256::digest(bytes);
        let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        let user_dir = self.root.join(user_id);
        fs::create_dir_all(&user_dir).map_err(|e| StorageError::IoError(user_dir.clone(), e))?;

        let file_name = format!("{}.{}", hash, ext);
        let path = user_dir.join(&file_name);

        // Write atomically using temp file + rename
        let temp_path = path.with_extension(format!("{}.tmp", ext));
        fs::write(&temp_path, bytes).map_err(|e| StorageError::IoError(temp_path.clone(), e))?;
        fs::rename(&temp_path, &path).map_err(|e| StorageError::IoError(path.clone(), e))?;

        tracing::debug!(user_id, path = %path.display(), "stored upload");

        Ok(StoredImage {
            path,
            key: format!("{}/{}", user_id, file_name),
            mime_type: mime_type.to_string(),
            size: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(max_bytes: usize) -> (ImageStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new(temp_dir.path(), max_bytes);
        (store, temp_dir)
    }

    #[test]
    fn test_validate_user_id() {
        assert!(ImageStore::validate_user_id("3f2a9c1e-0000-4000-8000-000000000000").is_ok());
        assert!(ImageStore::validate_user_id("").is_err());
        assert!(ImageStore::validate_user_id("../etc").is_err());
        assert!(ImageStore::validate_user_id("a/b").is_err());
        assert!(ImageStore::validate_user_id("a\\b").is_err());
        assert!(ImageStore::validate_user_id(".hidden").is_err());
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(ImageStore::extension_for("image/jpeg").unwrap(), "jpg");
        assert_eq!(ImageStore::extension_for("image/JPG").unwrap(), "jpg");
        assert_eq!(ImageStore::extension_for("image/png").unwrap(), "png");
        assert_eq!(ImageStore::extension_for("image/webp").unwrap(), "webp");
        assert!(matches!(
            ImageStore::extension_for("image/gif"),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_save_is_content_addressed() {
        let (store, temp_dir) = setup(1024);

        let first = store.save("user1", "image/png", b"fake png").unwrap();
        let second = store.save("user1", "image/png", b"fake png").unwrap();
        assert_eq!(first.path, second.path);
        assert!(first.path.starts_with(temp_dir.path().join("uploads").join("user1")));
        assert!(first.key.starts_with("user1/"));
        assert!(first.key.ends_with(".png"));
        // sha256 hex + ".png"
        assert_eq!(first.path.file_name().unwrap().len(), 64 + 4);
        assert_eq!(std::fs::read(&first.path).unwrap(), b"fake png");
    }

    #[test]
    fn test_size_limit() {
        let (store, _temp_dir) = setup(4);
        let err = store.save("user1", "image/jpeg", b"too big").unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { size: 7, limit: 4 }));
        assert!(err.is_client_error());

        assert!(matches!(
            store.save("user1", "image/jpeg", b""),
            Err(StorageError::Empty)
        ));
    }

    #[test]
    fn test_decode_data_url_then_save() {
        let (store, _temp_dir) = setup(1024);
        let data = format!("data:image/webp;base64,{}", STANDARD.encode(b"webp bytes"));

        let bytes = store.decode(&data).unwrap();
        let stored = store.save("user1", "image/webp", &bytes).unwrap();
        assert_eq!(stored.size, 10);
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"webp bytes");
    }

    #[test]
    fn test_invalid_base64() {
        let (store, _temp_dir) = setup(1024);
        let err = store.decode("not base64!!").unwrap_err();
        assert!(matches!(err, StorageError::InvalidEncoding(_)));
    }

    #[test]
    fn test_users_are_isolated() {
        let (store, _temp_dir) = setup(1024);
        let a = store.save("alice", "image/png", b"same").unwrap();
        let b = store.save("bob", "image/png", b"same").unwrap();
        assert_ne!(a.path, b.path);
    }
}
