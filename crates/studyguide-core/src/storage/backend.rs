use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use super::StorageError;

/// File extension of every file a `FileBackend` owns
const FILE_EXTENSION: &str = "json";

/// Extension of in-progress writes
const TMP_EXTENSION: &str = "json.tmp";

/// Raw string storage. Implementations report every failure; the lenient
/// policy lives in `KeyValueStore`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn write(&self, key: &str, value: String) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

// ============================================================================
// Memory backend
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries().clear();
        Ok(())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// Stores each key as `<dir>/<sanitized key>.json`.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::io("<root>", e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a key to a file name. Anything outside `[A-Za-z0-9_-]` becomes
    /// `_`, so `@cache_exams` is stored as `_cache_exams.json`.
    fn file_name(key: &str) -> String {
        let stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}.{}", stem, FILE_EXTENSION)
    }

    /// Value files and leftovers of interrupted writes
    fn is_store_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| {
                name.ends_with(&format!(".{}", FILE_EXTENSION))
                    || name.ends_with(&format!(".{}", TMP_EXTENSION))
            })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(Self::file_name(key))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key);
        // Write to a sibling temp file and rename so readers never see a torn file
        let tmp = path.with_extension(TMP_EXTENSION);
        let written = match tokio::fs::write(&tmp, value).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::io(key, e));
        }
        debug!(key, path = %path.display(), "Wrote storage file");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StorageError::io("<root>", e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io("<root>", e))?
        {
            let path = entry.path();
            if Self::is_store_file(&path) {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| StorageError::io("<root>", e))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_sanitizes_key() {
        assert_eq!(FileBackend::file_name("@cache_exams"), "_cache_exams.json");
        assert_eq!(FileBackend::file_name("../etc/passwd"), "___etc_passwd.json");
        assert_eq!(FileBackend::file_name("plain-key_1"), "plain-key_1.json");
    }

    #[test]
    fn test_is_store_file() {
        assert!(FileBackend::is_store_file(Path::new("/d/_app_bookmarks.json")));
        assert!(FileBackend::is_store_file(Path::new("/d/_app_bookmarks.json.tmp")));
        assert!(!FileBackend::is_store_file(Path::new("/d/notes.txt")));
        assert!(!FileBackend::is_store_file(Path::new("/d/backup.tmp")));
    }

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert!(backend.read("k").await.unwrap().is_none());
        backend.write("k", "1".to_string()).await.unwrap();
        assert_eq!(backend.read("k").await.unwrap().as_deref(), Some("1"));
        backend.delete("k").await.unwrap();
        assert!(backend.read("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_backend_clear() {
        let backend = MemoryBackend::new();
        backend.write("a", "1".to_string()).await.unwrap();
        backend.write("b", "2".to_string()).await.unwrap();
        backend.clear().await.unwrap();
        assert!(backend.read("a").await.unwrap().is_none());
        assert!(backend.read("b").await.unwrap().is_none());
    }
}
