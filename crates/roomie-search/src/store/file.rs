//! File-backed cache store: one JSON document per key.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use roomie_core::error::{AppError, ErrorKind};
use roomie_core::result::AppResult;
use roomie_core::traits::CacheStore;

/// Persists each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create cache directory: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::validation(format!("Invalid store key: '{key}'")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.resolve(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read {}", path.display()),
                e,
            )),
        }
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write {}", tmp.display()),
                e,
            )
        })?;
        fs::rename(&tmp, &path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to replace {}", path.display()),
                e,
            )
        })?;

        debug!(key, bytes = value.len(), "Persisted cache document");
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete {}", path.display()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested")).await.unwrap();

        assert_eq!(store.get("searchCache").await.unwrap(), None);
        store.set("searchCache", "{\"a\":1}").await.unwrap();
        assert_eq!(
            store.get("searchCache").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        store.delete("searchCache").await.unwrap();
        store.delete("searchCache").await.unwrap();
        assert_eq!(store.get("searchCache").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        let err = store.set("../escape", "x").await.unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        store.set_json("searchCacheTimestamps", &vec![1_i64, 2]).await.unwrap();
        let back: Option<Vec<i64>> = store.get_json("searchCacheTimestamps").await.unwrap();
        assert_eq!(back, Some(vec![1, 2]));
    }
}
