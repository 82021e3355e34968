//! Directory-backed store.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::{ConversationStore, StoreError};

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary sibling file first and are renamed into place,
/// so a reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Stored keys, sorted.
    pub async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if !is_safe_key(key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Keys become file names: reject anything that could escape the directory.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 128
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ConversationId, History};
    use crate::store::{load_history, save_history};

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("chats")).await.unwrap();

        assert!(store.get("abc").await.unwrap().is_none());

        store.set("abc", "[]").await.unwrap();
        assert_eq!(store.get("abc").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(store.keys().await.unwrap(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        for key in ["../escape", "a/b", "", ".hidden"] {
            let err = store.set(key, "[]").await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "key {key:?}");
        }
    }

    #[tokio::test]
    async fn test_corrupted_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("bad.json"), "]]]").unwrap();

        let history = load_history(&store, &ConversationId::new("bad")).await;
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = ConversationId::generate();
        let history = History::new().with_exchange("q", "a");

        {
            let store = FileStore::open(dir.path()).await.unwrap();
            save_history(&store, &id, &history).await.unwrap();
        }

        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(load_history(&store, &id).await, history);
    }
}
