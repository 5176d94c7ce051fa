use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

pub const BEST_SCORE_KEY: &str = "best_score";
pub const BEST_WORD_KEY: &str = "best_word";

/// Small persisted key/value state owned by the application shell
/// (high scores, tutorial flags). The game engine never reads it.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

/// A JSON object on disk, read once and written back on `save`
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open a store, starting empty if the file does not exist yet
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("{} is not a valid state file", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e).context("Failed to read state file"),
        };
        Ok(Self { path, values })
    }

    pub async fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

/// Remember a word's points if they beat the stored best. Returns true on a new record.
pub fn record_best(store: &mut dyn KeyValueStore, word: &str, points: u32) -> bool {
    let best = store
        .get(BEST_SCORE_KEY)
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0);
    if points <= best {
        return false;
    }
    store.set(BEST_SCORE_KEY, points.to_string());
    store.set(BEST_WORD_KEY, word.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_best_only_improves() {
        let mut store = MemoryStore::default();
        assert!(record_best(&mut store, "CAT", 3));
        assert!(!record_best(&mut store, "DOG", 3));
        assert!(record_best(&mut store, "BYWAYS", 15));
        assert_eq!(store.get(BEST_SCORE_KEY).as_deref(), Some("15"));
        assert_eq!(store.get(BEST_WORD_KEY).as_deref(), Some("BYWAYS"));
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!("spore-words-{}.json", std::process::id()));
        let mut store = FileStore::open(&path).await.unwrap();
        assert!(store.get(BEST_SCORE_KEY).is_none());
        store.set(BEST_SCORE_KEY, "42".to_string());
        store.save().await.unwrap();

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(BEST_SCORE_KEY).as_deref(), Some("42"));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
