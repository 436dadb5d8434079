//! Durable best scores keyed by game.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cogex_core::{BestScore, GameKey};

use crate::error::StoreError;

pub trait BestScoreStore: Send + Sync {
    fn read(&self, key: GameKey) -> Result<Option<BestScore>, StoreError>;

    fn write(&self, key: GameKey, score: &BestScore) -> Result<(), StoreError>;

    /// Stores `candidate` if it strictly improves on the current value under
    /// the game's rule. Returns whether it was stored.
    fn compare_and_set(&self, key: GameKey, candidate: &BestScore) -> Result<bool, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    scores: Mutex<HashMap<GameKey, BestScore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BestScoreStore for MemoryStore {
    fn read(&self, key: GameKey) -> Result<Option<BestScore>, StoreError> {
        let scores = self.scores.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(scores.get(&key).copied())
    }

    fn write(&self, key: GameKey, score: &BestScore) -> Result<(), StoreError> {
        let mut scores = self.scores.lock().map_err(|_| StoreError::Poisoned)?;
        scores.insert(key, *score);
        Ok(())
    }

    fn compare_and_set(&self, key: GameKey, candidate: &BestScore) -> Result<bool, StoreError> {
        let mut scores = self.scores.lock().map_err(|_| StoreError::Poisoned)?;
        if !key.best_rule().improves(candidate, scores.get(&key)) {
            return Ok(false);
        }
        scores.insert(key, *candidate);
        Ok(true)
    }
}

/// One JSON object mapping storage keys to scores. Writes go to a sibling
/// temp file that is renamed into place.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    scores: Mutex<BTreeMap<String, BestScore>>,
}

impl JsonFileStore {
    /// Opens the store, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let scores = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), entries = scores.len(), "best-score store opened");
        Ok(Self {
            path,
            scores: Mutex::new(scores),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, scores: &BTreeMap<String, BestScore>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            serde_json::to_writer_pretty(&mut file, scores)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl BestScoreStore for JsonFileStore {
    fn read(&self, key: GameKey) -> Result<Option<BestScore>, StoreError> {
        let scores = self.scores.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(scores.get(key.storage_key()).copied())
    }

    fn write(&self, key: GameKey, score: &BestScore) -> Result<(), StoreError> {
        let mut scores = self.scores.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = scores.clone();
        next.insert(key.storage_key().to_string(), *score);
        self.persist(&next)?;
        *scores = next;
        Ok(())
    }

    fn compare_and_set(&self, key: GameKey, candidate: &BestScore) -> Result<bool, StoreError> {
        let mut scores = self.scores.lock().map_err(|_| StoreError::Poisoned)?;
        if !key
            .best_rule()
            .improves(candidate, scores.get(key.storage_key()))
        {
            return Ok(false);
        }
        let mut next = scores.clone();
        next.insert(key.storage_key().to_string(), *candidate);
        self.persist(&next)?;
        *scores = next;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_only_keeps_improvements() {
        let store = MemoryStore::new();
        let key = GameKey::Reaction;
        assert!(store.compare_and_set(key, &BestScore::Latency { ms: 320 }).unwrap());
        assert!(!store.compare_and_set(key, &BestScore::Latency { ms: 320 }).unwrap());
        assert!(!store.compare_and_set(key, &BestScore::Latency { ms: 400 }).unwrap());
        assert!(store.compare_and_set(key, &BestScore::Latency { ms: 280 }).unwrap());
        assert_eq!(store.read(key).unwrap(), Some(BestScore::Latency { ms: 280 }));
        assert_eq!(store.read(GameKey::Simon).unwrap(), None);
    }

    #[test]
    fn json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("best.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            assert!(store
                .compare_and_set(GameKey::Simon, &BestScore::Level { level: 6 })
                .unwrap());
            store
                .write(GameKey::GoNoGo, &BestScore::Accuracy { pct: 83 })
                .unwrap();
        }
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.read(GameKey::Simon).unwrap(),
            Some(BestScore::Level { level: 6 })
        );
        assert_eq!(
            reopened.read(GameKey::GoNoGo).unwrap(),
            Some(BestScore::Accuracy { pct: 83 })
        );
        assert!(!path.with_extension("json.tmp").exists());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["cogex:simon:best_level"]["level"], 6);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Json(_))));
    }
}
