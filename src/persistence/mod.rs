//! Persisted score with integrity verification
//!
//! Features:
//! - One token under a fixed key, never raw JSON
//! - Corrupted, foreign or hand-edited values read back as absent
//! - Storage failures are logged and swallowed

use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::error::LoadError;
use crate::platform::KeyValueStore;

/// Default storage key
pub const DEFAULT_STORAGE_KEY: &str = "score_state";

/// What gets persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u64,
}

/// Token-backed store for the single score record
#[derive(Debug, Clone)]
pub struct ScoreStore<S> {
    storage: S,
    codec: Codec,
    key: String,
}

impl<S: KeyValueStore> ScoreStore<S> {
    pub fn new(storage: S, codec: Codec) -> Self {
        Self::with_key(storage, codec, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: S, codec: Codec, key: impl Into<String>) -> Self {
        Self {
            storage,
            codec,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Overwrite the persisted record. Best effort.
    pub fn save(&self, score: u64) {
        let token = match self.codec.encode(&ScoreRecord { score }) {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Score not saved: {}", e);
                return;
            }
        };
        match self.storage.set_item(&self.key, &token.to_string()) {
            Ok(()) => log::debug!("Score saved ({})", score),
            Err(e) => log::warn!("Score not saved: {}", e),
        }
    }

    /// Read the persisted record; any failure reads as `None`
    pub fn load(&self) -> Option<ScoreRecord> {
        match self.try_load() {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Ignoring persisted score: {}", e);
                None
            }
        }
    }

    /// Like [`load`](Self::load) but says why a present entry was ignored
    pub fn try_load(&self) -> Result<Option<ScoreRecord>, LoadError> {
        let Some(raw) = self.storage.get_item(&self.key)? else {
            return Ok(None);
        };
        let value: serde_json::Value = self.codec.try_decode(&raw)?;
        let score = value
            .get("score")
            .and_then(serde_json::Value::as_u64)
            .ok_or(LoadError::MissingField)?;
        Ok(Some(ScoreRecord { score }))
    }

    /// Remove the persisted record (new game, reset)
    pub fn clear(&self) {
        match self.storage.remove_item(&self.key) {
            Ok(()) => log::info!("Persisted score cleared"),
            Err(e) => log::warn!("Persisted score not cleared: {}", e),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{CodecError, StorageError};
    use crate::platform::MemoryStorage;

    /// Storage whose every call fails
    #[derive(Debug, Clone, Copy, Default)]
    pub(crate) struct BrokenStorage;

    impl KeyValueStore for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }
    }

    fn store() -> ScoreStore<MemoryStorage> {
        ScoreStore::new(MemoryStorage::new(), Codec::default())
    }

    #[test]
    fn test_save_then_load() {
        let store = store();
        store.save(120);
        assert_eq!(store.load(), Some(ScoreRecord { score: 120 }));
    }

    #[test]
    fn test_save_overwrites() {
        let store = store();
        store.save(1);
        store.save(2);
        assert_eq!(store.load(), Some(ScoreRecord { score: 2 }));
        assert_eq!(store.storage().len(), 1);
    }

    #[test]
    fn test_stored_value_is_a_token() {
        let store = store();
        store.save(9);
        let raw = store.storage().get_item(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        assert!(!raw.contains("score"));
        assert_eq!(raw.matches('.').count(), 1);
    }

    #[test]
    fn test_load_absent() {
        assert_eq!(store().load(), None);
        assert_eq!(store().try_load(), Ok(None));
    }

    #[test]
    fn test_plain_json_is_ignored() {
        let store = store();
        store
            .storage()
            .set_item(DEFAULT_STORAGE_KEY, r#"{"score":999999}"#)
            .unwrap();
        assert_eq!(store.load(), None);
        assert_eq!(store.try_load(), Err(LoadError::Codec(CodecError::MalformedToken)));
    }

    #[test]
    fn test_hand_edited_token_is_ignored() {
        let store = store();
        store.save(10);
        let raw = store.storage().get_item(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let edited = format!("A{}", &raw[1..]);
        assert_ne!(edited, raw);
        store.storage().set_item(DEFAULT_STORAGE_KEY, &edited).unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_missing_score_field() {
        let store = store();
        let codec = Codec::default();
        for value in [
            serde_json::json!({ "points": 5 }),
            serde_json::json!({ "score": "5" }),
            serde_json::json!({ "score": -5 }),
            serde_json::json!([5]),
        ] {
            let token = codec.encode(&value).unwrap();
            store
                .storage()
                .set_item(DEFAULT_STORAGE_KEY, &token.to_string())
                .unwrap();
            assert_eq!(store.try_load(), Err(LoadError::MissingField), "{value}");
            assert_eq!(store.load(), None);
        }
    }

    #[test]
    fn test_custom_key() {
        let storage = MemoryStorage::new();
        let store = ScoreStore::with_key(storage.clone(), Codec::default(), "lesson_3");
        store.save(4);
        assert!(storage.get_item("lesson_3").unwrap().is_some());
        assert!(storage.get_item(DEFAULT_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let store = store();
        store.save(4);
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_broken_storage_degrades_to_absent() {
        let store = ScoreStore::new(BrokenStorage, Codec::default());
        store.save(3);
        store.clear();
        assert_eq!(store.load(), None);
        assert!(matches!(store.try_load(), Err(LoadError::Storage(_))));
    }
}
