//! Key/value persistence backends
//!
//! The browser build talks to `window.localStorage`. Native builds and tests use
//! [`MemoryStorage`], which lives as long as the process.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::StorageError;

/// String key/value store with LocalStorage semantics
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// `window.localStorage` (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// Fails when storage is disabled (private mode, sandboxed iframe, ...)
    pub fn open() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is null".to_string()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }
}
