//! Local-first persistence
//!
//! Everything lives in a string key-value store (LocalStorage in the browser,
//! an in-memory map elsewhere) under `bioquest_v1:`-prefixed keys:
//! - `class:<CODE>:settings` class configuration
//! - `class:<CODE>:results` student id -> append-only result list
//! - `class:<CODE>:unlocked:<student>` unlocked level ids
//!
//! Stored JSON is never trusted: `null`, garbage and wrong shapes read back as
//! empty/default values.

pub mod class_store;
#[cfg(target_arch = "wasm32")]
pub mod local;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rand::Rng;
use serde::de::DeserializeOwned;

use crate::error::PersistenceError;

pub use class_store::{ClassStore, LevelUnlocks};
#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

/// Key namespace shared with the level select page and teacher panel
pub const KEY_PREFIX: &str = "bioquest_v1";

/// Build a namespaced storage key
pub fn storage_key(parts: &[&str]) -> String {
    std::iter::once(KEY_PREFIX)
        .chain(parts.iter().copied())
        .collect::<Vec<_>>()
        .join(":")
}

/// String key-value storage
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove_item(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Parse stored JSON, falling back on missing, corrupt or `null` data
pub fn safe_parse<T: DeserializeOwned>(raw: Option<&str>) -> Option<T> {
    let value: serde_json::Value = serde_json::from_str(raw?).ok()?;
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
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

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Class code alphabet (no 0/O, 1/I)
const CLASS_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Class code length
pub const CLASS_CODE_LEN: usize = 6;

/// Generate a fresh class code
pub fn random_class_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CLASS_CODE_LEN)
        .map(|_| CLASS_CODE_CHARS[rng.random_range(0..CLASS_CODE_CHARS.len())] as char)
        .collect()
}
