//! Browser LocalStorage backend

use crate::error::PersistenceError;

use super::KeyValueStore;

/// `window.localStorage`
#[derive(Debug, Clone)]
pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    /// Open LocalStorage, if the browser allows it
    pub fn open() -> Result<Self, PersistenceError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(PersistenceError::Unavailable)?;
        Ok(Self { storage })
    }
}

fn js_err(err: wasm_bindgen::JsValue) -> PersistenceError {
    PersistenceError::Storage(format!("{:?}", err))
}

impl KeyValueStore for LocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.storage.get_item(key).map_err(js_err)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.storage.set_item(key, value).map_err(js_err)
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError> {
        self.storage.remove_item(key).map_err(js_err)
    }
}
