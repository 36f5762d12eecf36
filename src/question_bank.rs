//! Question bank loaders
//!
//! Banks live at `<root>/questions_<levelId>.json`. Native builds read them
//! from disk; the browser fetches them with caching disabled.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::LoadError;
use crate::level::Level;

/// Source of validated levels
pub trait QuestionBank {
    fn load_level(&self, level_id: &str) -> Result<Level, LoadError>;
}

/// Relative path of a level's question bank
pub fn bank_file_name(level_id: &str) -> String {
    format!("questions_{}.json", level_id)
}

/// Reads question banks from a data directory
#[derive(Debug, Clone)]
pub struct FsQuestionBank {
    root: PathBuf,
}

impl FsQuestionBank {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl QuestionBank for FsQuestionBank {
    fn load_level(&self, level_id: &str) -> Result<Level, LoadError> {
        let path = self.root.join(bank_file_name(level_id));
        let json = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Level::from_json(level_id, &json)
    }
}

/// Question banks held as raw JSON, keyed by level id
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionBank {
    banks: BTreeMap<String, String>,
}

impl InMemoryQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level_id: &str, json: impl Into<String>) -> Self {
        self.banks.insert(level_id.to_string(), json.into());
        self
    }
}

impl QuestionBank for InMemoryQuestionBank {
    fn load_level(&self, level_id: &str) -> Result<Level, LoadError> {
        let json = self.banks.get(level_id).ok_or_else(|| LoadError::Status {
            path: bank_file_name(level_id),
            status: 404,
        })?;
        Level::from_json(level_id, json)
    }
}

/// Fetch a question bank relative to the page (WASM only)
#[cfg(target_arch = "wasm32")]
pub async fn fetch_level(base_url: &str, level_id: &str) -> Result<Level, LoadError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestCache, RequestInit, Response};

    let path = format!("{}/{}", base_url.trim_end_matches('/'), bank_file_name(level_id));
    let network = |err: wasm_bindgen::JsValue| LoadError::Network {
        path: path.clone(),
        message: format!("{:?}", err),
    };

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_cache(RequestCache::NoStore);
    let request = Request::new_with_str_and_init(&path, &opts).map_err(network)?;

    let window = web_sys::window().ok_or_else(|| LoadError::Network {
        path: path.clone(),
        message: "no window".into(),
    })?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(network)?
        .dyn_into()
        .map_err(network)?;

    if !response.ok() {
        return Err(LoadError::Status {
            path,
            status: response.status(),
        });
    }

    let text = JsFuture::from(response.text().map_err(network)?)
        .await
        .map_err(network)?;
    let json = text.as_string().unwrap_or_default();
    Level::from_json(level_id, &json)
}
