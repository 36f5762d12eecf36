//! Per-class records: settings, result logs, unlocked levels

use serde_json::{Map, Value};

use crate::error::{PersistenceError, UnlockError};
use crate::progression::{UnlockHook, is_known_level};
use crate::results::{AttemptResult, ClassResults, ResultsStore};
use crate::settings::ClassSettings;

use super::{KeyValueStore, safe_parse, storage_key};

fn settings_key(class_code: &str) -> String {
    storage_key(&["class", class_code, "settings"])
}

fn results_key(class_code: &str) -> String {
    storage_key(&["class", class_code, "results"])
}

fn unlocked_key(class_code: &str, student_id: &str) -> String {
    storage_key(&["class", class_code, "unlocked", student_id])
}

/// Class settings and result logs on top of a key-value store
#[derive(Debug, Clone)]
pub struct ClassStore<S> {
    storage: S,
}

impl<S: KeyValueStore> ClassStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load class settings, merged over defaults.
    ///
    /// Readable fields of the stored object win over the defaults. A stored
    /// record that is not an object is replaced by the defaults.
    pub fn load_class_settings(&self, class_code: &str) -> ClassSettings {
        let fallback = ClassSettings::for_class(class_code);
        let key = settings_key(class_code);

        let raw = match self.storage.get_item(&key) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Reading class settings failed: {}", e);
                return fallback;
            }
        };

        let Some(value) = safe_parse::<Value>(raw.as_deref()) else {
            return fallback;
        };
        if let Value::Object(stored) = value {
            let mut settings = fallback;
            settings.merge_stored(&stored);
            log::info!("Loaded settings for class {}", class_code);
            return settings;
        }

        log::warn!("Class settings for {} are not an object, resetting", class_code);
        if let Err(e) = self.save_class_settings(&fallback) {
            log::warn!("Resetting class settings failed: {}", e);
        }
        fallback
    }

    /// Save class settings under their own class code
    pub fn save_class_settings(&self, settings: &ClassSettings) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(settings)?;
        self.storage
            .set_item(&settings_key(&settings.class_code), &json)?;
        log::info!("Settings saved for class {}", settings.class_code);
        Ok(())
    }

    /// Append a result to the student's log
    pub fn append_result(
        &self,
        class_code: &str,
        student_id: &str,
        result: &AttemptResult,
    ) -> Result<(), PersistenceError> {
        let key = results_key(class_code);
        let raw = self.storage.get_item(&key)?;
        let mut all: Map<String, Value> = safe_parse(raw.as_deref()).unwrap_or_default();

        let bucket = all
            .entry(student_id.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !bucket.is_array() {
            *bucket = Value::Array(Vec::new());
        }
        if let Value::Array(entries) = bucket {
            entries.push(serde_json::to_value(result)?);
        }

        self.storage
            .set_item(&key, &serde_json::to_string(&all)?)?;
        Ok(())
    }

    /// Every result of the class. Malformed entries are skipped.
    pub fn read_all_results(&self, class_code: &str) -> ClassResults {
        let raw = match self.storage.get_item(&results_key(class_code)) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Reading results failed: {}", e);
                return ClassResults::new();
            }
        };
        let all: Map<String, Value> = safe_parse(raw.as_deref()).unwrap_or_default();

        all.into_iter()
            .map(|(student_id, entries)| {
                let results = match entries {
                    Value::Array(entries) => entries
                        .into_iter()
                        .filter_map(|entry| serde_json::from_value(entry).ok())
                        .collect(),
                    _ => Vec::new(),
                };
                (student_id, results)
            })
            .collect()
    }

    /// Forget every result of the class
    pub fn clear_results(&self, class_code: &str) -> Result<(), PersistenceError> {
        self.storage.remove_item(&results_key(class_code))?;
        log::info!("Cleared results for class {}", class_code);
        Ok(())
    }
}

impl<S: KeyValueStore> ResultsStore for ClassStore<S> {
    fn write_result(
        &mut self,
        class_code: &str,
        student_id: &str,
        result: &AttemptResult,
    ) -> Result<(), PersistenceError> {
        self.append_result(class_code, student_id, result)?;
        log::info!(
            "Result saved for {} in {} ({} attempt {})",
            student_id,
            class_code,
            result.level_id,
            result.attempt
        );
        Ok(())
    }
}

/// Levels a student has unlocked, persisted for the level select screen
#[derive(Debug, Clone)]
pub struct LevelUnlocks<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStore> LevelUnlocks<S> {
    pub fn new(storage: S, class_code: &str, student_id: &str) -> Self {
        Self {
            storage,
            key: unlocked_key(class_code, student_id),
        }
    }

    /// Unlocked level ids in unlock order
    pub fn unlocked(&self) -> Vec<String> {
        match self.storage.get_item(&self.key) {
            Ok(raw) => safe_parse(raw.as_deref()).unwrap_or_default(),
            Err(e) => {
                log::warn!("Reading unlocks failed: {}", e);
                Vec::new()
            }
        }
    }

    pub fn is_unlocked(&self, level_id: &str) -> bool {
        self.unlocked().iter().any(|id| id == level_id)
    }
}

impl<S: KeyValueStore> UnlockHook for LevelUnlocks<S> {
    fn unlock_level(&mut self, level_id: &str) -> Result<(), UnlockError> {
        if !is_known_level(level_id) {
            return Err(UnlockError::UnknownLevel(level_id.to_string()));
        }
        let mut levels = self.unlocked();
        if levels.iter().any(|id| id == level_id) {
            return Ok(());
        }
        levels.push(level_id.to_string());
        let json = serde_json::to_string(&levels).map_err(PersistenceError::from)?;
        self.storage.set_item(&self.key, &json)?;
        log::info!("Unlocked level {}", level_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::results::EndReason;

    fn result(level_id: &str, accuracy: u32) -> AttemptResult {
        AttemptResult {
            level_id: level_id.into(),
            completed: true,
            reason: EndReason::Completed,
            score: 100,
            answered: 3,
            correct: 2,
            accuracy,
            lives_remaining: Some(3),
            attempt: 1,
            duration_ms: 1000,
            at_iso: "2026-03-01T10:00:00.000Z".into(),
            mastery_met: accuracy >= 70,
            required_questions: 3,
        }
    }

    #[test]
    fn test_append_and_read_results() {
        let storage = MemoryStore::new();
        let mut store = ClassStore::new(storage.clone());

        store.write_result("ABC123", "sam", &result("world1-1", 67)).unwrap();
        store.write_result("ABC123", "sam", &result("world1-2", 100)).unwrap();
        store.write_result("ABC123", "ada", &result("world1-1", 33)).unwrap();

        let all = store.read_all_results("ABC123");
        assert_eq!(all.len(), 2);
        assert_eq!(all["sam"].len(), 2);
        assert_eq!(all["sam"][1].level_id, "world1-2");
        assert_eq!(all["ada"][0].accuracy, 33);

        // Layout: object of arrays under the class results key
        let raw = storage
            .get_item("bioquest_v1:class:ABC123:results")
            .unwrap()
            .unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert!(value["sam"].is_array());
        assert_eq!(value["sam"][0]["atISO"], "2026-03-01T10:00:00.000Z");
    }

    #[test]
    fn test_corrupt_results_recovered() {
        let storage = MemoryStore::new();
        let store = ClassStore::new(storage.clone());

        storage.set_item("bioquest_v1:class:ABC123:results", "null").unwrap();
        assert!(store.read_all_results("ABC123").is_empty());
        store.append_result("ABC123", "sam", &result("world1-1", 50)).unwrap();
        assert_eq!(store.read_all_results("ABC123")["sam"].len(), 1);

        // A student bucket that is not an array is replaced
        storage
            .set_item("bioquest_v1:class:ABC123:results", r#"{"sam": 5, "ada": []}"#)
            .unwrap();
        store.append_result("ABC123", "sam", &result("world1-1", 50)).unwrap();
        let all = store.read_all_results("ABC123");
        assert_eq!(all["sam"].len(), 1);
        assert!(all["ada"].is_empty());
    }

    #[test]
    fn test_clear_results() {
        let store = ClassStore::new(MemoryStore::new());
        store.append_result("ABC123", "sam", &result("world1-1", 50)).unwrap();
        store.clear_results("ABC123").unwrap();
        assert!(store.read_all_results("ABC123").is_empty());
    }

    #[test]
    fn test_class_settings_defaults_and_merge() {
        let storage = MemoryStore::new();
        let store = ClassStore::new(storage.clone());

        let settings = store.load_class_settings("ABC123");
        assert_eq!(settings, ClassSettings::for_class("ABC123"));
        assert!(storage.is_empty(), "defaults are not written on a plain miss");

        storage
            .set_item(
                "bioquest_v1:class:ABC123:settings",
                r#"{"classCode": "ABC123", "masteryAccuracy": 80}"#,
            )
            .unwrap();
        let settings = store.load_class_settings("ABC123");
        assert_eq!(settings.mastery_accuracy, 80);
        assert_eq!(settings.attempts_allowed, 3);
    }

    #[test]
    fn test_class_settings_with_fractional_mastery_kept() {
        let storage = MemoryStore::new();
        let store = ClassStore::new(storage.clone());
        let stored = r#"{"classCode": "ABC123", "masteryAccuracy": 72.5, "attemptsAllowed": 5, "infiniteLives": true, "worldEnabled": {"world1": true}}"#;
        storage
            .set_item("bioquest_v1:class:ABC123:settings", stored)
            .unwrap();

        let settings = store.load_class_settings("ABC123");
        assert_eq!(settings.mastery_accuracy, 73);
        assert_eq!(settings.attempts_allowed, 5);
        assert!(settings.infinite_lives);

        // The teacher's record is left as it was
        let raw = storage
            .get_item("bioquest_v1:class:ABC123:settings")
            .unwrap()
            .unwrap();
        assert_eq!(raw, stored);
    }

    #[test]
    fn test_corrupt_class_settings_reset() {
        let storage = MemoryStore::new();
        let store = ClassStore::new(storage.clone());

        storage
            .set_item("bioquest_v1:class:ABC123:settings", "[1, 2, 3]")
            .unwrap();
        let settings = store.load_class_settings("ABC123");
        assert_eq!(settings, ClassSettings::for_class("ABC123"));

        let raw = storage
            .get_item("bioquest_v1:class:ABC123:settings")
            .unwrap()
            .unwrap();
        let rewritten: ClassSettings = serde_json::from_str(&raw).unwrap();
        assert_eq!(rewritten, settings);
    }

    #[test]
    fn test_save_class_settings_round_trip() {
        let store = ClassStore::new(MemoryStore::new());
        let settings = ClassSettings {
            mastery_accuracy: 90,
            attempts_allowed: 5,
            infinite_lives: true,
            ..ClassSettings::for_class("XYZ789")
        };
        store.save_class_settings(&settings).unwrap();
        assert_eq!(store.load_class_settings("XYZ789"), settings);
    }

    #[test]
    fn test_level_unlocks() {
        let storage = MemoryStore::new();
        let mut unlocks = LevelUnlocks::new(storage.clone(), "ABC123", "sam");

        unlocks.unlock_level("world1-2").unwrap();
        unlocks.unlock_level("world1-2").unwrap();
        unlocks.unlock_level("world1-3").unwrap();
        assert_eq!(unlocks.unlocked(), ["world1-2", "world1-3"]);
        assert!(unlocks.is_unlocked("world1-3"));

        assert!(matches!(
            unlocks.unlock_level("world9-9"),
            Err(UnlockError::UnknownLevel(_))
        ));

        let other = LevelUnlocks::new(storage, "ABC123", "ada");
        assert!(other.unlocked().is_empty());
    }
}
