//! Class configuration and per-level resolved settings
//!
//! Class settings are persisted per class code in LocalStorage and edited from
//! the teacher panel. They are merged with level overrides and the session
//! mode into the `Settings` an attempt runs with.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::consts::{DEFAULT_ATTEMPTS_ALLOWED, DEFAULT_MASTERY_ACCURACY};
use crate::level::Level;

/// Session mode chosen at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Unlimited lives, nothing at stake
    Practice,
    /// Graded attempts
    #[default]
    Assessment,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Practice => "practice",
            SessionMode::Assessment => "assessment",
        }
    }

    /// Anything that is not "practice" is an assessment
    pub fn parse_mode(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "practice" => SessionMode::Practice,
            _ => SessionMode::Assessment,
        }
    }
}

/// Teacher-controlled class configuration (persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassSettings {
    pub class_code: String,
    /// Accuracy percentage that counts as mastery
    #[serde(deserialize_with = "rounded_count")]
    pub mastery_accuracy: u32,
    /// Graded attempts per level in assessment mode
    #[serde(deserialize_with = "rounded_count")]
    pub attempts_allowed: u32,
    pub infinite_lives: bool,
    pub world_enabled: BTreeMap<String, bool>,
}

impl Default for ClassSettings {
    fn default() -> Self {
        Self {
            class_code: String::new(),
            mastery_accuracy: DEFAULT_MASTERY_ACCURACY,
            attempts_allowed: DEFAULT_ATTEMPTS_ALLOWED,
            infinite_lives: false,
            world_enabled: BTreeMap::from([("world1".to_string(), true)]),
        }
    }
}

impl ClassSettings {
    /// Defaults for a class that has never been configured
    pub fn for_class(class_code: &str) -> Self {
        Self {
            class_code: class_code.to_string(),
            ..Self::default()
        }
    }

    /// Overlay the fields of a stored record. A field that is missing or
    /// unreadable keeps its current value.
    pub fn merge_stored(&mut self, stored: &Map<String, Value>) {
        if let Some(code) = stored.get("classCode").and_then(Value::as_str) {
            self.class_code = code.to_string();
        }
        if let Some(mastery) = stored.get("masteryAccuracy").and_then(whole_number) {
            self.mastery_accuracy = mastery;
        }
        if let Some(attempts) = stored.get("attemptsAllowed").and_then(whole_number) {
            self.attempts_allowed = attempts;
        }
        if let Some(infinite) = stored.get("infiniteLives").and_then(Value::as_bool) {
            self.infinite_lives = infinite;
        }
        if let Some(Value::Object(worlds)) = stored.get("worldEnabled") {
            self.world_enabled = worlds
                .iter()
                .filter_map(|(world, on)| on.as_bool().map(|on| (world.clone(), on)))
                .collect();
        }
    }
}

/// Non-negative number rounded to the nearest integer (72.5 -> 73)
fn whole_number(value: &Value) -> Option<u32> {
    let n = value.as_f64()?;
    (n.is_finite() && n >= 0.0).then(|| n.round().min(f64::from(u32::MAX)) as u32)
}

fn rounded_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    whole_number(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a non-negative number, got {}", value)))
}

/// Settings an attempt runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub mastery_accuracy: u32,
    pub attempts_allowed: u32,
    pub infinite_lives: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mastery_accuracy: DEFAULT_MASTERY_ACCURACY,
            attempts_allowed: DEFAULT_ATTEMPTS_ALLOWED,
            infinite_lives: false,
        }
    }
}

/// Merge class configuration, level override and session mode.
///
/// The level's mastery threshold wins over the class one; practice mode
/// always plays with infinite lives.
pub fn resolve_settings(class: &ClassSettings, level: &Level, mode: SessionMode) -> Settings {
    Settings {
        mastery_accuracy: level.mastery_accuracy.unwrap_or(class.mastery_accuracy),
        attempts_allowed: class.attempts_allowed.max(1),
        infinite_lives: mode == SessionMode::Practice || class.infinite_lives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(mastery: Option<u32>) -> Level {
        Level {
            level_id: "world1-1".into(),
            required_questions: 3,
            mastery_accuracy: mastery,
            questions: Vec::new(),
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(SessionMode::parse_mode("practice"), SessionMode::Practice);
        assert_eq!(SessionMode::parse_mode(" Practice "), SessionMode::Practice);
        assert_eq!(SessionMode::parse_mode("assessment"), SessionMode::Assessment);
        assert_eq!(SessionMode::parse_mode("quiz"), SessionMode::Assessment);
    }

    #[test]
    fn test_resolve_defaults() {
        let class = ClassSettings::for_class("ABC123");
        let settings = resolve_settings(&class, &level(None), SessionMode::Assessment);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_practice_forces_infinite_lives() {
        let class = ClassSettings::for_class("ABC123");
        assert!(!class.infinite_lives);
        let settings = resolve_settings(&class, &level(None), SessionMode::Practice);
        assert!(settings.infinite_lives);
    }

    #[test]
    fn test_level_mastery_override() {
        let class = ClassSettings {
            mastery_accuracy: 60,
            ..ClassSettings::for_class("ABC123")
        };
        let settings = resolve_settings(&class, &level(Some(85)), SessionMode::Assessment);
        assert_eq!(settings.mastery_accuracy, 85);
        let settings = resolve_settings(&class, &level(None), SessionMode::Assessment);
        assert_eq!(settings.mastery_accuracy, 60);
    }

    #[test]
    fn test_partial_class_settings_merge_over_defaults() {
        let parsed: ClassSettings =
            serde_json::from_str(r#"{"classCode": "ABC123", "attemptsAllowed": 5}"#).unwrap();
        assert_eq!(parsed.attempts_allowed, 5);
        assert_eq!(parsed.mastery_accuracy, DEFAULT_MASTERY_ACCURACY);
        assert_eq!(parsed.world_enabled.get("world1"), Some(&true));
    }

    #[test]
    fn test_fractional_numbers_round() {
        let parsed: ClassSettings =
            serde_json::from_str(r#"{"classCode": "ABC123", "masteryAccuracy": 72.5, "attemptsAllowed": 4.0}"#)
                .unwrap();
        assert_eq!(parsed.mastery_accuracy, 73);
        assert_eq!(parsed.attempts_allowed, 4);
        assert!(serde_json::from_str::<ClassSettings>(r#"{"masteryAccuracy": -5}"#).is_err());
    }

    #[test]
    fn test_merge_stored_keeps_readable_fields() {
        let stored: Value = serde_json::from_str(
            r#"{"classCode": "ABC123", "masteryAccuracy": "high", "attemptsAllowed": 5,
                "infiniteLives": true, "worldEnabled": {"world1": false, "world2": "yes"}}"#,
        )
        .unwrap();
        let mut settings = ClassSettings::for_class("ABC123");
        settings.merge_stored(stored.as_object().unwrap());
        assert_eq!(settings.mastery_accuracy, DEFAULT_MASTERY_ACCURACY);
        assert_eq!(settings.attempts_allowed, 5);
        assert!(settings.infinite_lives);
        assert_eq!(settings.world_enabled, BTreeMap::from([("world1".to_string(), false)]));
    }
}
