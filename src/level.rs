//! Levels and their question banks
//!
//! Question banks arrive as loosely-typed JSON. They are validated once here
//! and are immutable afterwards; the attempt machine only holds references.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::consts::{CHOICES_PER_QUESTION, DEFAULT_REQUIRED_QUESTIONS};
use crate::error::LoadError;

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub prompt: String,
    /// Exactly four choices
    pub choices: Vec<String>,
    /// Index of the correct choice (0-3)
    pub answer_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// What to show once a question has been answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Explanation {
    /// Authored explanation text
    Text(String),
    /// No explanation authored; show the correct choice instead
    CorrectChoice(String),
}

impl Question {
    /// Whether `choice` is the correct answer
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer_index
    }

    /// Text of the correct choice
    pub fn correct_choice(&self) -> Option<&str> {
        self.choices.get(self.answer_index).map(String::as_str)
    }

    /// Explanation text, falling back to the correct choice, then to nothing
    pub fn explanation_text(&self) -> Option<Explanation> {
        let authored = self.explanation.as_deref().map(str::trim).unwrap_or("");
        if !authored.is_empty() {
            return Some(Explanation::Text(authored.to_string()));
        }
        self.correct_choice()
            .filter(|c| !c.is_empty())
            .map(|c| Explanation::CorrectChoice(c.to_string()))
    }

    fn validate(self, index: usize) -> Result<Self, LoadError> {
        let invalid = |reason: String| LoadError::InvalidQuestion { index, reason };

        if self.prompt.trim().is_empty() {
            return Err(invalid("prompt is empty".into()));
        }
        if self.choices.len() != CHOICES_PER_QUESTION {
            return Err(invalid(format!(
                "expected {} choices, found {}",
                CHOICES_PER_QUESTION,
                self.choices.len()
            )));
        }
        if self.answer_index >= CHOICES_PER_QUESTION {
            return Err(invalid(format!(
                "answerIndex {} is out of range",
                self.answer_index
            )));
        }
        Ok(self)
    }
}

/// A playable level: gate size, optional mastery override, question bank
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub level_id: String,
    /// Questions that must be answered before the flag unlocks (>= 1)
    pub required_questions: u32,
    /// Overrides the class mastery threshold when present
    pub mastery_accuracy: Option<u32>,
    /// Non-empty, shared with open question panels
    pub questions: Vec<Arc<Question>>,
}

/// On-disk shape of `questions_<levelId>.json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelFile {
    #[serde(default)]
    level_id: Option<String>,
    #[serde(default)]
    required_questions: Option<u32>,
    #[serde(default)]
    mastery_accuracy: Option<u32>,
    #[serde(default)]
    questions: Vec<Question>,
}

impl Level {
    /// Parse and validate a question bank. `level_id` is used when the file
    /// does not name its own level.
    pub fn from_json(level_id: &str, json: &str) -> Result<Self, LoadError> {
        let file: LevelFile = serde_json::from_str(json)?;
        let level_id = file
            .level_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| level_id.to_string());

        if file.questions.is_empty() {
            return Err(LoadError::EmptyQuestionBank { level_id });
        }

        let questions = file
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| q.validate(i).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        // Missing or 0 means the default
        let required_questions = file
            .required_questions
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_REQUIRED_QUESTIONS);

        log::info!(
            "Loaded level {} ({} questions, {} required)",
            level_id,
            questions.len(),
            required_questions
        );

        Ok(Self {
            level_id,
            required_questions,
            mastery_accuracy: file.mastery_accuracy,
            questions,
        })
    }

    /// Bank index picked by the round-robin cursor, `None` for an empty bank
    pub fn question_index(&self, cursor: usize) -> Option<usize> {
        (!self.questions.is_empty()).then(|| cursor % self.questions.len())
    }

    /// Question picked by the round-robin cursor
    pub fn question_at(&self, cursor: usize) -> Option<&Arc<Question>> {
        self.question_index(cursor).map(|i| &self.questions[i])
    }
}
