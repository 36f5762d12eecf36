//! Attempt results and the teacher panel view of them
//!
//! A result is written once when an attempt ends and appended to the
//! student's log. Field names match the JSON the teacher panel reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Why an attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Completed,
    OutOfLives,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Completed => "completed",
            EndReason::OutOfLives => "out_of_lives",
        }
    }
}

/// Immutable record of one finished attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub level_id: String,
    pub completed: bool,
    pub reason: EndReason,
    pub score: u32,
    pub answered: u32,
    pub correct: u32,
    /// Whole percent, 0 when nothing was answered
    pub accuracy: u32,
    /// `None` when playing with infinite lives
    pub lives_remaining: Option<i32>,
    pub attempt: u32,
    pub duration_ms: u64,
    /// ISO-8601 UTC timestamp with milliseconds
    #[serde(rename = "atISO")]
    pub at_iso: String,
    pub mastery_met: bool,
    pub required_questions: u32,
}

/// Append-only sink for finished attempts
pub trait ResultsStore {
    fn write_result(
        &mut self,
        class_code: &str,
        student_id: &str,
        result: &AttemptResult,
    ) -> Result<(), PersistenceError>;
}

/// Every result of a class: student id -> results in append order
pub type ClassResults = BTreeMap<String, Vec<AttemptResult>>;

/// One teacher panel row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    pub last: Option<AttemptResult>,
    pub best_accuracy: u32,
    pub attempts: usize,
}

/// Summaries for every student, sorted by student id
pub fn summarize_class(results: &ClassResults) -> Vec<StudentSummary> {
    results
        .iter()
        .map(|(student_id, attempts)| StudentSummary {
            student_id: student_id.clone(),
            last: attempts.last().cloned(),
            best_accuracy: attempts.iter().map(|a| a.accuracy).max().unwrap_or(0),
            attempts: attempts.len(),
        })
        .collect()
}

/// Format an ISO timestamp relative to `now_ms` (unix epoch milliseconds)
pub fn format_relative(at_iso: &str, now_ms: i64) -> String {
    let Ok(at) = chrono::DateTime::parse_from_rfc3339(at_iso) else {
        return "N/A".to_string();
    };
    let diff_ms = (now_ms - at.timestamp_millis()).max(0);
    let mins = diff_ms / 60_000;
    let hours = mins / 60;
    let days = hours / 24;

    if days >= 1 {
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            at.format("%-m/%-d/%y").to_string()
        }
    } else if hours >= 1 {
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if mins >= 1 {
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}
