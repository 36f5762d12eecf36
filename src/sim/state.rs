//! Attempt state and the events it emits
//!
//! Everything one play-through of a level needs lives here; a retry or a new
//! level starts from a fresh `AttemptState`.

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::accuracy_percent;
use crate::consts::STARTING_LIVES;
use crate::level::{Explanation, Question};
use crate::results::AttemptResult;

/// Phase of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptPhase {
    /// World simulation running
    Playing,
    /// Question panel up, world frozen
    QuestionOpen,
    /// Attempt over, results shown (terminal)
    ResultsOpen,
}

impl AttemptPhase {
    /// Whether the world simulation advances in this phase
    pub fn simulation_running(&self) -> bool {
        matches!(self, AttemptPhase::Playing)
    }
}

/// The question bound to the open panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenQuestion {
    /// Block that opened the panel
    pub block_id: String,
    /// Index into the level's question bank
    pub question_index: usize,
    /// Choice submitted, if any; further submissions are refused
    pub submitted: Option<usize>,
}

/// Mutable state of one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptState {
    pub score: u32,
    pub correct: u32,
    pub answered: u32,
    /// Ignored with infinite lives
    pub lives: i32,
    pub attempt_number: u32,
    /// Round-robin index into the question bank
    pub next_question_cursor: usize,
    /// `answered >= required_questions`; never relocks
    pub flag_unlocked: bool,
    /// Consumed question blocks
    pub triggered_blocks: BTreeSet<String>,
    pub phase: AttemptPhase,
    pub open_question: Option<OpenQuestion>,
    /// Remaining display time of the "flag locked" notice (0 = hidden)
    pub locked_notice_ms: u32,
    /// Simulation time; frozen outside `Playing`
    pub sim_time_ms: u64,
}

impl AttemptState {
    pub fn new(attempt_number: u32) -> Self {
        Self {
            score: 0,
            correct: 0,
            answered: 0,
            lives: STARTING_LIVES,
            attempt_number: attempt_number.max(1),
            next_question_cursor: 0,
            flag_unlocked: false,
            triggered_blocks: BTreeSet::new(),
            phase: AttemptPhase::Playing,
            open_question: None,
            locked_notice_ms: 0,
            sim_time_ms: 0,
        }
    }

    /// Current accuracy in whole percent
    pub fn accuracy(&self) -> u32 {
        accuracy_percent(self.correct, self.answered)
    }

    /// Questions still needed before the flag unlocks
    pub fn remaining_questions(&self, required: u32) -> u32 {
        required.saturating_sub(self.answered)
    }
}

/// Lives display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivesDisplay {
    Infinite,
    Count(i32),
}

/// What the HUD shows each frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HudSnapshot {
    pub level_id: String,
    pub score: u32,
    pub lives: LivesDisplay,
    pub accuracy: u32,
    pub correct: u32,
    pub answered: u32,
    /// `min(answered, required)`
    pub progress: u32,
    pub required_questions: u32,
    pub flag_unlocked: bool,
    pub mastery_met: bool,
    pub mastery_accuracy: u32,
}

/// Events for the presentation layer, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Show the question panel
    QuestionOpened {
        block_id: String,
        question: Arc<Question>,
    },
    /// Reveal the correct answer
    AnswerResolved {
        correct: bool,
        choice: usize,
        answer_index: usize,
        explanation: Option<Explanation>,
    },
    /// Spawn a coin near the block
    SpawnReward { block_id: String, offset: Vec2 },
    /// Spawn an enemy near the block
    SpawnPenalty { block_id: String, offset: Vec2 },
    /// Panel closed after an answer
    QuestionClosed,
    /// World physics/time frozen
    SimulationSuspended,
    /// World physics/time running again
    SimulationResumed,
    /// Enough questions answered to finish
    GateUnlocked,
    /// Goal reached too early
    GateLocked { remaining: u32, nudge: Vec2 },
    /// The locked notice timed out
    LockedNoticeExpired,
    ScoreChanged { score: u32 },
    LivesChanged { lives: i32 },
    /// Attempt over; show results
    AttemptEnded { result: AttemptResult },
    /// Whether the results screen may offer "next level"
    NextLevelAvailable { level_id: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = AttemptState::new(0);
        assert_eq!(state.attempt_number, 1);
        assert_eq!(state.phase, AttemptPhase::Playing);
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.accuracy(), 0);
        assert_eq!(state.remaining_questions(3), 3);
    }

    #[test]
    fn test_only_playing_runs_simulation() {
        assert!(AttemptPhase::Playing.simulation_running());
        assert!(!AttemptPhase::QuestionOpen.simulation_running());
        assert!(!AttemptPhase::ResultsOpen.simulation_running());
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(GameEvent::GateLocked {
            remaining: 2,
            nudge: Vec2::new(-80.0, 0.0),
        })
        .unwrap();
        assert_eq!(json["type"], "gate_locked");
        assert_eq!(json["remaining"], 2);
    }
}
