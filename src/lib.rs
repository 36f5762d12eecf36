//! BioQuest - question-block platformer for the classroom
//!
//! Core modules:
//! - `sim`: Deterministic level-attempt state machine (no rendering, no physics)
//! - `game`: Attempt/retry/next-level orchestration
//! - `level` / `question_bank`: Validated question banks
//! - `settings` / `session`: Class configuration and session context
//! - `results` / `persistence`: Append-only result log in LocalStorage
//! - `progression`: Fixed level ordering and unlocks
//! - `platform`: Clock and browser adapter

pub mod error;
pub mod game;
pub mod level;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod question_bank;
pub mod results;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{BootError, LoadError, PersistenceError, UnlockError};
pub use game::Game;
pub use level::{Level, Question};
pub use results::{AttemptResult, EndReason, ResultsStore};
pub use session::{Session, SessionContext};
pub use settings::{ClassSettings, SessionMode, Settings};

/// Gameplay configuration constants
pub mod consts {
    use glam::Vec2;

    /// Points for a correct answer
    pub const CORRECT_ANSWER_POINTS: u32 = 50;
    /// Points for picking up a coin
    pub const COIN_POINTS: u32 = 10;
    /// Points for landing on an enemy from above
    pub const STOMP_POINTS: u32 = 25;

    /// Lives at the start of every attempt (ignored with infinite lives)
    pub const STARTING_LIVES: i32 = 3;

    /// Every question offers exactly this many choices
    pub const CHOICES_PER_QUESTION: usize = 4;

    /// Class defaults
    pub const DEFAULT_MASTERY_ACCURACY: u32 = 70;
    pub const DEFAULT_ATTEMPTS_ALLOWED: u32 = 3;
    /// Level default when the question bank omits it
    pub const DEFAULT_REQUIRED_QUESTIONS: u32 = 3;

    /// How long the "flag is locked" notice stays up
    pub const LOCKED_NOTICE_MS: u32 = 1600;

    /// Velocity kick applied to the player when the flag is still locked
    pub const GATE_NUDGE: Vec2 = Vec2::new(-80.0, 0.0);
    /// Coin spawn offset from the question block after a correct answer
    pub const REWARD_OFFSET: Vec2 = Vec2::new(0.0, -30.0);
    /// Enemy spawn offset from the question block after a wrong answer
    pub const PENALTY_OFFSET: Vec2 = Vec2::new(40.0, -10.0);

    /// First level when the boot record names none
    pub const FIRST_LEVEL: &str = "world1-1";
}

/// Accuracy as a whole percentage, rounded half up. Zero answers is 0%.
#[inline]
pub fn accuracy_percent(correct: u32, answered: u32) -> u32 {
    if answered == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(answered));
    let answered = u64::from(answered);
    ((200 * correct + answered) / (2 * answered)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_zero_answered() {
        assert_eq!(accuracy_percent(0, 0), 0);
    }

    #[test]
    fn test_accuracy_rounding() {
        assert_eq!(accuracy_percent(1, 3), 33);
        assert_eq!(accuracy_percent(2, 3), 67);
        assert_eq!(accuracy_percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(accuracy_percent(3, 3), 100);
    }
}
