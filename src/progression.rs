//! Level ordering and unlocks

use crate::error::UnlockError;
use crate::results::AttemptResult;

/// Every level, in play order
pub const LEVEL_ORDER: [&str; 3] = ["world1-1", "world1-2", "world1-3"];

/// Host notified when a level becomes playable
pub trait UnlockHook {
    fn unlock_level(&mut self, level_id: &str) -> Result<(), UnlockError>;
}

/// Unlock hook that records nothing (level select handles unlocks itself)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUnlocks;

impl UnlockHook for NoUnlocks {
    fn unlock_level(&mut self, _level_id: &str) -> Result<(), UnlockError> {
        Ok(())
    }
}

pub fn is_known_level(level_id: &str) -> bool {
    LEVEL_ORDER.contains(&level_id)
}

/// Level after `current`, or `None` for the last or an unknown level
pub fn next_level_id(current: &str) -> Option<&'static str> {
    let index = LEVEL_ORDER.iter().position(|id| *id == current)?;
    LEVEL_ORDER.get(index + 1).copied()
}

/// Successor a finished attempt may move on to. Only completed attempts
/// progress.
pub fn successor_of(result: &AttemptResult) -> Option<&'static str> {
    if !result.completed {
        return None;
    }
    next_level_id(&result.level_id)
}

/// Unlock the successor of a completed attempt. Hook failures are logged and
/// ignored; safe to call more than once.
pub fn unlock_successor(result: &AttemptResult, hook: &mut dyn UnlockHook) -> Option<&'static str> {
    let next = successor_of(result)?;
    if let Err(e) = hook.unlock_level(next) {
        log::warn!("Unlocking {} failed: {}", next, e);
    }
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::EndReason;

    struct Recorder(Vec<String>);

    impl UnlockHook for Recorder {
        fn unlock_level(&mut self, level_id: &str) -> Result<(), UnlockError> {
            self.0.push(level_id.to_string());
            Ok(())
        }
    }

    struct Failing;

    impl UnlockHook for Failing {
        fn unlock_level(&mut self, level_id: &str) -> Result<(), UnlockError> {
            Err(UnlockError::UnknownLevel(level_id.to_string()))
        }
    }

    fn result(level_id: &str, completed: bool) -> AttemptResult {
        AttemptResult {
            level_id: level_id.into(),
            completed,
            reason: if completed {
                EndReason::Completed
            } else {
                EndReason::OutOfLives
            },
            score: 0,
            answered: 3,
            correct: 3,
            accuracy: 100,
            lives_remaining: Some(1),
            attempt: 1,
            duration_ms: 0,
            at_iso: "2026-03-01T10:00:00.000Z".into(),
            mastery_met: true,
            required_questions: 3,
        }
    }

    #[test]
    fn test_next_level_id() {
        assert_eq!(next_level_id("world1-1"), Some("world1-2"));
        assert_eq!(next_level_id("world1-2"), Some("world1-3"));
        assert_eq!(next_level_id("world1-3"), None);
        assert_eq!(next_level_id("bonus"), None);
    }

    #[test]
    fn test_unlock_only_on_completion() {
        let mut hook = Recorder(Vec::new());
        assert_eq!(unlock_successor(&result("world1-1", true), &mut hook), Some("world1-2"));
        assert_eq!(unlock_successor(&result("world1-2", false), &mut hook), None);
        assert_eq!(unlock_successor(&result("world1-3", true), &mut hook), None);
        assert_eq!(hook.0, ["world1-2"]);
    }

    #[test]
    fn test_unlock_failure_swallowed() {
        let next = unlock_successor(&result("world1-1", true), &mut Failing);
        assert_eq!(next, Some("world1-2"));
    }
}
