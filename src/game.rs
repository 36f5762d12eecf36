//! Attempt lifecycle across retries and levels
//!
//! `Game` owns the session context and the current attempt. It handles the
//! results-screen actions (retry, next level, menu) that replace the attempt
//! machine with a fresh one.

use std::sync::Arc;

use crate::error::LoadError;
use crate::level::Level;
use crate::progression;
use crate::question_bank::QuestionBank;
use crate::results::AttemptResult;
use crate::session::SessionContext;
use crate::settings::{ClassSettings, SessionMode, Settings, resolve_settings};
use crate::sim::{AttemptInput, AttemptMachine, AttemptPhase, GameEvent, tick};

/// Attempt number for a retry from the results screen.
///
/// Assessment attempts that missed mastery count up to `attempts_allowed`;
/// practice retries and retries after mastery start over at 1.
pub fn retry_attempt_number(result: &AttemptResult, settings: &Settings, mode: SessionMode) -> u32 {
    match mode {
        SessionMode::Assessment if !result.mastery_met => {
            (result.attempt + 1).min(settings.attempts_allowed.max(1))
        }
        _ => 1,
    }
}

/// What the results screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsScreen {
    pub result: AttemptResult,
    pub mastery_accuracy: u32,
    pub attempts_allowed: u32,
    pub infinite_lives: bool,
    /// Offered only after a completed attempt
    pub next_level: Option<&'static str>,
}

/// A student's session: one attempt at a time, or the menu
#[derive(Debug)]
pub struct Game {
    ctx: SessionContext,
    class_settings: ClassSettings,
    attempt: Option<AttemptMachine>,
}

impl Game {
    /// Start at the menu. Class settings are read once per session.
    pub fn new(ctx: SessionContext, class_settings: ClassSettings) -> Self {
        Self {
            ctx,
            class_settings,
            attempt: None,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.ctx
    }

    pub fn class_settings(&self) -> &ClassSettings {
        &self.class_settings
    }

    pub fn attempt(&self) -> Option<&AttemptMachine> {
        self.attempt.as_ref()
    }

    pub fn attempt_mut(&mut self) -> Option<&mut AttemptMachine> {
        self.attempt.as_mut()
    }

    pub fn is_at_menu(&self) -> bool {
        self.attempt.is_none()
    }

    /// Start attempt 1 of an already-loaded level
    pub fn start_level(&mut self, level: Level) {
        self.start_attempt(Arc::new(level), 1);
    }

    /// Load a level and start attempt 1. A failed load leaves the current
    /// attempt (if any) untouched.
    pub fn load_level(&mut self, bank: &dyn QuestionBank, level_id: &str) -> Result<(), LoadError> {
        let level = bank.load_level(level_id)?;
        self.start_level(level);
        Ok(())
    }

    /// Feed one frame of inputs to the current attempt
    pub fn tick(&mut self, inputs: &[AttemptInput], dt_ms: u32) {
        if let Some(attempt) = self.attempt.as_mut() {
            tick(attempt, &mut self.ctx, inputs, dt_ms);
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.attempt
            .as_mut()
            .map(AttemptMachine::drain_events)
            .unwrap_or_default()
    }

    /// Results of the finished attempt, while the results screen is up
    pub fn results_screen(&self) -> Option<ResultsScreen> {
        let attempt = self.attempt.as_ref()?;
        let result = attempt.result()?.clone();
        let settings = attempt.settings();
        Some(ResultsScreen {
            next_level: progression::successor_of(&result),
            result,
            mastery_accuracy: settings.mastery_accuracy,
            attempts_allowed: settings.attempts_allowed,
            infinite_lives: settings.infinite_lives,
        })
    }

    /// Replay the level with a fresh attempt. Only from the results screen.
    pub fn retry(&mut self) -> bool {
        let Some(attempt) = self.finished_attempt() else {
            return false;
        };
        let Some(result) = attempt.result() else {
            return false;
        };
        let number = retry_attempt_number(result, attempt.settings(), self.ctx.session.mode);
        let level = Arc::clone(attempt.level());
        self.start_attempt(level, number);
        true
    }

    /// Successor level, if the finished attempt completed and one exists
    pub fn next_level_id(&self) -> Option<&'static str> {
        self.finished_attempt()
            .and_then(AttemptMachine::result)
            .and_then(progression::successor_of)
    }

    /// Load and start the next level. `Ok(false)` when none is offered.
    pub fn go_to_next_level(&mut self, bank: &dyn QuestionBank) -> Result<bool, LoadError> {
        let Some(next) = self.next_level_id() else {
            return Ok(false);
        };
        self.load_level(bank, next)?;
        Ok(true)
    }

    /// Abandon whatever is in progress
    pub fn return_to_menu(&mut self) {
        if self.attempt.take().is_some() {
            log::info!("Returned to level select");
        }
    }

    fn finished_attempt(&self) -> Option<&AttemptMachine> {
        self.attempt
            .as_ref()
            .filter(|a| a.phase() == AttemptPhase::ResultsOpen)
    }

    fn start_attempt(&mut self, level: Arc<Level>, attempt_number: u32) {
        let settings = resolve_settings(&self.class_settings, &level, self.ctx.session.mode);
        self.ctx.session.level_id = level.level_id.clone();
        self.attempt = Some(AttemptMachine::new(
            level,
            settings,
            attempt_number,
            self.ctx.clock.as_ref(),
        ));
    }
}
