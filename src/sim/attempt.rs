//! The level-attempt state machine
//!
//! ```text
//! Playing --trigger_block--> QuestionOpen --submit_answer--> (answered)
//!    ^                                                          |
//!    +------------------------acknowledge_answer----------------+
//! Playing --reach_goal (gate open) / lives exhausted--> ResultsOpen
//! ```
//!
//! Invalid calls (wrong phase, consumed block, double submit) are ignored and
//! return `false`. Terminal transitions write the result to the session's
//! results store; write and unlock failures are logged, never propagated.

use std::sync::Arc;

use crate::consts::*;
use crate::level::{Level, Question};
use crate::platform::{Clock, iso_timestamp};
use crate::progression;
use crate::results::{AttemptResult, EndReason};
use crate::session::SessionContext;
use crate::settings::Settings;

use super::state::{
    AttemptPhase, AttemptState, GameEvent, HudSnapshot, LivesDisplay, OpenQuestion,
};

/// One play-through of a level
#[derive(Debug, Clone)]
pub struct AttemptMachine {
    level: Arc<Level>,
    settings: Settings,
    state: AttemptState,
    started_at_ms: i64,
    result: Option<AttemptResult>,
    events: Vec<GameEvent>,
}

impl AttemptMachine {
    /// Start a fresh attempt in `Playing`
    pub fn new(level: Arc<Level>, settings: Settings, attempt_number: u32, clock: &dyn Clock) -> Self {
        log::info!(
            "Attempt {} of {} started ({} questions required)",
            attempt_number.max(1),
            level.level_id,
            level.required_questions
        );
        Self {
            level,
            settings,
            state: AttemptState::new(attempt_number),
            started_at_ms: clock.now_ms(),
            result: None,
            events: Vec::new(),
        }
    }

    pub fn level(&self) -> &Arc<Level> {
        &self.level
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn phase(&self) -> AttemptPhase {
        self.state.phase
    }

    /// Set once the attempt has ended
    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    pub fn is_simulation_running(&self) -> bool {
        self.state.phase.simulation_running()
    }

    /// Question on the open panel
    pub fn current_question(&self) -> Option<&Arc<Question>> {
        self.state
            .open_question
            .as_ref()
            .map(|open| &self.level.questions[open.question_index])
    }

    /// Events emitted since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// A question block was hit. `from_below` is the presentation layer's
    /// verdict on the contact geometry.
    pub fn trigger_block(&mut self, block_id: &str, from_below: bool) -> bool {
        if self.state.phase != AttemptPhase::Playing {
            log::debug!("Ignoring block {} outside Playing", block_id);
            return false;
        }
        if !from_below || self.state.triggered_blocks.contains(block_id) {
            return false;
        }
        let Some(question_index) = self.level.question_index(self.state.next_question_cursor)
        else {
            log::warn!("Level {} has no questions, ignoring block {}", self.level.level_id, block_id);
            return false;
        };

        self.state.triggered_blocks.insert(block_id.to_string());
        self.state.next_question_cursor += 1;

        self.state.open_question = Some(OpenQuestion {
            block_id: block_id.to_string(),
            question_index,
            submitted: None,
        });
        self.state.phase = AttemptPhase::QuestionOpen;

        self.events.push(GameEvent::QuestionOpened {
            block_id: block_id.to_string(),
            question: Arc::clone(&self.level.questions[question_index]),
        });
        self.events.push(GameEvent::SimulationSuspended);
        true
    }

    /// Answer the open question. Only the first submission counts.
    pub fn submit_answer(&mut self, choice: usize) -> bool {
        if self.state.phase != AttemptPhase::QuestionOpen || choice >= CHOICES_PER_QUESTION {
            log::debug!("Ignoring answer {} in {:?}", choice, self.state.phase);
            return false;
        }
        let Some(open) = self.state.open_question.as_mut() else {
            return false;
        };
        if open.submitted.is_some() {
            log::debug!("Question already answered, ignoring {}", choice);
            return false;
        }
        open.submitted = Some(choice);

        let block_id = open.block_id.clone();
        let question = Arc::clone(&self.level.questions[open.question_index]);
        let correct = question.is_correct(choice);

        self.state.answered += 1;
        if correct {
            self.state.correct += 1;
            self.state.score += CORRECT_ANSWER_POINTS;
            self.events.push(GameEvent::SpawnReward {
                block_id,
                offset: REWARD_OFFSET,
            });
            self.events.push(GameEvent::ScoreChanged {
                score: self.state.score,
            });
        } else {
            self.events.push(GameEvent::SpawnPenalty {
                block_id,
                offset: PENALTY_OFFSET,
            });
        }

        self.events.push(GameEvent::AnswerResolved {
            correct,
            choice,
            answer_index: question.answer_index,
            explanation: question.explanation_text(),
        });

        self.recompute_gate();
        true
    }

    /// Close the panel after an answer and resume the world
    pub fn acknowledge_answer(&mut self) -> bool {
        let answered = self
            .state
            .open_question
            .as_ref()
            .is_some_and(|open| open.submitted.is_some());
        if self.state.phase != AttemptPhase::QuestionOpen || !answered {
            return false;
        }

        self.state.open_question = None;
        self.state.phase = AttemptPhase::Playing;
        self.events.push(GameEvent::QuestionClosed);
        self.events.push(GameEvent::SimulationResumed);
        true
    }

    /// The player touched the goal flag
    pub fn reach_goal(&mut self, ctx: &mut SessionContext) -> bool {
        if self.state.phase != AttemptPhase::Playing {
            return false;
        }

        self.recompute_gate();
        if !self.state.flag_unlocked {
            let remaining = self.state.remaining_questions(self.level.required_questions);
            self.state.locked_notice_ms = LOCKED_NOTICE_MS;
            self.events.push(GameEvent::GateLocked {
                remaining,
                nudge: GATE_NUDGE,
            });
            return false;
        }

        self.end_attempt(EndReason::Completed, ctx);
        true
    }

    /// A damaging contact. Ends the attempt when lives run out.
    pub fn take_damage(&mut self, ctx: &mut SessionContext) -> bool {
        if self.state.phase != AttemptPhase::Playing || self.settings.infinite_lives {
            return false;
        }

        self.state.lives -= 1;
        self.events.push(GameEvent::LivesChanged {
            lives: self.state.lives,
        });

        if self.state.lives <= 0 {
            self.end_attempt(EndReason::OutOfLives, ctx);
        }
        true
    }

    pub fn collect_coin(&mut self) -> bool {
        self.add_points(COIN_POINTS)
    }

    pub fn stomp_enemy(&mut self) -> bool {
        self.add_points(STOMP_POINTS)
    }

    /// Advance one frame. Simulation time only moves while `Playing`; the
    /// locked notice counts down regardless.
    pub fn advance(&mut self, dt_ms: u32) {
        if self.is_simulation_running() {
            self.state.sim_time_ms += u64::from(dt_ms);
        }
        if self.state.locked_notice_ms > 0 {
            self.state.locked_notice_ms = self.state.locked_notice_ms.saturating_sub(dt_ms);
            if self.state.locked_notice_ms == 0 {
                self.events.push(GameEvent::LockedNoticeExpired);
            }
        }
    }

    pub fn hud(&self) -> HudSnapshot {
        let required = self.level.required_questions;
        let accuracy = self.state.accuracy();
        HudSnapshot {
            level_id: self.level.level_id.clone(),
            score: self.state.score,
            lives: if self.settings.infinite_lives {
                LivesDisplay::Infinite
            } else {
                LivesDisplay::Count(self.state.lives)
            },
            accuracy,
            correct: self.state.correct,
            answered: self.state.answered,
            progress: self.state.answered.min(required),
            required_questions: required,
            flag_unlocked: self.state.flag_unlocked,
            mastery_met: accuracy >= self.settings.mastery_accuracy,
            mastery_accuracy: self.settings.mastery_accuracy,
        }
    }

    /// Result for the attempt as it stands at `now_ms`
    pub fn build_result(&self, reason: EndReason, now_ms: i64) -> AttemptResult {
        let accuracy = self.state.accuracy();
        AttemptResult {
            level_id: self.level.level_id.clone(),
            completed: reason == EndReason::Completed,
            reason,
            score: self.state.score,
            answered: self.state.answered,
            correct: self.state.correct,
            accuracy,
            lives_remaining: (!self.settings.infinite_lives).then_some(self.state.lives),
            attempt: self.state.attempt_number,
            duration_ms: (now_ms - self.started_at_ms).max(0) as u64,
            at_iso: iso_timestamp(now_ms),
            mastery_met: accuracy >= self.settings.mastery_accuracy,
            required_questions: self.level.required_questions,
        }
    }

    fn add_points(&mut self, points: u32) -> bool {
        if self.state.phase != AttemptPhase::Playing {
            return false;
        }
        self.state.score += points;
        self.events.push(GameEvent::ScoreChanged {
            score: self.state.score,
        });
        true
    }

    fn recompute_gate(&mut self) {
        if !self.state.flag_unlocked && self.state.answered >= self.level.required_questions {
            self.state.flag_unlocked = true;
            self.events.push(GameEvent::GateUnlocked);
        }
    }

    fn end_attempt(&mut self, reason: EndReason, ctx: &mut SessionContext) {
        if self.state.phase == AttemptPhase::ResultsOpen {
            return;
        }
        if self.state.open_question.take().is_some() {
            self.events.push(GameEvent::QuestionClosed);
        }
        let was_running = self.is_simulation_running();

        let result = self.build_result(reason, ctx.clock.now_ms());
        log::info!(
            "Attempt ended on {}: {} ({}% accuracy, {}/{} correct, mastery {})",
            result.level_id,
            reason.as_str(),
            result.accuracy,
            result.correct,
            result.answered,
            if result.mastery_met { "met" } else { "not met" }
        );

        if let Err(e) =
            ctx.results
                .write_result(&ctx.session.class_code, &ctx.session.student_id, &result)
        {
            log::warn!("Saving result failed: {}", e);
        }
        let next = progression::unlock_successor(&result, ctx.unlocks.as_mut());

        self.state.phase = AttemptPhase::ResultsOpen;
        if was_running {
            self.events.push(GameEvent::SimulationSuspended);
        }
        self.events.push(GameEvent::AttemptEnded {
            result: result.clone(),
        });
        self.events.push(GameEvent::NextLevelAvailable {
            level_id: next.map(str::to_string),
        });
        self.result = Some(result);
    }
}
