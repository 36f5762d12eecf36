//! Frame tick
//!
//! The presentation layer collects a frame's worth of inputs (collisions,
//! button presses) and hands them over in one call.

use serde::{Deserialize, Serialize};

use super::attempt::AttemptMachine;
use crate::session::SessionContext;

/// Input commands for a single frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttemptInput {
    /// Player hit a question block; `from_below` is the contact test
    TriggerBlock { block_id: String, from_below: bool },
    SubmitAnswer { choice: usize },
    AcknowledgeAnswer,
    ReachGoal,
    TakeDamage,
    CollectCoin,
    StompEnemy,
}

/// Apply one input. Returns whether it changed the attempt.
pub fn apply(machine: &mut AttemptMachine, ctx: &mut SessionContext, input: &AttemptInput) -> bool {
    match input {
        AttemptInput::TriggerBlock {
            block_id,
            from_below,
        } => machine.trigger_block(block_id, *from_below),
        AttemptInput::SubmitAnswer { choice } => machine.submit_answer(*choice),
        AttemptInput::AcknowledgeAnswer => machine.acknowledge_answer(),
        AttemptInput::ReachGoal => machine.reach_goal(ctx),
        AttemptInput::TakeDamage => machine.take_damage(ctx),
        AttemptInput::CollectCoin => machine.collect_coin(),
        AttemptInput::StompEnemy => machine.stomp_enemy(),
    }
}

/// Advance the attempt by one frame: inputs in order, then the clock
pub fn tick(
    machine: &mut AttemptMachine,
    ctx: &mut SessionContext,
    inputs: &[AttemptInput],
    dt_ms: u32,
) {
    for input in inputs {
        apply(machine, ctx, input);
    }
    machine.advance(dt_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::level::Level;
    use crate::persistence::{ClassStore, MemoryStore};
    use crate::platform::ManualClock;
    use crate::progression::NoUnlocks;
    use crate::session::Session;
    use crate::settings::{SessionMode, Settings};
    use crate::sim::AttemptPhase;

    fn setup() -> (AttemptMachine, SessionContext) {
        let level = Level::from_json(
            "world1-1",
            r#"{"requiredQuestions": 1, "questions": [
                {"prompt": "p", "choices": ["a","b","c","d"], "answerIndex": 1}
            ]}"#,
        )
        .unwrap();
        let clock = ManualClock::new(0);
        let ctx = SessionContext::new(
            Session {
                class_code: "ABC123".into(),
                student_id: "sam".into(),
                mode: SessionMode::Practice,
                level_id: "world1-1".into(),
            },
            Box::new(ClassStore::new(MemoryStore::new())),
            Box::new(NoUnlocks),
            Box::new(clock.clone()),
        );
        let machine = AttemptMachine::new(Arc::new(level), Settings::default(), 1, &clock);
        (machine, ctx)
    }

    #[test]
    fn test_tick_full_attempt() {
        let (mut machine, mut ctx) = setup();

        tick(
            &mut machine,
            &mut ctx,
            &[AttemptInput::TriggerBlock {
                block_id: "qb1".into(),
                from_below: true,
            }],
            16,
        );
        assert_eq!(machine.phase(), AttemptPhase::QuestionOpen);

        // Answer and continue in the same frame
        tick(
            &mut machine,
            &mut ctx,
            &[
                AttemptInput::SubmitAnswer { choice: 1 },
                AttemptInput::AcknowledgeAnswer,
            ],
            16,
        );
        // Frozen for the frame the question opened in
        assert_eq!(machine.phase(), AttemptPhase::Playing);
        assert_eq!(machine.state().sim_time_ms, 16);

        tick(&mut machine, &mut ctx, &[AttemptInput::ReachGoal], 16);
        assert_eq!(machine.phase(), AttemptPhase::ResultsOpen);
        assert_eq!(machine.state().sim_time_ms, 16);
        assert_eq!(machine.result().map(|r| r.accuracy), Some(100));
    }

    #[test]
    fn test_inputs_parse_from_json() {
        let inputs: Vec<AttemptInput> = serde_json::from_str(
            r#"[{"type": "trigger_block", "block_id": "qb2", "from_below": true},
                {"type": "submit_answer", "choice": 3},
                {"type": "reach_goal"}]"#,
        )
        .unwrap();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[1], AttemptInput::SubmitAnswer { choice: 3 });
    }
}
