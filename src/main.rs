//! BioQuest entry point
//!
//! In the browser the library's `wasm_start` does the setup and the scene
//! script drives `WebGame`. Natively this runs a headless play-through of one
//! level against its question bank and prints the result record.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let level_id = args
        .next()
        .unwrap_or_else(|| bioquest::consts::FIRST_LEVEL.to_string());
    let data_dir = args.next().unwrap_or_else(|| "data".to_string());

    log::info!("BioQuest (native) starting...");
    if let Err(e) = headless::run(&level_id, &data_dir) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_start in the library
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use bioquest::persistence::{ClassStore, LevelUnlocks, MemoryStore};
    use bioquest::platform::SystemClock;
    use bioquest::question_bank::FsQuestionBank;
    use bioquest::sim::AttemptInput;
    use bioquest::{ClassSettings, Game, LoadError, Session, SessionContext, SessionMode};

    /// Upper bound on blocks hit before giving up on opening the gate
    const MAX_BLOCKS: usize = 64;
    const FRAME_MS: u32 = 16;

    /// Answer every question correctly until the flag unlocks, then finish
    pub fn run(level_id: &str, data_dir: &str) -> Result<(), LoadError> {
        let storage = MemoryStore::new();
        let session = Session {
            class_code: "DEMO42".into(),
            student_id: "autoplay".into(),
            mode: SessionMode::Assessment,
            level_id: level_id.into(),
        };
        let ctx = SessionContext::new(
            session,
            Box::new(ClassStore::new(storage.clone())),
            Box::new(LevelUnlocks::new(storage.clone(), "DEMO42", "autoplay")),
            Box::new(SystemClock),
        );
        let mut game = Game::new(ctx, ClassSettings::for_class("DEMO42"));
        game.load_level(&FsQuestionBank::new(data_dir), level_id)?;

        for n in 1..=MAX_BLOCKS {
            let Some(attempt) = game.attempt() else {
                break;
            };
            if attempt.state().flag_unlocked {
                break;
            }
            game.tick(
                &[AttemptInput::TriggerBlock {
                    block_id: format!("qb{}", n),
                    from_below: true,
                }],
                FRAME_MS,
            );
            let answer = game
                .attempt()
                .and_then(|a| a.current_question())
                .map(|q| q.answer_index)
                .unwrap_or(0);
            game.tick(
                &[
                    AttemptInput::SubmitAnswer { choice: answer },
                    AttemptInput::AcknowledgeAnswer,
                ],
                FRAME_MS,
            );
        }
        game.tick(&[AttemptInput::ReachGoal], FRAME_MS);

        for event in game.drain_events() {
            log::debug!("{:?}", event);
        }

        let Some(screen) = game.results_screen() else {
            log::warn!("Attempt did not finish");
            return Ok(());
        };
        match serde_json::to_string_pretty(&screen.result) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Could not encode result: {}", e),
        }
        if let Some(next) = screen.next_level {
            println!("Next level unlocked: {}", next);
        }
        Ok(())
    }
}
