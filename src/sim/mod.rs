//! Level-attempt simulation
//!
//! All attempt logic lives here. This module must stay headless:
//! - No rendering, physics or platform dependencies
//! - Time and collisions arrive as inputs
//! - Side effects go through the session context or out as `GameEvent`s

pub mod attempt;
pub mod state;
pub mod tick;

pub use attempt::AttemptMachine;
pub use state::{
    AttemptPhase, AttemptState, GameEvent, HudSnapshot, LivesDisplay, OpenQuestion,
};
pub use tick::{AttemptInput, apply, tick};
