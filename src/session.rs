//! Session boot and the context threaded through the attempt machine

use serde::{Deserialize, Serialize};

use crate::consts::FIRST_LEVEL;
use crate::error::BootError;
use crate::platform::Clock;
use crate::progression::UnlockHook;
use crate::results::ResultsStore;
use crate::settings::SessionMode;

/// Boot record handed over by the level select page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionBoot {
    pub class_code: Option<String>,
    pub student_id: Option<String>,
    pub mode: Option<String>,
    pub level_id: Option<String>,
}

/// Who is playing, how, and where they start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Trimmed, upper-case
    pub class_code: String,
    pub student_id: String,
    pub mode: SessionMode,
    pub level_id: String,
}

impl Session {
    /// Validate and normalise a boot record
    pub fn from_boot(boot: &SessionBoot) -> Result<Self, BootError> {
        fn required(value: &Option<String>, name: &'static str) -> Result<String, BootError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(BootError::MissingField(name))
        }

        let class_code = required(&boot.class_code, "classCode")?.to_uppercase();
        let student_id = required(&boot.student_id, "studentId")?;
        let mode = SessionMode::parse_mode(&required(&boot.mode, "mode")?);
        let level_id = boot
            .level_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(FIRST_LEVEL)
            .to_string();

        Ok(Self {
            class_code,
            student_id,
            mode,
            level_id,
        })
    }
}

/// Explicit context for an attempt: the session and its collaborators.
/// Replaces any ambient game-wide state.
pub struct SessionContext {
    pub session: Session,
    pub results: Box<dyn ResultsStore>,
    pub unlocks: Box<dyn UnlockHook>,
    pub clock: Box<dyn Clock>,
}

impl SessionContext {
    pub fn new(
        session: Session,
        results: Box<dyn ResultsStore>,
        unlocks: Box<dyn UnlockHook>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            session,
            results,
            unlocks,
            clock,
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
