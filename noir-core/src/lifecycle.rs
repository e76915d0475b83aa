//! The game lifecycle gate.
//!
//! Two phases. In LOBBY, chat is social and actions do not reach the turn
//! pipeline; IN_GAME is where turns run. The transition into a game is the
//! only place world documents are reset; going back to the lobby changes
//! the gate and nothing else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    InGame,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("A game is already in progress")]
    AlreadyInGame,
}

/// Phase plus the case the current (or last) game was started on.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: Phase,
    current_case: String,
}

impl Lifecycle {
    /// Boot state: always the lobby, whatever was on disk before.
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            phase: Phase::Lobby,
            current_case: case_id.into(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn in_game(&self) -> bool {
        self.phase == Phase::InGame
    }

    pub fn current_case(&self) -> &str {
        &self.current_case
    }

    /// Enter a game. Only valid from the lobby.
    pub fn begin(&mut self, case_id: impl Into<String>) -> Result<(), LifecycleError> {
        if self.phase == Phase::InGame {
            return Err(LifecycleError::AlreadyInGame);
        }
        self.current_case = case_id.into();
        self.phase = Phase::InGame;
        tracing::info!(case = %self.current_case, "Game started");
        Ok(())
    }

    /// Back to the lobby. Idempotent; never touches game state.
    pub fn return_to_lobby(&mut self) {
        if self.phase != Phase::Lobby {
            tracing::info!("Returned to lobby");
        }
        self.phase = Phase::Lobby;
    }
}
