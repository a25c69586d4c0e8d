//! Session role - the write-boundary gate.
//!
//! Only the game-master session automates the tracker; every other session
//! observes. The engine enforces this at the event router, not in the rules.

use serde::{Deserialize, Serialize};

/// Role of the session this module instance runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    GameMaster,
    Observer,
}

impl SessionRole {
    pub fn is_game_master(&self) -> bool {
        matches!(self, SessionRole::GameMaster)
    }
}
