//! Combat entity - A single encounter in the host's tracker.
//!
//! The host owns the combat record and its lifecycle; this module only ever
//! reads it. Round 0 means the encounter has been created but not started.

use serde::{Deserialize, Serialize};

use crate::ids::CombatId;

/// A combat encounter as reported by the host tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combat {
    pub id: CombatId,
    /// Current round. 0 = created but not started.
    pub round: u32,
}

impl Combat {
    /// Create a combat record that has not started yet.
    pub fn new(id: CombatId) -> Self {
        Self { id, round: 0 }
    }

    pub fn has_started(&self) -> bool {
        self.round > 0
    }

    /// The critical-bonus grant window: round 1, or not yet started.
    pub fn in_opening_round(&self) -> bool {
        self.round <= 1
    }
}
