//! Shared types crossing the tracker port boundary.

use serde::{Deserialize, Serialize};

use celerity_domain::{Combat, Combatant, CombatId, CombatantId, CriticalState};

/// Which critical adjustment a module write carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalKind {
    Natural20,
    Natural1,
}

/// Origin tag attached to every combatant write.
///
/// The host re-notifies subscribers on every write, including this module's
/// own. Source tags are the suppress-reentry mechanism: the router ignores
/// `Synchronizer` events entirely and treats a `CriticalAdjustment` event as
/// the signal that the initiative value has stabilized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum WriteSource {
    /// A host or user action (manual roll, drag-in, re-roll).
    External,
    /// This module's one-time boost/debuff write.
    #[serde(rename_all = "camelCase")]
    CriticalAdjustment { kind: CriticalKind },
    /// This module's partition/bonus create and delete writes.
    Synchronizer,
}

impl WriteSource {
    /// Whether the write was performed by this module.
    pub fn is_module(&self) -> bool {
        !matches!(self, WriteSource::External)
    }
}

/// Partial update of a combatant record; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatantUpdate {
    pub id: CombatantId,
    pub initiative: Option<f64>,
    pub critical: Option<CriticalState>,
}

impl CombatantUpdate {
    pub fn initiative(id: CombatantId, initiative: f64) -> Self {
        Self {
            id,
            initiative: Some(initiative),
            critical: None,
        }
    }
}

/// Lifecycle notifications delivered by the host tracker.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// A combatant's initiative (and possibly flags) changed.
    CombatantUpdated {
        /// The record as it reads after the write.
        combatant: Combatant,
        previous_initiative: Option<f64>,
        source: WriteSource,
    },
    /// A combatant entry was created.
    CombatantCreated {
        combatant: Combatant,
        source: WriteSource,
    },
    /// The combat advanced to a new round.
    RoundAdvanced { combat: Combat },
    /// The combat record was deleted, taking its combatants with it.
    CombatDeleted { combat_id: CombatId },
}
