//! Combatant entity - A single turn-order entry, plus the module-private
//! metadata Celerity attaches to it.
//!
//! The host creates, mutates, and deletes combatant records; Celerity's
//! writes go through the tracker port. `TurnMarker` and `CriticalState` are
//! stored in the combatant's module-owned metadata namespace, so both are
//! serde round-trippable and tolerant of absent fields.

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, CombatId, CombatantId};

/// Module-private metadata distinguishing generated entries from user-rolled
/// ones.
///
/// Generated entries never trigger further adjustment or partitioning: the
/// marker is the recursion guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TurnMarker {
    /// A normal, user-rolled combatant.
    Original,
    /// An extra-turn entry generated from `original_id`.
    ///
    /// `partition_index` is 1-based; ascending index = descending initiative.
    #[serde(rename_all = "camelCase")]
    Partition {
        original_id: CombatantId,
        partition_index: u32,
    },
    /// The natural-20 bonus entry generated for `original_id`.
    #[serde(rename_all = "camelCase")]
    CriticalBonus { original_id: CombatantId },
}

impl TurnMarker {
    /// Whether this entry was generated by the module.
    pub fn is_generated(&self) -> bool {
        !matches!(self, TurnMarker::Original)
    }

    /// The partition index, if this is a partition entry of `original`.
    pub fn partition_of(&self, original: CombatantId) -> Option<u32> {
        match self {
            TurnMarker::Partition {
                original_id,
                partition_index,
            } if *original_id == original => Some(*partition_index),
            _ => None,
        }
    }

    /// Whether this is the critical-bonus entry of `original`.
    pub fn bonus_of(&self, original: CombatantId) -> bool {
        matches!(self, TurnMarker::CriticalBonus { original_id } if *original_id == original)
    }
}

impl Default for TurnMarker {
    fn default() -> Self {
        TurnMarker::Original
    }
}

/// One-time critical adjustment guards on the *original* combatant.
///
/// Once set, a flag is never cleared for the combatant's lifetime; re-rolls
/// with a flag already set skip the adjustment and go straight to
/// re-partitioning. Both flags true at once is legal: a natural 20 on one
/// roll and a natural 1 on a later re-roll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalState {
    #[serde(default)]
    pub boost_applied: bool,
    #[serde(default)]
    pub debuff_applied: bool,
}

/// A participant's single turn-order entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub combat_id: CombatId,
    pub name: String,
    /// Host-owned actor backing this entry; absent for ad-hoc combatants.
    pub actor_id: Option<ActorId>,
    /// Composite initiative total; unset until rolled.
    pub initiative: Option<f64>,
    #[serde(default)]
    pub marker: TurnMarker,
    #[serde(default)]
    pub critical: CriticalState,
}

impl Combatant {
    /// Create an unrolled, user-owned combatant.
    pub fn new(combat_id: CombatId, name: impl Into<String>, actor_id: Option<ActorId>) -> Self {
        Self {
            id: CombatantId::new(),
            combat_id,
            name: name.into(),
            actor_id,
            initiative: None,
            marker: TurnMarker::Original,
            critical: CriticalState::default(),
        }
    }

    /// Clone this record as one of its own extra-turn entries.
    ///
    /// The clone gets a fresh id, the planned initiative, a name suffixed
    /// with the partition index, and cleared critical flags.
    pub fn as_partition(&self, partition_index: u32, initiative: f64) -> Self {
        Self {
            id: CombatantId::new(),
            combat_id: self.combat_id,
            name: format!("{} ({})", self.name, partition_index),
            actor_id: self.actor_id,
            initiative: Some(initiative),
            marker: TurnMarker::Partition {
                original_id: self.id,
                partition_index,
            },
            critical: CriticalState::default(),
        }
    }

    /// Clone this record as its critical-bonus entry.
    pub fn as_critical_bonus(&self, initiative: f64) -> Self {
        Self {
            id: CombatantId::new(),
            combat_id: self.combat_id,
            name: format!("{} (Critical)", self.name),
            actor_id: self.actor_id,
            initiative: Some(initiative),
            marker: TurnMarker::CriticalBonus { original_id: self.id },
            critical: CriticalState::default(),
        }
    }
}
