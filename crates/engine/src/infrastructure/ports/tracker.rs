//! Host tracker port.
//!
//! The ONLY way the module touches combat state. Writes are acknowledged:
//! the returned future resolves once the host has applied the write, which
//! replaces the timed settling pauses older automation relied on. Every
//! write carries a [`WriteSource`] so the host can echo it back on the
//! resulting notification.

use async_trait::async_trait;

use celerity_domain::{ActorId, Combat, Combatant, CombatId, CombatantId};

use super::error::TrackerError;
use super::types::{CombatantUpdate, WriteSource};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CombatTracker: Send + Sync {
    // Reads
    async fn combat(&self, id: CombatId) -> Result<Option<Combat>, TrackerError>;
    async fn combatant(&self, id: CombatantId) -> Result<Option<Combatant>, TrackerError>;
    /// The combat's live collection, in tracker order.
    async fn combatants(&self, combat_id: CombatId) -> Result<Vec<Combatant>, TrackerError>;
    /// The static initiative modifier of a host-owned actor, if known.
    async fn actor_modifier(&self, actor_id: ActorId) -> Result<Option<f64>, TrackerError>;

    // Writes (acknowledged; the host re-notifies with the same source tag)
    async fn update_combatant(
        &self,
        update: CombatantUpdate,
        source: WriteSource,
    ) -> Result<(), TrackerError>;
    async fn create_combatant(
        &self,
        combatant: Combatant,
        source: WriteSource,
    ) -> Result<(), TrackerError>;
    async fn delete_combatant(
        &self,
        id: CombatantId,
        source: WriteSource,
    ) -> Result<(), TrackerError>;
}
