//! In-memory tracker implementation for development and testing.
//!
//! Plays the part of the host application: it owns combat and combatant
//! records, applies acknowledged writes, and re-notifies subscribers of
//! every change - including the module's own writes, echoed back with their
//! source tag, exactly like the real host's notification cycle.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;

use celerity_domain::{ActorId, Combat, Combatant, CombatId, CombatantId};

use super::ports::types::{CombatantUpdate, TrackerEvent, WriteSource};
use super::ports::{CombatTracker, TrackerError};

/// Capacity of the notification channel; a lagging subscriber drops the
/// oldest events and is warned by the router.
const EVENT_CHANNEL_CAPACITY: usize = 256;

struct Stored {
    combatant: Combatant,
    /// Insertion sequence; the tracker lists combatants in creation order.
    seq: u64,
}

/// In-memory host tracker.
pub struct InMemoryTracker {
    combats: DashMap<CombatId, Combat>,
    combatants: DashMap<CombatantId, Stored>,
    modifiers: DashMap<ActorId, f64>,
    next_seq: AtomicU64,
    events: broadcast::Sender<TrackerEvent>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            combats: DashMap::new(),
            combatants: DashMap::new(),
            modifiers: DashMap::new(),
            next_seq: AtomicU64::new(0),
            events,
        }
    }

    /// Subscribe to lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// Host action: create a combat that has not started yet.
    pub fn create_combat(&self) -> Combat {
        let combat = Combat::new(CombatId::new());
        self.combats.insert(combat.id, combat.clone());
        combat
    }

    /// Host action: register an actor with a static initiative modifier.
    pub fn register_actor(&self, modifier: f64) -> ActorId {
        let id = ActorId::new();
        self.modifiers.insert(id, modifier);
        id
    }

    /// Host action: add a user-owned combatant to a combat.
    pub fn add_combatant(
        &self,
        combat_id: CombatId,
        name: impl Into<String>,
        actor_id: Option<ActorId>,
    ) -> Result<Combatant, TrackerError> {
        if !self.combats.contains_key(&combat_id) {
            return Err(TrackerError::not_found("Combat", combat_id));
        }

        let combatant = Combatant::new(combat_id, name, actor_id);
        self.insert(combatant.clone());
        self.emit(TrackerEvent::CombatantCreated {
            combatant: combatant.clone(),
            source: WriteSource::External,
        });
        Ok(combatant)
    }

    /// Host action: a user rolls or re-rolls initiative.
    pub fn set_initiative(&self, id: CombatantId, value: f64) -> Result<(), TrackerError> {
        self.apply_update(CombatantUpdate::initiative(id, value), WriteSource::External)
    }

    /// Host action: advance the combat to its next round.
    pub fn advance_round(&self, combat_id: CombatId) -> Result<Combat, TrackerError> {
        let combat = {
            let mut entry = self
                .combats
                .get_mut(&combat_id)
                .ok_or_else(|| TrackerError::not_found("Combat", combat_id))?;
            entry.round += 1;
            entry.value().clone()
        };

        self.emit(TrackerEvent::RoundAdvanced {
            combat: combat.clone(),
        });
        Ok(combat)
    }

    /// Host action: delete a combat; its combatants go with it.
    pub fn delete_combat(&self, combat_id: CombatId) -> Result<(), TrackerError> {
        self.combats
            .remove(&combat_id)
            .ok_or_else(|| TrackerError::not_found("Combat", combat_id))?;
        self.combatants
            .retain(|_, stored| stored.combatant.combat_id != combat_id);
        self.emit(TrackerEvent::CombatDeleted { combat_id });
        Ok(())
    }

    fn insert(&self, combatant: Combatant) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.combatants.insert(combatant.id, Stored { combatant, seq });
    }

    fn emit(&self, event: TrackerEvent) {
        // No subscribers is fine; the host does not care.
        let _ = self.events.send(event);
    }

    fn apply_update(
        &self,
        update: CombatantUpdate,
        source: WriteSource,
    ) -> Result<(), TrackerError> {
        let (combatant, previous_initiative) = {
            let mut entry = self
                .combatants
                .get_mut(&update.id)
                .ok_or_else(|| TrackerError::not_found("Combatant", update.id))?;

            let previous = entry.combatant.initiative;
            if let Some(initiative) = update.initiative {
                entry.combatant.initiative = Some(initiative);
            }
            if let Some(critical) = update.critical {
                entry.combatant.critical = critical;
            }
            (entry.combatant.clone(), previous)
        };

        self.emit(TrackerEvent::CombatantUpdated {
            combatant,
            previous_initiative,
            source,
        });
        Ok(())
    }
}

impl Default for InMemoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CombatTracker for InMemoryTracker {
    async fn combat(&self, id: CombatId) -> Result<Option<Combat>, TrackerError> {
        Ok(self.combats.get(&id).map(|entry| entry.value().clone()))
    }

    async fn combatant(&self, id: CombatantId) -> Result<Option<Combatant>, TrackerError> {
        Ok(self
            .combatants
            .get(&id)
            .map(|stored| stored.combatant.clone()))
    }

    async fn combatants(&self, combat_id: CombatId) -> Result<Vec<Combatant>, TrackerError> {
        let mut entries: Vec<(u64, Combatant)> = self
            .combatants
            .iter()
            .filter(|stored| stored.combatant.combat_id == combat_id)
            .map(|stored| (stored.seq, stored.combatant.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, combatant)| combatant).collect())
    }

    async fn actor_modifier(&self, actor_id: ActorId) -> Result<Option<f64>, TrackerError> {
        Ok(self.modifiers.get(&actor_id).map(|modifier| *modifier.value()))
    }

    async fn update_combatant(
        &self,
        update: CombatantUpdate,
        source: WriteSource,
    ) -> Result<(), TrackerError> {
        self.apply_update(update, source)
    }

    async fn create_combatant(
        &self,
        combatant: Combatant,
        source: WriteSource,
    ) -> Result<(), TrackerError> {
        if !self.combats.contains_key(&combatant.combat_id) {
            return Err(TrackerError::not_found("Combat", combatant.combat_id));
        }

        self.insert(combatant.clone());
        self.emit(TrackerEvent::CombatantCreated { combatant, source });
        Ok(())
    }

    async fn delete_combatant(
        &self,
        id: CombatantId,
        _source: WriteSource,
    ) -> Result<(), TrackerError> {
        self.combatants
            .remove(&id)
            .ok_or_else(|| TrackerError::not_found("Combatant", id))?;
        Ok(())
    }
}
