//! Partition Sync Service - reconciles a combatant's extra-turn entries
//! against the freshly computed plan.
//!
//! Synchronization is a full replace: every existing partition entry for the
//! original is deleted, then the planned set is recreated in ascending index
//! order. The entries momentarily disappear and reappear, but no stale value
//! from a prior roll can survive. Entry-level host failures are logged and
//! skipped; the next re-roll's full replace self-heals whatever was left
//! behind.
//!
//! The service also owns the natural-20 bonus entry: granted once per combat
//! (or per combatant, by configuration) during the opening round, expired
//! when the combat reaches round 2.

use std::sync::Arc;

use tracing::{debug, info, warn};

use celerity_domain::{
    Combatant, CombatId, CriticalBonusScope, ModuleSettings, PartitionPlan, TurnMarker,
};

use crate::infrastructure::ports::types::WriteSource;
use crate::infrastructure::ports::{CombatTracker, TrackerError};

/// Errors that abort a whole synchronization pass.
///
/// Entry-level create/delete failures are NOT in here; those are logged and
/// counted in the [`SyncReport`].
#[derive(Debug, thiserror::Error)]
pub enum PartitionSyncError {
    #[error("Combat not found: {0}")]
    MissingCombat(CombatId),

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// What a synchronization pass actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub deleted: usize,
    pub created: usize,
    /// Entry operations the host rejected; self-healed on the next re-roll.
    pub failed: usize,
}

/// Service keeping generated entries in line with the plan.
pub struct PartitionSyncService {
    tracker: Arc<dyn CombatTracker>,
}

impl PartitionSyncService {
    pub fn new(tracker: Arc<dyn CombatTracker>) -> Self {
        Self { tracker }
    }

    /// Replace the original's partition entries with the plan for `bonus`.
    ///
    /// Called only once the original's initiative has stabilized (no
    /// adjustment pending). Critical-bonus entries are never touched here.
    pub async fn sync_partitions(
        &self,
        original: &Combatant,
        bonus: f64,
        settings: &ModuleSettings,
    ) -> Result<SyncReport, PartitionSyncError> {
        let mut report = SyncReport::default();

        let entries = self.tracker.combatants(original.combat_id).await?;
        let stale: Vec<_> = entries
            .iter()
            .filter(|entry| entry.marker.partition_of(original.id).is_some())
            .map(|entry| entry.id)
            .collect();

        for id in stale {
            match self
                .tracker
                .delete_combatant(id, WriteSource::Synchronizer)
                .await
            {
                Ok(()) => report.deleted += 1,
                Err(error) => {
                    warn!(entry = %id, %error, "Failed to delete stale partition entry");
                    report.failed += 1;
                }
            }
        }

        let plan = PartitionPlan::build(bonus, settings);
        for turn in plan.turns() {
            let entry = original.as_partition(turn.index, turn.initiative);
            match self
                .tracker
                .create_combatant(entry, WriteSource::Synchronizer)
                .await
            {
                Ok(()) => report.created += 1,
                Err(error) => {
                    warn!(
                        original = %original.id,
                        index = turn.index,
                        %error,
                        "Failed to create partition entry"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            combatant = %original.id,
            bonus,
            deleted = report.deleted,
            created = report.created,
            failed = report.failed,
            "Partition set synchronized"
        );
        Ok(report)
    }

    /// Grant the natural-20 bonus entry, if the privilege is still open.
    ///
    /// Only valid during the opening round, and only while no bonus entry
    /// exists in scope. Initiative is `100 + max` over the original and its
    /// partitions, so the bonus turn always comes first. Returns whether an
    /// entry was created.
    pub async fn grant_critical_bonus(
        &self,
        original: &Combatant,
        settings: &ModuleSettings,
    ) -> Result<bool, PartitionSyncError> {
        let combat = self
            .tracker
            .combat(original.combat_id)
            .await?
            .ok_or(PartitionSyncError::MissingCombat(original.combat_id))?;

        if !combat.in_opening_round() {
            debug!(combat = %combat.id, round = combat.round, "Past the bonus-turn window");
            return Ok(false);
        }

        let entries = self.tracker.combatants(combat.id).await?;
        let claimed = match settings.bonus_scope {
            CriticalBonusScope::PerCombat => entries
                .iter()
                .any(|entry| matches!(entry.marker, TurnMarker::CriticalBonus { .. })),
            CriticalBonusScope::PerCombatant => {
                entries.iter().any(|entry| entry.marker.bonus_of(original.id))
            }
        };
        if claimed {
            debug!(combat = %combat.id, scope = %settings.bonus_scope, "Bonus turn already claimed");
            return Ok(false);
        }

        let highest = entries
            .iter()
            .filter(|entry| {
                entry.id == original.id || entry.marker.partition_of(original.id).is_some()
            })
            .filter_map(|entry| entry.initiative)
            .fold(None::<f64>, |best, value| {
                Some(best.map_or(value, |b| b.max(value)))
            });
        let Some(highest) = highest else {
            debug!(combatant = %original.id, "No initiative to anchor the bonus entry on");
            return Ok(false);
        };

        let bonus = original.as_critical_bonus(100.0 + highest);
        match self
            .tracker
            .create_combatant(bonus, WriteSource::Synchronizer)
            .await
        {
            Ok(()) => {
                info!(
                    combatant = %original.id,
                    initiative = 100.0 + highest,
                    "Granted critical bonus turn"
                );
                Ok(true)
            }
            Err(error) => {
                warn!(combatant = %original.id, %error, "Failed to create critical bonus entry");
                Ok(false)
            }
        }
    }

    /// Delete every critical-bonus entry in the combat.
    ///
    /// Round-boundary cleanup: the bonus turn is a round-1-only privilege.
    /// Entries are identified by marker, never by name.
    pub async fn expire_critical_bonuses(
        &self,
        combat_id: CombatId,
    ) -> Result<SyncReport, PartitionSyncError> {
        let mut report = SyncReport::default();

        let entries = self.tracker.combatants(combat_id).await?;
        for entry in entries
            .iter()
            .filter(|entry| matches!(entry.marker, TurnMarker::CriticalBonus { .. }))
        {
            match self
                .tracker
                .delete_combatant(entry.id, WriteSource::Synchronizer)
                .await
            {
                Ok(()) => report.deleted += 1,
                Err(error) => {
                    warn!(entry = %entry.id, %error, "Failed to expire critical bonus entry");
                    report.failed += 1;
                }
            }
        }

        if report.deleted > 0 || report.failed > 0 {
            info!(
                combat = %combat_id,
                expired = report.deleted,
                failed = report.failed,
                "Critical bonus entries expired"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockCombatTracker;
    use celerity_domain::{Combat, CombatId};
    use mockall::Sequence;

    fn original() -> Combatant {
        let mut combatant = Combatant::new(CombatId::new(), "Alice", None);
        combatant.initiative = Some(55.0);
        combatant
    }

    #[tokio::test]
    async fn full_replace_deletes_stale_before_creating() {
        let subject = original();
        let stale = subject.as_partition(1, 25.0);
        let stale_id = stale.id;
        let combat_id = subject.combat_id;
        let subject_id = subject.id;

        let mut tracker = MockCombatTracker::new();
        let mut seq = Sequence::new();

        let listed = vec![subject.clone(), stale];
        tracker
            .expect_combatants()
            .withf(move |id| *id == combat_id)
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(listed));
        tracker
            .expect_delete_combatant()
            .withf(move |id, source| *id == stale_id && *source == WriteSource::Synchronizer)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        tracker
            .expect_create_combatant()
            .withf(move |entry, source| {
                entry.marker.partition_of(subject_id) == Some(1)
                    && entry.initiative == Some(30.0)
                    && *source == WriteSource::Synchronizer
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        tracker
            .expect_create_combatant()
            .withf(move |entry, _| {
                entry.marker.partition_of(subject_id) == Some(2) && entry.initiative == Some(10.0)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let service = PartitionSyncService::new(Arc::new(tracker));
        let report = service
            .sync_partitions(&subject, 50.0, &ModuleSettings::default())
            .await
            .unwrap();

        assert_eq!(report.deleted, 1);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn below_target_bonus_only_clears_stale_entries() {
        let subject = original();
        let stale = subject.as_partition(1, 25.0);
        let stale_id = stale.id;

        let mut tracker = MockCombatTracker::new();
        let listed = vec![subject.clone(), stale];
        tracker
            .expect_combatants()
            .times(1)
            .return_once(move |_| Ok(listed));
        tracker
            .expect_delete_combatant()
            .withf(move |id, _| *id == stale_id)
            .times(1)
            .returning(|_, _| Ok(()));
        tracker.expect_create_combatant().never();

        let service = PartitionSyncService::new(Arc::new(tracker));
        let report = service
            .sync_partitions(&subject, 10.0, &ModuleSettings::default())
            .await
            .unwrap();

        assert_eq!(report.deleted, 1);
        assert_eq!(report.created, 0);
    }

    #[tokio::test]
    async fn entry_failures_do_not_abort_the_batch() {
        let subject = original();
        let subject_id = subject.id;

        let mut tracker = MockCombatTracker::new();
        let listed = vec![subject.clone()];
        tracker
            .expect_combatants()
            .times(1)
            .return_once(move |_| Ok(listed));
        tracker
            .expect_create_combatant()
            .withf(move |entry, _| entry.marker.partition_of(subject_id) == Some(1))
            .times(1)
            .returning(|_, _| Err(TrackerError::host("create", "permission denied")));
        tracker
            .expect_create_combatant()
            .withf(move |entry, _| entry.marker.partition_of(subject_id) == Some(2))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = PartitionSyncService::new(Arc::new(tracker));
        let report = service
            .sync_partitions(&subject, 50.0, &ModuleSettings::default())
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn bonus_is_not_granted_twice_per_combat() {
        let subject = original();
        let other = Combatant::new(subject.combat_id, "Bob", None);
        let existing_bonus = other.as_critical_bonus(120.0);
        let combat = Combat {
            id: subject.combat_id,
            round: 1,
        };

        let mut tracker = MockCombatTracker::new();
        tracker
            .expect_combat()
            .times(1)
            .return_once(move |_| Ok(Some(combat)));
        let listed = vec![subject.clone(), existing_bonus];
        tracker
            .expect_combatants()
            .times(1)
            .return_once(move |_| Ok(listed));
        tracker.expect_create_combatant().never();

        let service = PartitionSyncService::new(Arc::new(tracker));
        let granted = service
            .grant_critical_bonus(&subject, &ModuleSettings::default())
            .await
            .unwrap();

        assert!(!granted);
    }

    #[tokio::test]
    async fn per_combatant_scope_allows_a_second_roller() {
        let subject = original();
        let other = Combatant::new(subject.combat_id, "Bob", None);
        let existing_bonus = other.as_critical_bonus(120.0);
        let combat = Combat {
            id: subject.combat_id,
            round: 1,
        };
        let subject_id = subject.id;

        let mut tracker = MockCombatTracker::new();
        tracker
            .expect_combat()
            .times(1)
            .return_once(move |_| Ok(Some(combat)));
        let listed = vec![subject.clone(), existing_bonus];
        tracker
            .expect_combatants()
            .times(1)
            .return_once(move |_| Ok(listed));
        tracker
            .expect_create_combatant()
            .withf(move |entry, _| {
                entry.marker.bonus_of(subject_id) && entry.initiative == Some(155.0)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let settings = ModuleSettings {
            bonus_scope: CriticalBonusScope::PerCombatant,
            ..ModuleSettings::default()
        };
        let service = PartitionSyncService::new(Arc::new(tracker));
        let granted = service
            .grant_critical_bonus(&subject, &settings)
            .await
            .unwrap();

        assert!(granted);
    }

    #[tokio::test]
    async fn expiry_deletes_only_bonus_entries() {
        let subject = original();
        let partition = subject.as_partition(1, 30.0);
        let bonus = subject.as_critical_bonus(155.0);
        let bonus_id = bonus.id;
        let combat_id = subject.combat_id;

        let mut tracker = MockCombatTracker::new();
        let listed = vec![subject.clone(), partition, bonus];
        tracker
            .expect_combatants()
            .times(1)
            .return_once(move |_| Ok(listed));
        tracker
            .expect_delete_combatant()
            .withf(move |id, _| *id == bonus_id)
            .times(1)
            .returning(|_, _| Ok(()));

        let service = PartitionSyncService::new(Arc::new(tracker));
        let report = service.expire_critical_bonuses(combat_id).await.unwrap();

        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 0);
    }
}
