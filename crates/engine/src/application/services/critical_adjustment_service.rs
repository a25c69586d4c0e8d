//! Critical Adjustment Service - one-time boosts and debuffs for critical
//! initiative rolls.
//!
//! A natural 20 adds `critical_boost` to the combatant's stored initiative;
//! a natural 1 subtracts `critical_debuff`. Each fires at most once per
//! combatant lifetime, guarded by the flags on the record itself, so a
//! replayed notification is a no-op. The adjustment is a single tracker
//! write tagged `WriteSource::CriticalAdjustment`; the host's follow-up
//! notification for that write is what resumes the pipeline with a stable
//! initiative value.

use std::sync::Arc;

use tracing::{debug, info};

use celerity_domain::{Combatant, CriticalState, ModuleSettings, RollClassification};

use crate::infrastructure::ports::types::{CombatantUpdate, CriticalKind, WriteSource};
use crate::infrastructure::ports::{CombatTracker, TrackerError};

/// Errors from applying a critical adjustment.
#[derive(Debug, thiserror::Error)]
pub enum CriticalAdjustError {
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// What the adjuster did with a classified roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentOutcome {
    /// One write was performed; wait for its follow-up notification.
    Applied(CriticalKind),
    /// Nothing to do: not a critical roll, or already adjusted.
    Skipped,
}

/// Service applying the one-time critical boost/debuff.
pub struct CriticalAdjustmentService {
    tracker: Arc<dyn CombatTracker>,
}

impl CriticalAdjustmentService {
    pub fn new(tracker: Arc<dyn CombatTracker>) -> Self {
        Self { tracker }
    }

    /// Apply the adjustment for a combatant whose initiative was just set to
    /// `total`, if its classification qualifies and the matching flag is
    /// still unset.
    pub async fn apply(
        &self,
        combatant: &Combatant,
        total: f64,
        classification: RollClassification,
        settings: &ModuleSettings,
    ) -> Result<AdjustmentOutcome, CriticalAdjustError> {
        match classification {
            RollClassification::Natural20 if !combatant.critical.boost_applied => {
                let adjusted = total + settings.critical_boost;
                let update = CombatantUpdate {
                    id: combatant.id,
                    initiative: Some(adjusted),
                    critical: Some(CriticalState {
                        boost_applied: true,
                        ..combatant.critical
                    }),
                };
                self.tracker
                    .update_combatant(
                        update,
                        WriteSource::CriticalAdjustment {
                            kind: CriticalKind::Natural20,
                        },
                    )
                    .await?;

                info!(
                    combatant = %combatant.id,
                    total,
                    adjusted,
                    "Applied natural 20 initiative boost"
                );
                Ok(AdjustmentOutcome::Applied(CriticalKind::Natural20))
            }
            RollClassification::Natural1 if !combatant.critical.debuff_applied => {
                let adjusted = total - settings.critical_debuff;
                let update = CombatantUpdate {
                    id: combatant.id,
                    initiative: Some(adjusted),
                    critical: Some(CriticalState {
                        debuff_applied: true,
                        ..combatant.critical
                    }),
                };
                self.tracker
                    .update_combatant(
                        update,
                        WriteSource::CriticalAdjustment {
                            kind: CriticalKind::Natural1,
                        },
                    )
                    .await?;

                info!(
                    combatant = %combatant.id,
                    total,
                    adjusted,
                    "Applied natural 1 initiative debuff"
                );
                Ok(AdjustmentOutcome::Applied(CriticalKind::Natural1))
            }
            _ => {
                debug!(
                    combatant = %combatant.id,
                    ?classification,
                    "No critical adjustment to apply"
                );
                Ok(AdjustmentOutcome::Skipped)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockCombatTracker;
    use celerity_domain::CombatId;

    fn combatant() -> Combatant {
        Combatant::new(CombatId::new(), "Alice", None)
    }

    #[tokio::test]
    async fn natural_20_boosts_once() {
        let subject = combatant();
        let id = subject.id;

        let mut tracker = MockCombatTracker::new();
        tracker
            .expect_update_combatant()
            .withf(move |update, source| {
                update.id == id
                    && update.initiative == Some(30.0)
                    && update.critical.map(|c| c.boost_applied) == Some(true)
                    && matches!(
                        source,
                        WriteSource::CriticalAdjustment {
                            kind: CriticalKind::Natural20
                        }
                    )
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = CriticalAdjustmentService::new(Arc::new(tracker));
        let outcome = service
            .apply(
                &subject,
                20.0,
                RollClassification::Natural20,
                &ModuleSettings::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, AdjustmentOutcome::Applied(CriticalKind::Natural20));
    }

    #[tokio::test]
    async fn boost_flag_blocks_a_second_application() {
        let mut subject = combatant();
        subject.critical.boost_applied = true;

        let mut tracker = MockCombatTracker::new();
        tracker.expect_update_combatant().never();

        let service = CriticalAdjustmentService::new(Arc::new(tracker));
        let outcome = service
            .apply(
                &subject,
                30.0,
                RollClassification::Natural20,
                &ModuleSettings::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, AdjustmentOutcome::Skipped);
    }

    #[tokio::test]
    async fn natural_1_debuffs_below_zero() {
        let subject = combatant();

        let mut tracker = MockCombatTracker::new();
        tracker
            .expect_update_combatant()
            .withf(|update, _| update.initiative == Some(-9.0))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = CriticalAdjustmentService::new(Arc::new(tracker));
        let outcome = service
            .apply(
                &subject,
                1.0,
                RollClassification::Natural1,
                &ModuleSettings::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, AdjustmentOutcome::Applied(CriticalKind::Natural1));
    }

    #[tokio::test]
    async fn normal_rolls_are_skipped() {
        let subject = combatant();

        let mut tracker = MockCombatTracker::new();
        tracker.expect_update_combatant().never();

        let service = CriticalAdjustmentService::new(Arc::new(tracker));
        let outcome = service
            .apply(
                &subject,
                15.0,
                RollClassification::Normal,
                &ModuleSettings::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, AdjustmentOutcome::Skipped);
    }

    #[tokio::test]
    async fn debuff_still_applies_after_an_earlier_boost() {
        // Both flags true at once is legal: nat 20 first roll, nat 1 re-roll.
        let mut subject = combatant();
        subject.critical.boost_applied = true;

        let mut tracker = MockCombatTracker::new();
        tracker
            .expect_update_combatant()
            .withf(|update, _| {
                update
                    .critical
                    .map(|c| c.boost_applied && c.debuff_applied)
                    == Some(true)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = CriticalAdjustmentService::new(Arc::new(tracker));
        let outcome = service
            .apply(
                &subject,
                5.0,
                RollClassification::Natural1,
                &ModuleSettings::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, AdjustmentOutcome::Applied(CriticalKind::Natural1));
    }
}
