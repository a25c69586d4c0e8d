//! Event Router - feeds host tracker notifications to the automation
//! pipeline in the right order.
//!
//! The host delivers notifications serially, but every write this module
//! performs is re-notified too. The router filters by the write's source tag
//! rather than by timing:
//!
//! - `Synchronizer` events (partition/bonus create/delete) are ignored.
//! - A `CriticalAdjustment` event means the initiative value has stabilized;
//!   partition planning runs against it, and a natural-20 adjustment may
//!   claim the bonus turn.
//! - An `External` event (user roll or re-roll) runs classification first.
//!   When an adjustment fires, the pipeline stops and resumes on the
//!   adjustment's own follow-up notification, so planning never reads a
//!   pre-adjustment value.
//!
//! Only the game-master session automates; the router is a no-op otherwise.
//! Nothing here escalates to a hard failure - every error degrades to
//! "do less than requested" and is logged.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use celerity_domain::{Combat, Combatant, DecomposedRoll, ModuleSettings, SessionRole};

use crate::application::services::{
    AdjustmentOutcome, CriticalAdjustmentService, PartitionSyncService,
};
use crate::infrastructure::ports::types::{CriticalKind, TrackerEvent, WriteSource};
use crate::infrastructure::ports::{CombatTracker, SettingsStore, TrackerError};

/// Router subscribing the automation pipeline to tracker notifications.
pub struct EventRouter {
    tracker: Arc<dyn CombatTracker>,
    settings: Arc<dyn SettingsStore>,
    adjuster: CriticalAdjustmentService,
    synchronizer: PartitionSyncService,
    role: SessionRole,
}

impl EventRouter {
    pub fn new(
        tracker: Arc<dyn CombatTracker>,
        settings: Arc<dyn SettingsStore>,
        role: SessionRole,
    ) -> Self {
        let adjuster = CriticalAdjustmentService::new(Arc::clone(&tracker));
        let synchronizer = PartitionSyncService::new(Arc::clone(&tracker));
        Self {
            tracker,
            settings,
            adjuster,
            synchronizer,
            role,
        }
    }

    /// Run the router until the notification stream closes (spawned as a
    /// background task).
    pub async fn run(self, mut events: broadcast::Receiver<TrackerEvent>) {
        info!(role = ?self.role, "Starting initiative event router");

        loop {
            match events.recv().await {
                Ok(event) => self.dispatch(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification stream lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Notification stream closed, stopping router");
                    break;
                }
            }
        }
    }

    /// Process buffered notifications until the stream is quiescent.
    ///
    /// Used by scripted hosts and tests: cascaded notifications from the
    /// router's own writes are handled before this returns.
    pub async fn drain(&self, events: &mut broadcast::Receiver<TrackerEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.dispatch(event).await,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification stream lagged; events dropped");
                }
                Err(_) => break,
            }
        }
    }

    /// Handle one notification; failures are logged, never raised.
    pub async fn dispatch(&self, event: TrackerEvent) {
        if let Err(error) = self.handle(event).await {
            warn!(%error, "Initiative automation step failed");
        }
    }

    async fn handle(&self, event: TrackerEvent) -> anyhow::Result<()> {
        match event {
            TrackerEvent::CombatantUpdated {
                combatant, source, ..
            } => self.on_initiative_changed(combatant, source).await,
            TrackerEvent::CombatantCreated { combatant, source } => {
                // A combatant dragged in with a pre-rolled initiative runs
                // the normal pipeline; module-created entries do not.
                if source.is_module() || combatant.initiative.is_none() {
                    return Ok(());
                }
                self.on_initiative_changed(combatant, WriteSource::External)
                    .await
            }
            TrackerEvent::RoundAdvanced { combat } => self.on_round_advanced(combat).await,
            TrackerEvent::CombatDeleted { combat_id } => {
                debug!(combat = %combat_id, "Combat deleted; host removes the owned entries");
                Ok(())
            }
        }
    }

    async fn on_initiative_changed(
        &self,
        notified: Combatant,
        source: WriteSource,
    ) -> anyhow::Result<()> {
        if !self.role.is_game_master() {
            return Ok(());
        }
        if matches!(source, WriteSource::Synchronizer) {
            return Ok(());
        }
        // Generated entries never trigger further generation.
        if notified.marker.is_generated() {
            return Ok(());
        }

        let Some(settings) = self.enabled_settings().await else {
            return Ok(());
        };

        // Re-read the stored record: notifications can replay or arrive
        // stale, and the flags on the stored record are the idempotency
        // guard.
        let Some(combatant) = self.tracker.combatant(notified.id).await? else {
            debug!(combatant = %notified.id, "Combatant vanished mid-pipeline");
            return Ok(());
        };
        let Some(total) = combatant.initiative else {
            return Ok(());
        };

        if self.tracker.combat(combatant.combat_id).await?.is_none() {
            debug!(combat = %combatant.combat_id, "Combat vanished mid-pipeline");
            return Ok(());
        }

        let Some(modifier) = self.modifier_of(&combatant).await? else {
            debug!(combatant = %combatant.id, "No static modifier available; skipping");
            return Ok(());
        };

        match source {
            WriteSource::Synchronizer => Ok(()),
            WriteSource::CriticalAdjustment { kind } => {
                // The adjustment write has landed; initiative is stable.
                self.synchronizer
                    .sync_partitions(&combatant, modifier, &settings)
                    .await?;
                if kind == CriticalKind::Natural20 {
                    self.synchronizer
                        .grant_critical_bonus(&combatant, &settings)
                        .await?;
                }
                Ok(())
            }
            WriteSource::External => {
                let roll = DecomposedRoll::decompose(total, modifier);
                match self
                    .adjuster
                    .apply(&combatant, total, roll.classification, &settings)
                    .await?
                {
                    AdjustmentOutcome::Applied(kind) => {
                        debug!(
                            combatant = %combatant.id,
                            ?kind,
                            "Adjustment written; planning resumes on its notification"
                        );
                        Ok(())
                    }
                    AdjustmentOutcome::Skipped => {
                        self.synchronizer
                            .sync_partitions(&combatant, modifier, &settings)
                            .await?;
                        Ok(())
                    }
                }
            }
        }
    }

    async fn on_round_advanced(&self, combat: Combat) -> anyhow::Result<()> {
        if !self.role.is_game_master() {
            return Ok(());
        }
        let Some(_settings) = self.enabled_settings().await else {
            return Ok(());
        };

        if combat.round >= 2 {
            self.synchronizer.expire_critical_bonuses(combat.id).await?;
        }
        Ok(())
    }

    /// Loaded settings, or `None` when the module should stay quiet.
    async fn enabled_settings(&self) -> Option<ModuleSettings> {
        match self.settings.load().await {
            Ok(settings) if settings.enabled => Some(settings),
            Ok(_) => None,
            Err(error) => {
                debug!(%error, "Settings unavailable; skipping notification");
                None
            }
        }
    }

    async fn modifier_of(&self, combatant: &Combatant) -> Result<Option<f64>, TrackerError> {
        match combatant.actor_id {
            Some(actor_id) => self.tracker.actor_modifier(actor_id).await,
            None => Ok(None),
        }
    }
}
