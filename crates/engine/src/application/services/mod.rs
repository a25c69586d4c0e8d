//! Application services - the automation use cases.
//!
//! Each service takes its tracker dependency as `Arc<dyn CombatTracker>` and
//! returns domain-level results; the event router owns ordering between them.

pub mod critical_adjustment_service;
pub mod partition_sync_service;

pub use critical_adjustment_service::{
    AdjustmentOutcome, CriticalAdjustError, CriticalAdjustmentService,
};
pub use partition_sync_service::{PartitionSyncError, PartitionSyncService, SyncReport};
