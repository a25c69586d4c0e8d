//! Celerity engine.
//!
//! Automation services for the host's combat tracker: critical roll
//! adjustments, partition synchronization, and the event router that wires
//! them to host notifications.
//!
//! ## Structure
//!
//! - `application/` - Services and the event router
//! - `infrastructure/` - Host-facing ports and their adapters

pub mod application;
pub mod infrastructure;

pub use application::services::{CriticalAdjustmentService, PartitionSyncService};
pub use application::EventRouter;
pub use infrastructure::env_settings::EnvSettings;
pub use infrastructure::memory_tracker::InMemoryTracker;
pub use infrastructure::ports::{
    CombatTracker, CombatantUpdate, CriticalKind, SettingsError, SettingsStore, TrackerError,
    TrackerEvent, WriteSource,
};
