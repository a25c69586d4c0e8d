//! Module settings - supplied by the host's configuration store, read-only
//! to the rules core.
//!
//! Settings are validated at the adapter boundary (`ModuleSettings::validate`);
//! the planner and services assume validated values.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Scope of the natural-20 bonus-turn privilege.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalBonusScope {
    /// One bonus entry per combat; the first critical roller wins.
    #[default]
    PerCombat,
    /// One bonus entry per combatant.
    PerCombatant,
}

impl std::fmt::Display for CriticalBonusScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriticalBonusScope::PerCombat => write!(f, "per_combat"),
            CriticalBonusScope::PerCombatant => write!(f, "per_combatant"),
        }
    }
}

impl std::str::FromStr for CriticalBonusScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_combat" | "combat" => Ok(CriticalBonusScope::PerCombat),
            "per_combatant" | "combatant" => Ok(CriticalBonusScope::PerCombatant),
            other => Err(DomainError::validation(format!(
                "Unknown critical bonus scope: {other}"
            ))),
        }
    }
}

/// Process-wide module configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModuleSettings {
    /// Master switch; when false every notification is a no-op.
    pub enabled: bool,
    /// Minimum static initiative bonus for extra turns.
    pub target_initiative_bonus: f64,
    /// Upper bound on generated entries, original included. Must be >= 2.
    pub max_partition_count: u32,
    /// Initiative decrement per extra turn. Must be > 0.
    pub partition_offset: f64,
    /// Added to initiative on a natural 20.
    pub critical_boost: f64,
    /// Subtracted from initiative on a natural 1.
    pub critical_debuff: f64,
    pub bonus_scope: CriticalBonusScope,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            target_initiative_bonus: 21.0,
            max_partition_count: 3,
            partition_offset: 20.0,
            critical_boost: 10.0,
            critical_debuff: 10.0,
            bonus_scope: CriticalBonusScope::PerCombat,
        }
    }
}

impl ModuleSettings {
    /// Reject values the planner cannot work with.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_partition_count < 2 {
            return Err(DomainError::validation(format!(
                "maxPartitionCount must be at least 2, got {}",
                self.max_partition_count
            )));
        }
        if !(self.partition_offset > 0.0) {
            return Err(DomainError::validation(format!(
                "partitionOffset must be positive, got {}",
                self.partition_offset
            )));
        }
        Ok(())
    }
}
