//! Environment-backed settings store.
//!
//! Reads `CELERITY_*` variables over the documented defaults, the same way
//! the host's own configuration surface would feed the module. Values are
//! validated on every load; the store never hands out settings the planner
//! cannot work with.

use std::str::FromStr;

use async_trait::async_trait;

use celerity_domain::{CriticalBonusScope, ModuleSettings};

use super::ports::{SettingsError, SettingsStore};

/// Settings store backed by process environment variables.
pub struct EnvSettings;

impl EnvSettings {
    /// Create the store, loading a `.env` file if one is present.
    pub fn new() -> Self {
        dotenvy::dotenv().ok();
        Self
    }

    fn read(&self) -> Result<ModuleSettings, SettingsError> {
        let mut settings = ModuleSettings::default();

        if let Some(enabled) = var_parsed::<bool>("CELERITY_ENABLED")? {
            settings.enabled = enabled;
        }
        if let Some(target) = var_parsed::<f64>("CELERITY_TARGET_INITIATIVE_BONUS")? {
            settings.target_initiative_bonus = target;
        }
        if let Some(max) = var_parsed::<u32>("CELERITY_MAX_PARTITION_COUNT")? {
            settings.max_partition_count = max;
        }
        if let Some(offset) = var_parsed::<f64>("CELERITY_PARTITION_OFFSET")? {
            settings.partition_offset = offset;
        }
        if let Some(boost) = var_parsed::<f64>("CELERITY_CRITICAL_BOOST")? {
            settings.critical_boost = boost;
        }
        if let Some(debuff) = var_parsed::<f64>("CELERITY_CRITICAL_DEBUFF")? {
            settings.critical_debuff = debuff;
        }
        if let Some(scope) = var_parsed::<CriticalBonusScope>("CELERITY_BONUS_SCOPE")? {
            settings.bonus_scope = scope;
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for EnvSettings {
    async fn load(&self) -> Result<ModuleSettings, SettingsError> {
        self.read()
    }
}

fn var_parsed<T: FromStr>(key: &str) -> Result<Option<T>, SettingsError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SettingsError::Invalid(format!("{key}='{raw}' could not be parsed"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(SettingsError::Store(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment is process-global, so the whole surface is exercised in
    // one test to avoid cross-test interference.
    #[test]
    fn reads_defaults_then_overrides_then_rejects() {
        let store = EnvSettings;

        let settings = store.read().unwrap();
        assert_eq!(settings, ModuleSettings::default());

        std::env::set_var("CELERITY_TARGET_INITIATIVE_BONUS", "35");
        std::env::set_var("CELERITY_MAX_PARTITION_COUNT", "4");
        std::env::set_var("CELERITY_BONUS_SCOPE", "per_combatant");
        let settings = store.read().unwrap();
        assert_eq!(settings.target_initiative_bonus, 35.0);
        assert_eq!(settings.max_partition_count, 4);
        assert_eq!(settings.bonus_scope, CriticalBonusScope::PerCombatant);

        std::env::set_var("CELERITY_MAX_PARTITION_COUNT", "1");
        assert!(matches!(
            store.read(),
            Err(SettingsError::Invalid(_))
        ));

        std::env::set_var("CELERITY_MAX_PARTITION_COUNT", "not-a-number");
        assert!(matches!(store.read(), Err(SettingsError::Invalid(_))));

        std::env::remove_var("CELERITY_TARGET_INITIATIVE_BONUS");
        std::env::remove_var("CELERITY_MAX_PARTITION_COUNT");
        std::env::remove_var("CELERITY_BONUS_SCOPE");
    }
}
