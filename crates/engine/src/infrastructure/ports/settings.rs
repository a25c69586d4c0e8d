//! Configuration store port.

use async_trait::async_trait;

use celerity_domain::ModuleSettings;

use super::error::SettingsError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the current, validated module settings.
    async fn load(&self) -> Result<ModuleSettings, SettingsError>;
}
