//! Error types for port operations.

/// Host tracker operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Record not found - includes entity type and ID for actionable messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Host rejected or failed an operation - includes the operation name.
    #[error("Host error in {operation}: {message}")]
    Host {
        operation: &'static str,
        message: String,
    },
}

impl TrackerError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Host error with operation context.
    pub fn host(operation: &'static str, message: impl ToString) -> Self {
        Self::Host {
            operation,
            message: message.to_string(),
        }
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors from the host's configuration store.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings store error: {0}")]
    Store(String),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

impl From<celerity_domain::DomainError> for SettingsError {
    fn from(err: celerity_domain::DomainError) -> Self {
        Self::Invalid(err.to_string())
    }
}
