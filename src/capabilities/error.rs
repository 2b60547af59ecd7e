//! Registry errors.

use thiserror::Error;

use super::capability::CapabilityFailure;

/// Errors surfaced at the registry boundary.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The requested capability is not registered.
    #[error("Capability '{0}' not found")]
    NotFound(String),

    /// The capability ran and reported a failure of its own.
    #[error("{failure}")]
    Execution {
        capability: String,
        #[source]
        failure: CapabilityFailure,
    },
}

impl RegistryError {
    /// Whether the caller asked for something that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
