//! Registry error kinds.

/// Expected failures of registry operations.
///
/// Lock poisoning is not represented here: it means a writer panicked
/// mid-mutation and the process cannot trust the store anymore.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Malformed registration payload.
    #[error("invalid registration: {0}")]
    Validation(String),

    /// No record with the given instance id.
    #[error("Service '{0}' not found")]
    NotFound(String),

    /// No `UP` instance for the given service name.
    #[error("Service '{0}' not found or unavailable")]
    NoInstance(String),
}
