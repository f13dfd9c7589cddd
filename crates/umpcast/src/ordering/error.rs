use super::domain::EntityId;

/// Failures raised by an order store while reading or committing a scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("timed out waiting for the scope lock")]
    LockTimeout,
    #[error("staged write conflicts with stored state: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Error enumeration for ordering operations.
///
/// Validation variants are raised before anything is staged; only
/// `TransactionAborted` can happen after writes were staged, and in that case
/// the whole batch was discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    #[error("missing parameters")]
    MissingParameter,
    #[error("a valid integer is required")]
    InvalidType,
    #[error("order value out of range")]
    OutOfRange { order: i64, min: u32, max: u32 },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: EntityId },
    #[error("scope has no members")]
    EmptyScope,
    #[error("transaction aborted: {0}")]
    TransactionAborted(#[from] StoreError),
}

impl OrderingError {
    /// The caller sent something that cannot succeed until the input changes.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter
                | Self::InvalidType
                | Self::OutOfRange { .. }
                | Self::NotFound { .. }
        )
    }

    /// The operation may succeed if repeated unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionAborted(_))
    }
}
