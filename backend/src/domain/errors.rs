use thiserror::Error;

/// Error taxonomy surfaced by the domain services.
///
/// Validation, NotFound and Conflict translate to client-error responses at
/// the REST boundary; Internal covers unexpected storage faults and maps to a
/// server error. Dependency marks a notification channel failure and is only
/// ever logged, never returned from a request handler.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed or out-of-policy input
    #[error("{0}")]
    Validation(String),

    /// Referenced family, unit, member or payment does not exist
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation surfaced by the store
    #[error("{0}")]
    Conflict(String),

    /// Notification channel unavailable; always non-fatal
    #[error("notification channel unavailable: {0}")]
    Dependency(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }
}

/// Map a storage error to Conflict when it is a unique-constraint violation,
/// otherwise pass it through as Internal.
pub fn conflict_on_unique(err: anyhow::Error, message: &str) -> DomainError {
    let is_unique = err
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if is_unique {
        DomainError::Conflict(message.to_string())
    } else {
        DomainError::Internal(err)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_on_unique_passes_through_other_errors() {
        let err = anyhow::anyhow!("disk on fire");
        let mapped = conflict_on_unique(err, "already exists");
        assert!(matches!(mapped, DomainError::Internal(_)));
    }

    #[test]
    fn test_error_messages_render_plainly() {
        let err = DomainError::validation("Amount must be at least ₹25");
        assert_eq!(err.to_string(), "Amount must be at least ₹25");

        let err = DomainError::not_found("Family not found");
        assert_eq!(err.to_string(), "Family not found");
    }
}
