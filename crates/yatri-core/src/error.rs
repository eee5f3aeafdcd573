use crate::status::IdentityStatus;

/// Core registry errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: IdentityStatus,
        to: IdentityStatus,
    },

    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}
