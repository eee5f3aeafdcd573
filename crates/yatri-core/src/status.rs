use std::fmt;

use crate::error::CoreError;

/// The lifecycle states of an identity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IdentityStatus {
    /// Record is live: verifiable, trip-eligible once verified.
    Active,
    /// Record is temporarily suspended by an admin.
    Suspended,
    /// Record has been permanently revoked. Final state.
    Revoked,
    /// Record has expired. Final state.
    Expired,
}

impl IdentityStatus {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Revoked | Self::Expired)
    }
}

impl fmt::Display for IdentityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Suspended => write!(f, "Suspended"),
            Self::Revoked => write!(f, "Revoked"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

/// Validates admin-driven status transitions.
///
/// Valid transitions:
/// - Active → Suspended
/// - Active → Revoked
/// - Active → Expired
/// - Suspended → Active (reinstatement)
/// - Suspended → Revoked
/// - Suspended → Expired
///
/// Revoked and Expired admit no outgoing transitions. Self-transitions
/// are rejected.
pub struct StatusTransitions;

impl StatusTransitions {
    /// Check a transition, returning the target status on success.
    pub fn check(
        from: IdentityStatus,
        to: IdentityStatus,
    ) -> Result<IdentityStatus, CoreError> {
        let valid = matches!(
            (from, to),
            (IdentityStatus::Active, IdentityStatus::Suspended)
                | (IdentityStatus::Active, IdentityStatus::Revoked)
                | (IdentityStatus::Active, IdentityStatus::Expired)
                | (IdentityStatus::Suspended, IdentityStatus::Active)
                | (IdentityStatus::Suspended, IdentityStatus::Revoked)
                | (IdentityStatus::Suspended, IdentityStatus::Expired)
        );

        if !valid {
            return Err(CoreError::InvalidStatusTransition { from, to });
        }

        tracing::debug!(from = %from, to = %to, "identity status transition");
        Ok(to)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(from: IdentityStatus, to: IdentityStatus) -> bool {
        Self::check(from, to).is_ok()
    }
}

/// The states of a record's trip lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TripState {
    /// Trip registered but not yet begun.
    NotStarted,
    /// Trip is underway; the subject is under active monitoring.
    Active,
    /// Trip has concluded. Final state for the record's single trip.
    Ended,
}

impl fmt::Display for TripState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NotStarted"),
            Self::Active => write!(f, "Active"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}
