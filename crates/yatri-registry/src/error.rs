use std::fmt;

use yatri_core::{
    ExternalIdHash, IdentityStatus, Principal, RegistryId, Role, VerifierId,
};

/// Broad failure classes of registry operations. Outer surfaces map these
/// onto their own status vocabulary (the HTTP API maps them to status
/// codes); the specific variant carries the operation-level detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed or violates a uniqueness rule.
    Validation,
    /// The caller lacks the role or ownership the operation requires.
    Authorization,
    /// The target exists but is in a state that forbids the operation.
    State,
    /// The addressed record, owner, or verifier does not exist.
    NotFound,
    /// The registry is paused and the operation is gated.
    Paused,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Authorization => write!(f, "authorization"),
            Self::State => write!(f, "state"),
            Self::NotFound => write!(f, "not_found"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// Registry operation errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("owner already has a registered identity: {0}")]
    DuplicateOwner(Principal),

    #[error("external id hash already registered: {0}")]
    DuplicateExternalId(ExternalIdHash),

    #[error("verifier already registered: {0}")]
    DuplicateVerifier(Principal),

    #[error("emergency contact limit reached ({limit})")]
    ContactLimitExceeded { limit: usize },

    #[error("a non-empty reason is required")]
    ReasonRequired,

    #[error("batch of {size} exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("planned trip end must be after planned start")]
    InvalidTripWindow,

    #[error("trip group size must be at least 1")]
    InvalidGroupSize,

    #[error("{principal} does not hold the {role} role")]
    MissingRole { principal: Principal, role: Role },

    #[error("{principal} is not the owner of record {id}")]
    NotOwner { principal: Principal, id: RegistryId },

    #[error("access denied for {0}")]
    AccessDenied(Principal),

    #[error("record {0} is already verified")]
    AlreadyVerified(RegistryId),

    #[error("record {id} is not active (status: {status})")]
    RecordNotActive {
        id: RegistryId,
        status: IdentityStatus,
    },

    #[error("record {0} is not verified")]
    NotVerified(RegistryId),

    #[error("trip for record {0} is already active")]
    TripAlreadyActive(RegistryId),

    #[error("trip for record {0} has already ended")]
    TripAlreadyEnded(RegistryId),

    #[error("trip for record {0} has not started")]
    TripNotStarted(RegistryId),

    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: IdentityStatus,
        to: IdentityStatus,
    },

    #[error("record not found: {0}")]
    RecordNotFound(RegistryId),

    #[error("no record registered for owner: {0}")]
    OwnerNotFound(Principal),

    #[error("no record registered for external id hash: {0}")]
    ExternalIdNotFound(ExternalIdHash),

    #[error("verifier not found: {0}")]
    VerifierNotFound(VerifierId),

    #[error("registry is paused")]
    RegistryPaused,
}

impl RegistryError {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateOwner(_)
            | Self::DuplicateExternalId(_)
            | Self::DuplicateVerifier(_)
            | Self::ContactLimitExceeded { .. }
            | Self::ReasonRequired
            | Self::BatchTooLarge { .. }
            | Self::InvalidTripWindow
            | Self::InvalidGroupSize => ErrorKind::Validation,

            Self::MissingRole { .. } | Self::NotOwner { .. } | Self::AccessDenied(_) => {
                ErrorKind::Authorization
            }

            Self::AlreadyVerified(_)
            | Self::RecordNotActive { .. }
            | Self::NotVerified(_)
            | Self::TripAlreadyActive(_)
            | Self::TripAlreadyEnded(_)
            | Self::TripNotStarted(_)
            | Self::InvalidStatusTransition { .. } => ErrorKind::State,

            Self::RecordNotFound(_)
            | Self::OwnerNotFound(_)
            | Self::ExternalIdNotFound(_)
            | Self::VerifierNotFound(_) => ErrorKind::NotFound,

            Self::RegistryPaused => ErrorKind::Paused,
        }
    }

    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateOwner(_) => "DUPLICATE_OWNER",
            Self::DuplicateExternalId(_) => "DUPLICATE_EXTERNAL_ID",
            Self::DuplicateVerifier(_) => "DUPLICATE_VERIFIER",
            Self::ContactLimitExceeded { .. } => "CONTACT_LIMIT_EXCEEDED",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            Self::InvalidTripWindow => "INVALID_TRIP_WINDOW",
            Self::InvalidGroupSize => "INVALID_GROUP_SIZE",
            Self::MissingRole { .. } => "MISSING_ROLE",
            Self::NotOwner { .. } => "NOT_OWNER",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::AlreadyVerified(_) => "ALREADY_VERIFIED",
            Self::RecordNotActive { .. } => "RECORD_NOT_ACTIVE",
            Self::NotVerified(_) => "NOT_VERIFIED",
            Self::TripAlreadyActive(_) => "TRIP_ALREADY_ACTIVE",
            Self::TripAlreadyEnded(_) => "TRIP_ALREADY_ENDED",
            Self::TripNotStarted(_) => "TRIP_NOT_STARTED",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::RecordNotFound(_) => "RECORD_NOT_FOUND",
            Self::OwnerNotFound(_) => "OWNER_NOT_FOUND",
            Self::ExternalIdNotFound(_) => "EXTERNAL_ID_NOT_FOUND",
            Self::VerifierNotFound(_) => "VERIFIER_NOT_FOUND",
            Self::RegistryPaused => "REGISTRY_PAUSED",
        }
    }
}
