//! Yatri Registry — Identity issuance, verification, trip lifecycle,
//! emergency access audit, and bulk operations.

pub mod audit;
pub mod bulk;
pub mod directory;
pub mod error;
pub mod events;
pub mod record;
pub mod registry;
pub mod roles;
pub mod stats;
pub mod store;
pub mod trips;

pub use audit::{AuditAction, AuditEntry, AuditLog};
pub use bulk::BulkVerifyReport;
pub use directory::{VerifierApplication, VerifierDirectory, VerifierInfo};
pub use error::{ErrorKind, RegistryError};
pub use events::{EventJournal, RegistryEvent};
pub use record::{
    EmergencyContact, IdentityRecord, KycProfile, KycSubmission, RegistrationRequest,
    MAX_EMERGENCY_CONTACTS,
};
pub use registry::{AlertEligibility, IdentityRegistry, RegistryLimits};
pub use roles::RoleAuthority;
pub use stats::RegistryStats;
pub use store::IdentityStore;
pub use trips::{TripDetails, TripPlan};
