//! Yatri Core — Fundamental types, status machines, and errors for the
//! Yatri digital identity registry.

pub mod error;
pub mod status;
pub mod types;

pub use error::CoreError;
pub use status::{IdentityStatus, StatusTransitions, TripState};
pub use types::{
    ContentHash, DocumentType, ExternalIdHash, Principal, RegistryId, Role, VerifierId,
};
