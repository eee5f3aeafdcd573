use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yatri_core::{
    ContentHash, DocumentType, ExternalIdHash, IdentityStatus, Principal, RegistryId,
};

use crate::trips::{TripDetails, TripPlan};

/// Maximum number of emergency contacts per identity record.
pub const MAX_EMERGENCY_CONTACTS: usize = 5;

/// KYC material carried by an identity record. Document and biometric
/// payloads arrive pre-hashed; the registry never sees raw PII.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycProfile {
    pub document_type: DocumentType,
    pub document_hash: ContentHash,
    /// Principal that verified this record, once verified.
    pub verified_by: Option<Principal>,
    pub verified_at: Option<DateTime<Utc>>,
    /// Expiry of the underlying identity document.
    pub expires_at: DateTime<Utc>,
    /// Opaque confidence score from the upstream verification provider.
    pub trust_score: u8,
    pub biometric_hash: ContentHash,
}

/// Emergency contact. All personal fields are hashes; `relationship`
/// is a label like "spouse" or "parent".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name_hash: ContentHash,
    pub relationship: String,
    pub phone_hash: ContentHash,
    pub email_hash: ContentHash,
    pub is_primary: bool,
}

/// An identity record in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub registry_id: RegistryId,
    /// The tourist this record belongs to. Unique across the registry.
    pub owner: Principal,
    /// Hash of the external identifier (passport number, national id).
    /// Unique across the registry.
    pub external_id_hash: ExternalIdHash,
    pub kyc: KycProfile,
    pub trip: TripDetails,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub status: IdentityStatus,
    /// Set exactly once by a verifier; never cleared.
    pub is_verified: bool,
    pub registered_by: Principal,
    pub registered_at: DateTime<Utc>,
    /// Registration location (entry point, issuing office).
    pub location: String,
}

impl IdentityRecord {
    /// Build a fresh record from a registration request. The record starts
    /// active, unverified, with its trip not yet started and no contacts.
    pub fn create(
        registry_id: RegistryId,
        request: RegistrationRequest,
        registered_by: Principal,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            registry_id,
            owner: request.owner,
            external_id_hash: request.external_id_hash,
            kyc: KycProfile {
                document_type: request.kyc.document_type,
                document_hash: request.kyc.document_hash,
                verified_by: None,
                verified_at: None,
                expires_at: request.kyc.expires_at,
                trust_score: request.kyc.trust_score,
                biometric_hash: request.kyc.biometric_hash,
            },
            trip: TripDetails::planned(request.trip),
            emergency_contacts: Vec::new(),
            status: IdentityStatus::Active,
            is_verified: false,
            registered_by,
            registered_at,
            location: request.location,
        }
    }

    /// Whether the platform may accept panic-button alerts for this record.
    pub fn alert_eligible(&self) -> bool {
        self.status == IdentityStatus::Active && self.is_verified
    }
}

/// KYC payload submitted at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycSubmission {
    pub document_type: DocumentType,
    pub document_hash: ContentHash,
    pub expires_at: DateTime<Utc>,
    pub trust_score: u8,
    pub biometric_hash: ContentHash,
}

/// Everything an authorized registrar submits to create a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub owner: Principal,
    pub external_id_hash: ExternalIdHash,
    pub kyc: KycSubmission,
    pub trip: TripPlan,
    pub location: String,
}
