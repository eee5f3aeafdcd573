//! Integration test: identity registration and read visibility.
//!
//! Exercises yatri-core and yatri-registry together: role-gated
//! registration, uniqueness of owners and external ids, who may read a
//! record, and the pause gate around the record plane.

use std::sync::Arc;

use chrono::{Duration, Utc};

use yatri_core::{
    ContentHash, DocumentType, ExternalIdHash, IdentityStatus, Principal, RegistryId, Role,
};
use yatri_registry::{
    IdentityRegistry, KycSubmission, RegistrationRequest, RegistryError, RoleAuthority, TripPlan,
};

fn admin() -> Principal {
    Principal::new("admin-hq").unwrap()
}

fn principal(s: &str) -> Principal {
    Principal::new(s).unwrap()
}

/// Helper: a registry whose root admin is `admin-hq`.
fn fresh_registry() -> IdentityRegistry {
    IdentityRegistry::new(Arc::new(RoleAuthority::new(admin())))
}

/// Helper: a registration request for the given owner, hashed from the
/// given document number.
fn registration(owner: &str, document_number: &str) -> RegistrationRequest {
    RegistrationRequest {
        owner: principal(owner),
        external_id_hash: ExternalIdHash::digest(document_number.as_bytes()),
        kyc: KycSubmission {
            document_type: DocumentType::Passport,
            document_hash: ContentHash::digest(document_number.as_bytes()),
            expires_at: Utc::now() + Duration::days(3650),
            trust_score: 82,
            biometric_hash: ContentHash::digest(b"face-template"),
        },
        trip: TripPlan {
            itinerary_hash: ContentHash::digest(b"goa-panaji-loop"),
            planned_start: Utc::now() + Duration::days(1),
            planned_end: Utc::now() + Duration::days(8),
            purpose: "tourism".to_string(),
            group_size: 2,
            accommodation_hash: ContentHash::digest(b"hotel-booking-ref"),
        },
        location: "airport-dabolim".to_string(),
    }
}

// =========================================================================
// Registration
// =========================================================================

#[test]
fn test_registration_assigns_sequential_ids() {
    let registry = fresh_registry();
    let a = registry
        .register_identity(&admin(), registration("asha", "P-1001"))
        .expect("first registration should succeed");
    let b = registry
        .register_identity(&admin(), registration("ben", "P-1002"))
        .expect("second registration should succeed");

    assert_eq!(a, RegistryId(1));
    assert_eq!(b, RegistryId(2));
}

#[test]
fn test_duplicate_owner_and_external_id_are_rejected() {
    let registry = fresh_registry();
    registry
        .register_identity(&admin(), registration("asha", "P-1001"))
        .unwrap();

    // Same owner, different document.
    let err = registry
        .register_identity(&admin(), registration("asha", "P-9999"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateOwner(_)));

    // Different owner, same document.
    let err = registry
        .register_identity(&admin(), registration("ben", "P-1001"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateExternalId(_)));

    // A failed attempt must not burn a registry id.
    let id = registry
        .register_identity(&admin(), registration("ben", "P-1002"))
        .unwrap();
    assert_eq!(id, RegistryId(2));
}

#[test]
fn test_only_admins_register() {
    let registry = fresh_registry();
    let err = registry
        .register_identity(&principal("walk-in"), registration("asha", "P-1001"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::MissingRole { .. }));
}

#[test]
fn test_trip_plan_is_validated_at_registration() {
    let registry = fresh_registry();

    let mut bad_window = registration("asha", "P-1001");
    bad_window.trip.planned_end = bad_window.trip.planned_start - Duration::hours(1);
    let err = registry
        .register_identity(&admin(), bad_window)
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidTripWindow));

    let mut empty_group = registration("asha", "P-1001");
    empty_group.trip.group_size = 0;
    let err = registry
        .register_identity(&admin(), empty_group)
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidGroupSize));

    // The owner is still unclaimed after the failed attempts.
    registry
        .register_identity(&admin(), registration("asha", "P-1001"))
        .unwrap();
}

#[test]
fn test_record_snapshot_carries_no_raw_document_numbers() {
    let registry = fresh_registry();
    let id = registry
        .register_identity(&admin(), registration("asha", "P-1001"))
        .unwrap();

    let record = registry.record(&admin(), id).unwrap();
    let json = serde_json::to_string(&record).unwrap();
    assert!(!json.contains("P-1001"));
    assert!(json.contains(&ExternalIdHash::digest(b"P-1001").to_string()));
}

// =========================================================================
// Read visibility
// =========================================================================

#[test]
fn test_record_visibility_by_caller() {
    let registry = fresh_registry();
    let id = registry
        .register_identity(&admin(), registration("asha", "P-1001"))
        .unwrap();
    registry
        .roles()
        .grant_role(&admin(), &principal("ranger-1"), Role::Verifier)
        .unwrap();

    // Owner, admin, and verifiers may read.
    assert!(registry.record(&principal("asha"), id).is_ok());
    assert!(registry.record(&admin(), id).is_ok());
    assert!(registry.record(&principal("ranger-1"), id).is_ok());

    // Anyone else is denied, distinctly from a lookup miss.
    let err = registry.record(&principal("stranger"), id).unwrap_err();
    assert!(matches!(err, RegistryError::AccessDenied(_)));
    let err = registry
        .record(&principal("stranger"), RegistryId(404))
        .unwrap_err();
    assert!(matches!(err, RegistryError::RecordNotFound(_)));
}

#[test]
fn test_lookup_by_owner_and_external_id() {
    let registry = fresh_registry();
    let id = registry
        .register_identity(&admin(), registration("asha", "P-1001"))
        .unwrap();

    let by_owner = registry
        .record_by_owner(&admin(), &principal("asha"))
        .unwrap();
    assert_eq!(by_owner.registry_id, id);

    let hash = ExternalIdHash::digest(b"P-1001");
    let by_external = registry.record_by_external_id(&admin(), &hash).unwrap();
    assert_eq!(by_external.registry_id, id);

    let err = registry
        .record_by_owner(&admin(), &principal("nobody"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::OwnerNotFound(_)));

    let unknown = ExternalIdHash::digest(b"unknown-doc");
    let err = registry
        .record_by_external_id(&admin(), &unknown)
        .unwrap_err();
    assert!(matches!(err, RegistryError::ExternalIdNotFound(_)));
}

// =========================================================================
// Pause gate
// =========================================================================

#[test]
fn test_pause_gates_the_record_plane_only() {
    let registry = fresh_registry();
    let id = registry
        .register_identity(&admin(), registration("asha", "P-1001"))
        .unwrap();

    registry.pause(&admin()).unwrap();
    assert!(registry.is_paused());

    // Record-plane mutations are rejected outright.
    let err = registry
        .register_identity(&admin(), registration("ben", "P-1002"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::RegistryPaused));

    // Reads and the admin plane still work.
    assert!(registry.record(&admin(), id).is_ok());
    registry
        .change_status(&admin(), id, IdentityStatus::Suspended, "incident hold")
        .expect("status changes are exempt from the pause gate");

    registry.resume(&admin()).unwrap();
    registry
        .register_identity(&admin(), registration("ben", "P-1002"))
        .expect("registration should work again after resume");
}

#[test]
fn test_pause_requires_the_admin_role() {
    let registry = fresh_registry();
    let err = registry.pause(&principal("stranger")).unwrap_err();
    assert!(matches!(err, RegistryError::MissingRole { .. }));
    assert!(!registry.is_paused());
}

// =========================================================================
// Statistics
// =========================================================================

#[test]
fn test_stats_follow_the_record_lifecycle() {
    let registry = fresh_registry();
    registry
        .roles()
        .grant_role(&admin(), &principal("ranger-1"), Role::Verifier)
        .unwrap();

    let a = registry
        .register_identity(&admin(), registration("asha", "P-1001"))
        .unwrap();
    let b = registry
        .register_identity(&admin(), registration("ben", "P-1002"))
        .unwrap();
    registry
        .register_identity(&admin(), registration("chen", "P-1003"))
        .unwrap();

    registry.verify_identity(&principal("ranger-1"), a).unwrap();
    registry
        .change_status(&admin(), b, IdentityStatus::Revoked, "stolen passport")
        .unwrap();

    let stats = registry.stats();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.active_records, 2);
    assert_eq!(stats.verified_records, 1);
    assert_eq!(stats.pending_verification, 1);
    assert_eq!(stats.revoked_records, 1);
}
