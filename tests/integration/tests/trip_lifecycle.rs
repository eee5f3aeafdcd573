//! Integration test: the trip state machine riding on verification.
//!
//! A trip may only start on a verified, active record; ending is
//! allowed regardless of record status so no tourist gets stuck
//! mid-journey. Also covers emergency contacts and the alert
//! eligibility read used by the panic-button gateway.

use std::sync::Arc;

use chrono::{Duration, Utc};

use yatri_core::{
    ContentHash, DocumentType, ExternalIdHash, IdentityStatus, Principal, RegistryId, Role,
    TripState,
};
use yatri_registry::{
    EmergencyContact, IdentityRegistry, KycSubmission, RegistrationRequest, RegistryError,
    RoleAuthority, TripPlan, MAX_EMERGENCY_CONTACTS,
};

fn admin() -> Principal {
    Principal::new("admin-hq").unwrap()
}

fn principal(s: &str) -> Principal {
    Principal::new(s).unwrap()
}

fn fresh_registry() -> IdentityRegistry {
    let registry = IdentityRegistry::new(Arc::new(RoleAuthority::new(admin())));
    registry
        .roles()
        .grant_role(&admin(), &principal("ranger-1"), Role::Verifier)
        .unwrap();
    registry
}

fn registration(owner: &str, document_number: &str) -> RegistrationRequest {
    RegistrationRequest {
        owner: principal(owner),
        external_id_hash: ExternalIdHash::digest(document_number.as_bytes()),
        kyc: KycSubmission {
            document_type: DocumentType::Passport,
            document_hash: ContentHash::digest(document_number.as_bytes()),
            expires_at: Utc::now() + Duration::days(3650),
            trust_score: 90,
            biometric_hash: ContentHash::digest(b"face-template"),
        },
        trip: TripPlan {
            itinerary_hash: ContentHash::digest(b"leh-nubra-pangong"),
            planned_start: Utc::now(),
            planned_end: Utc::now() + Duration::days(9),
            purpose: "adventure".to_string(),
            group_size: 3,
            accommodation_hash: ContentHash::digest(b"camp-ref"),
        },
        location: "leh-airport".to_string(),
    }
}

fn contact(name: &str, is_primary: bool) -> EmergencyContact {
    EmergencyContact {
        name_hash: ContentHash::digest(name.as_bytes()),
        relationship: "family".to_string(),
        phone_hash: ContentHash::digest(b"+91-0000000000"),
        email_hash: ContentHash::digest(b"family@example.net"),
        is_primary,
    }
}

// =========================================================================
// Verification gate
// =========================================================================

#[test]
fn test_trip_cannot_start_on_an_unverified_record() {
    let registry = fresh_registry();
    let id = registry
        .register_identity(&admin(), registration("asha", "P-3001"))
        .unwrap();

    let err = registry.start_trip(&principal("asha"), id).unwrap_err();
    assert!(matches!(err, RegistryError::NotVerified(_)));

    registry.verify_identity(&principal("ranger-1"), id).unwrap();
    registry
        .start_trip(&principal("asha"), id)
        .expect("verified record should start its trip");
}

#[test]
fn test_only_the_owner_drives_the_trip() {
    let registry = fresh_registry();
    let id = registry
        .register_identity(&admin(), registration("asha", "P-3001"))
        .unwrap();
    registry.verify_identity(&principal("ranger-1"), id).unwrap();

    // Even an admin cannot start someone else's trip.
    let err = registry.start_trip(&admin(), id).unwrap_err();
    assert!(matches!(err, RegistryError::NotOwner { .. }));

    registry.start_trip(&principal("asha"), id).unwrap();
    let err = registry.end_trip(&admin(), id).unwrap_err();
    assert!(matches!(err, RegistryError::NotOwner { .. }));
}

// =========================================================================
// Full journey
// =========================================================================

#[test]
fn test_full_tourist_journey() {
    let registry = fresh_registry();
    let asha = principal("asha");
    let id = registry
        .register_identity(&admin(), registration("asha", "P-3001"))
        .unwrap();

    registry.verify_identity(&principal("ranger-1"), id).unwrap();
    registry
        .add_emergency_contact(&asha, id, contact("Meera", true))
        .unwrap();
    registry.start_trip(&asha, id).unwrap();

    let record = registry.record(&asha, id).unwrap();
    assert_eq!(record.trip.state, TripState::Active);
    assert!(record.trip.started_at.is_some());
    assert!(record.trip.ended_at.is_none());

    // While on the move the record qualifies for safety alerts.
    let eligibility = registry.alert_eligibility(id).unwrap();
    assert!(eligibility.eligible);
    assert_eq!(eligibility.trip_state, TripState::Active);

    registry.end_trip(&asha, id).unwrap();
    let record = registry.record(&asha, id).unwrap();
    assert_eq!(record.trip.state, TripState::Ended);
    assert!(record.trip.ended_at.is_some());

    let kinds: Vec<&str> = registry
        .events()
        .all()
        .iter()
        .map(|event| event.kind())
        .collect();
    assert_eq!(
        kinds,
        vec!["registered", "verified", "trip_started", "trip_ended"]
    );
}

#[test]
fn test_trip_transitions_are_guarded() {
    let registry = fresh_registry();
    let asha = principal("asha");
    let id = registry
        .register_identity(&admin(), registration("asha", "P-3001"))
        .unwrap();
    registry.verify_identity(&principal("ranger-1"), id).unwrap();

    // End before start.
    let err = registry.end_trip(&asha, id).unwrap_err();
    assert!(matches!(err, RegistryError::TripNotStarted(_)));

    registry.start_trip(&asha, id).unwrap();
    let err = registry.start_trip(&asha, id).unwrap_err();
    assert!(matches!(err, RegistryError::TripAlreadyActive(_)));

    registry.end_trip(&asha, id).unwrap();
    let err = registry.end_trip(&asha, id).unwrap_err();
    assert!(matches!(err, RegistryError::TripAlreadyEnded(_)));
    let err = registry.start_trip(&asha, id).unwrap_err();
    assert!(matches!(err, RegistryError::TripAlreadyEnded(_)));
}

#[test]
fn test_suspension_mid_trip_still_allows_ending() {
    let registry = fresh_registry();
    let asha = principal("asha");
    let id = registry
        .register_identity(&admin(), registration("asha", "P-3001"))
        .unwrap();
    registry.verify_identity(&principal("ranger-1"), id).unwrap();
    registry.start_trip(&asha, id).unwrap();

    registry
        .change_status(&admin(), id, IdentityStatus::Suspended, "payment dispute")
        .unwrap();

    // The tourist can always close out the journey.
    registry
        .end_trip(&asha, id)
        .expect("ending must not depend on record status");
    assert_eq!(
        registry.record(&asha, id).unwrap().trip.state,
        TripState::Ended
    );
}

// =========================================================================
// Emergency contacts
// =========================================================================

#[test]
fn test_contact_limit_is_enforced() {
    let registry = fresh_registry();
    let asha = principal("asha");
    let id = registry
        .register_identity(&admin(), registration("asha", "P-3001"))
        .unwrap();

    for i in 0..MAX_EMERGENCY_CONTACTS {
        registry
            .add_emergency_contact(&asha, id, contact(&format!("contact-{i}"), i == 0))
            .unwrap();
    }

    let err = registry
        .add_emergency_contact(&asha, id, contact("one-too-many", false))
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::ContactLimitExceeded { limit: MAX_EMERGENCY_CONTACTS }
    ));

    let record = registry.record(&asha, id).unwrap();
    assert_eq!(record.emergency_contacts.len(), MAX_EMERGENCY_CONTACTS);
}

#[test]
fn test_contacts_are_owner_only() {
    let registry = fresh_registry();
    let id = registry
        .register_identity(&admin(), registration("asha", "P-3001"))
        .unwrap();

    let err = registry
        .add_emergency_contact(&admin(), id, contact("Meera", true))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotOwner { .. }));
}

// =========================================================================
// Alert eligibility
// =========================================================================

#[test]
fn test_alert_eligibility_matrix() {
    let registry = fresh_registry();
    let id = registry
        .register_identity(&admin(), registration("asha", "P-3001"))
        .unwrap();

    // Unverified: not eligible.
    assert!(!registry.alert_eligibility(id).unwrap().eligible);

    // Verified and active: eligible.
    registry.verify_identity(&principal("ranger-1"), id).unwrap();
    assert!(registry.alert_eligibility(id).unwrap().eligible);

    // Suspended: not eligible, even though verified.
    registry
        .change_status(&admin(), id, IdentityStatus::Suspended, "incident hold")
        .unwrap();
    let eligibility = registry.alert_eligibility(id).unwrap();
    assert!(!eligibility.eligible);
    assert_eq!(eligibility.status, IdentityStatus::Suspended);
    assert!(eligibility.is_verified);

    // Reinstated: eligible again.
    registry
        .change_status(&admin(), id, IdentityStatus::Active, "hold cleared")
        .unwrap();
    assert!(registry.alert_eligibility(id).unwrap().eligible);

    // Unknown ids surface as a miss for the gateway to handle.
    let err = registry.alert_eligibility(RegistryId(999)).unwrap_err();
    assert!(matches!(err, RegistryError::RecordNotFound(_)));
}
