//! Integration test: verifier onboarding, verification, revocation, and
//! the audit trail.
//!
//! Covers the one-shot verification rule, bulk verification with its
//! partial-failure semantics, and the mandatory audit entries written
//! by revocation and emergency access.

use std::sync::Arc;

use chrono::{Duration, Utc};

use yatri_core::{
    ContentHash, DocumentType, ExternalIdHash, IdentityStatus, Principal, RegistryId, Role,
};
use yatri_registry::{
    AuditAction, IdentityRegistry, KycSubmission, RegistrationRequest, RegistryError,
    RegistryLimits, RoleAuthority, VerifierApplication,
};

fn admin() -> Principal {
    Principal::new("admin-hq").unwrap()
}

fn principal(s: &str) -> Principal {
    Principal::new(s).unwrap()
}

fn fresh_registry() -> IdentityRegistry {
    IdentityRegistry::new(Arc::new(RoleAuthority::new(admin())))
}

fn registration(owner: &str, document_number: &str) -> RegistrationRequest {
    RegistrationRequest {
        owner: principal(owner),
        external_id_hash: ExternalIdHash::digest(document_number.as_bytes()),
        kyc: KycSubmission {
            document_type: DocumentType::NationalId,
            document_hash: ContentHash::digest(document_number.as_bytes()),
            expires_at: Utc::now() + Duration::days(1800),
            trust_score: 74,
            biometric_hash: ContentHash::digest(b"face-template"),
        },
        trip: yatri_registry::TripPlan {
            itinerary_hash: ContentHash::digest(b"spiti-circuit"),
            planned_start: Utc::now(),
            planned_end: Utc::now() + Duration::days(12),
            purpose: "trekking".to_string(),
            group_size: 4,
            accommodation_hash: ContentHash::digest(b"homestay-ref"),
        },
        location: "checkpost-kaza".to_string(),
    }
}

/// Helper: onboard a verifier principal through the directory.
fn onboard_verifier(registry: &IdentityRegistry, who: &str) -> yatri_core::VerifierId {
    registry
        .register_verifier(
            &admin(),
            VerifierApplication {
                principal: principal(who),
                organization: "District Tourist Police".to_string(),
                role_label: "checkpost".to_string(),
                jurisdiction: "IN-HP".to_string(),
            },
        )
        .expect("verifier onboarding should succeed")
}

// =========================================================================
// Verifier onboarding
// =========================================================================

#[test]
fn test_onboarding_grants_the_verifier_role() {
    let registry = fresh_registry();
    let id = onboard_verifier(&registry, "ranger-1");

    let info = registry.verifier(id).expect("directory entry should exist");
    assert!(info.active);
    assert_eq!(info.verifications, 0);
    assert!(registry
        .roles()
        .has_role(&principal("ranger-1"), Role::Verifier));

    // One directory entry per principal.
    let err = registry
        .register_verifier(
            &admin(),
            VerifierApplication {
                principal: principal("ranger-1"),
                organization: "Duplicate Org".to_string(),
                role_label: "checkpost".to_string(),
                jurisdiction: "IN-HP".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateVerifier(_)));
}

#[test]
fn test_deactivation_revokes_the_role_and_reactivation_restores_it() {
    let registry = fresh_registry();
    let verifier_id = onboard_verifier(&registry, "ranger-1");
    let record = registry
        .register_identity(&admin(), registration("asha", "D-2001"))
        .unwrap();

    registry
        .set_verifier_active(&admin(), verifier_id, false)
        .unwrap();
    let err = registry
        .verify_identity(&principal("ranger-1"), record)
        .unwrap_err();
    assert!(matches!(err, RegistryError::MissingRole { .. }));

    registry
        .set_verifier_active(&admin(), verifier_id, true)
        .unwrap();
    registry
        .verify_identity(&principal("ranger-1"), record)
        .expect("reactivated verifier should verify again");
}

// =========================================================================
// Single verification
// =========================================================================

#[test]
fn test_verification_is_one_shot() {
    let registry = fresh_registry();
    let verifier_id = onboard_verifier(&registry, "ranger-1");
    let id = registry
        .register_identity(&admin(), registration("asha", "D-2001"))
        .unwrap();

    registry.verify_identity(&principal("ranger-1"), id).unwrap();

    let record = registry.record(&admin(), id).unwrap();
    assert!(record.is_verified);
    assert_eq!(record.kyc.verified_by, Some(principal("ranger-1")));
    assert!(record.kyc.verified_at.is_some());
    assert_eq!(registry.verifier(verifier_id).unwrap().verifications, 1);

    // The flag is monotonic: a second attempt is an error, not a no-op.
    let err = registry
        .verify_identity(&principal("ranger-1"), id)
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyVerified(_)));
    assert_eq!(registry.verifier(verifier_id).unwrap().verifications, 1);
}

#[test]
fn test_only_active_records_can_be_verified() {
    let registry = fresh_registry();
    onboard_verifier(&registry, "ranger-1");
    let id = registry
        .register_identity(&admin(), registration("asha", "D-2001"))
        .unwrap();
    registry
        .change_status(&admin(), id, IdentityStatus::Suspended, "pending review")
        .unwrap();

    let err = registry
        .verify_identity(&principal("ranger-1"), id)
        .unwrap_err();
    assert!(matches!(err, RegistryError::RecordNotActive { .. }));
}

// =========================================================================
// Bulk verification
// =========================================================================

#[test]
fn test_bulk_verification_reports_successes_and_skips() {
    let registry = fresh_registry();
    let verifier_id = onboard_verifier(&registry, "ranger-1");

    let a = registry
        .register_identity(&admin(), registration("asha", "D-2001"))
        .unwrap();
    let b = registry
        .register_identity(&admin(), registration("ben", "D-2002"))
        .unwrap();
    let c = registry
        .register_identity(&admin(), registration("chen", "D-2003"))
        .unwrap();
    let d = registry
        .register_identity(&admin(), registration("devi", "D-2004"))
        .unwrap();

    // b is pre-verified, c is suspended, and one id does not exist.
    registry.verify_identity(&principal("ranger-1"), b).unwrap();
    registry
        .change_status(&admin(), c, IdentityStatus::Suspended, "pending review")
        .unwrap();
    let missing = RegistryId(999);

    let report = registry
        .bulk_verify(&principal("ranger-1"), &[a, b, c, missing, d])
        .expect("bulk verification should complete");

    assert_eq!(report.attempted, 5);
    assert_eq!(report.succeeded, vec![a, d]);
    assert_eq!(report.skipped, vec![b, c, missing]);

    assert!(registry.record(&admin(), a).unwrap().is_verified);
    assert!(registry.record(&admin(), d).unwrap().is_verified);
    assert!(!registry.record(&admin(), c).unwrap().is_verified);

    // One counted verification per success, plus the earlier single one.
    assert_eq!(registry.verifier(verifier_id).unwrap().verifications, 3);
}

#[test]
fn test_bulk_verification_enforces_the_batch_limit() {
    let roles = Arc::new(RoleAuthority::new(admin()));
    let registry =
        IdentityRegistry::with_limits(roles, RegistryLimits { max_bulk_batch: 3 });
    onboard_verifier(&registry, "ranger-1");

    let ids = [RegistryId(1), RegistryId(2), RegistryId(3), RegistryId(4)];
    let err = registry
        .bulk_verify(&principal("ranger-1"), &ids)
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::BatchTooLarge { size: 4, limit: 3 }
    ));
}

#[test]
fn test_bulk_verification_requires_the_verifier_role() {
    let registry = fresh_registry();
    let err = registry
        .bulk_verify(&principal("walk-in"), &[RegistryId(1)])
        .unwrap_err();
    assert!(matches!(err, RegistryError::MissingRole { .. }));
}

// =========================================================================
// Revocation and the audit trail
// =========================================================================

#[test]
fn test_revocation_demands_a_reason_and_writes_audit() {
    let registry = fresh_registry();
    let id = registry
        .register_identity(&admin(), registration("asha", "D-2001"))
        .unwrap();

    let err = registry
        .change_status(&admin(), id, IdentityStatus::Revoked, "   ")
        .unwrap_err();
    assert!(matches!(err, RegistryError::ReasonRequired));
    assert!(registry.audit().is_empty());

    registry
        .change_status(&admin(), id, IdentityStatus::Revoked, "document mismatch")
        .unwrap();

    let entries = registry.audit().entries_for(id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::Revocation);
    assert_eq!(entries[0].actor, admin());
    assert_eq!(entries[0].reason, "document mismatch");

    // Revocation is terminal.
    let err = registry
        .change_status(&admin(), id, IdentityStatus::Active, "undo")
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidStatusTransition { .. }));
}

#[test]
fn test_emergency_access_is_role_gated_and_audited() {
    let registry = fresh_registry();
    let responder = principal("resp-1");
    registry
        .roles()
        .grant_role(&admin(), &responder, Role::EmergencyResponder)
        .unwrap();
    let id = registry
        .register_identity(&admin(), registration("asha", "D-2001"))
        .unwrap();

    // Role and reason are both mandatory.
    let err = registry
        .emergency_access(&principal("walk-in"), id, "medical")
        .unwrap_err();
    assert!(matches!(err, RegistryError::MissingRole { .. }));
    let err = registry.emergency_access(&responder, id, "  ").unwrap_err();
    assert!(matches!(err, RegistryError::ReasonRequired));
    assert!(registry.audit().is_empty());

    // A miss is not audited.
    let err = registry
        .emergency_access(&responder, RegistryId(999), "missing person")
        .unwrap_err();
    assert!(matches!(err, RegistryError::RecordNotFound(_)));
    assert!(registry.audit().is_empty());

    // A successful access writes exactly one entry.
    let record = registry
        .emergency_access(&responder, id, "missing person report #4411")
        .unwrap();
    assert_eq!(record.registry_id, id);
    let entries = registry.audit().entries_for(id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::EmergencyAccess);
    assert_eq!(entries[0].reason, "missing person report #4411");

    // Emergency access ignores record status.
    registry
        .change_status(&admin(), id, IdentityStatus::Revoked, "fraud")
        .unwrap();
    registry
        .emergency_access(&responder, id, "follow-up on report #4411")
        .expect("revoked records stay reachable in an emergency");
    assert_eq!(registry.audit().entries_for(id).len(), 3);
}

#[test]
fn test_audit_sequence_is_gapless_and_ordered() {
    let registry = fresh_registry();
    let responder = principal("resp-1");
    registry
        .roles()
        .grant_role(&admin(), &responder, Role::EmergencyResponder)
        .unwrap();

    let a = registry
        .register_identity(&admin(), registration("asha", "D-2001"))
        .unwrap();
    let b = registry
        .register_identity(&admin(), registration("ben", "D-2002"))
        .unwrap();

    registry.emergency_access(&responder, a, "welfare check").unwrap();
    registry
        .change_status(&admin(), b, IdentityStatus::Revoked, "forged document")
        .unwrap();
    registry.emergency_access(&responder, b, "post-revocation trace").unwrap();

    let entries = registry.audit().recent(10);
    let seqs: Vec<u64> = entries.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(registry.audit().since(1).len(), 2);
    assert_eq!(registry.audit().entries_for(b).len(), 2);
}
