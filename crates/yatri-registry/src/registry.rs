use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yatri_core::{
    ExternalIdHash, IdentityStatus, Principal, RegistryId, Role, StatusTransitions,
    TripState, VerifierId,
};

use crate::audit::{AuditAction, AuditLog};
use crate::directory::{VerifierApplication, VerifierDirectory, VerifierInfo};
use crate::error::RegistryError;
use crate::events::{EventJournal, RegistryEvent};
use crate::record::{
    EmergencyContact, IdentityRecord, RegistrationRequest, MAX_EMERGENCY_CONTACTS,
};
use crate::roles::RoleAuthority;
use crate::stats::RegistryStats;
use crate::store::IdentityStore;

/// Operational limits of the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegistryLimits {
    /// Maximum number of ids per bulk verification batch.
    pub max_bulk_batch: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self { max_bulk_batch: 100 }
    }
}

/// What the panic-button gateway needs to know about a record before
/// accepting an alert. Exposes no contact or KYC material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEligibility {
    pub registry_id: RegistryId,
    pub status: IdentityStatus,
    pub is_verified: bool,
    pub trip_state: TripState,
    pub eligible: bool,
}

/// The registry facade: every operation of the identity registry, with
/// role checks in front, record mutations in the middle, and audit/event
/// appends behind.
pub struct IdentityRegistry {
    pub(crate) roles: Arc<RoleAuthority>,
    pub(crate) store: Arc<IdentityStore>,
    pub(crate) directory: Arc<VerifierDirectory>,
    pub(crate) audit: Arc<AuditLog>,
    pub(crate) events: Arc<EventJournal>,
    pub(crate) limits: RegistryLimits,
}

impl IdentityRegistry {
    /// Create a registry with default limits.
    pub fn new(roles: Arc<RoleAuthority>) -> Self {
        Self::with_limits(roles, RegistryLimits::default())
    }

    pub fn with_limits(roles: Arc<RoleAuthority>, limits: RegistryLimits) -> Self {
        Self {
            roles,
            store: Arc::new(IdentityStore::new()),
            directory: Arc::new(VerifierDirectory::new()),
            audit: Arc::new(AuditLog::new()),
            events: Arc::new(EventJournal::new()),
            limits,
        }
    }

    pub fn roles(&self) -> Arc<RoleAuthority> {
        Arc::clone(&self.roles)
    }

    pub fn store(&self) -> Arc<IdentityStore> {
        Arc::clone(&self.store)
    }

    pub fn directory(&self) -> Arc<VerifierDirectory> {
        Arc::clone(&self.directory)
    }

    pub fn audit(&self) -> Arc<AuditLog> {
        Arc::clone(&self.audit)
    }

    pub fn events(&self) -> Arc<EventJournal> {
        Arc::clone(&self.events)
    }

    pub fn limits(&self) -> RegistryLimits {
        self.limits
    }

    /// Register a new identity. The registrar must hold the Admin role;
    /// owner and external id hash must both be unused.
    pub fn register_identity(
        &self,
        registrar: &Principal,
        request: RegistrationRequest,
    ) -> Result<RegistryId, RegistryError> {
        self.roles.ensure(registrar, Role::Admin)?;
        if request.trip.planned_end <= request.trip.planned_start {
            return Err(RegistryError::InvalidTripWindow);
        }
        if request.trip.group_size == 0 {
            return Err(RegistryError::InvalidGroupSize);
        }

        let owner = request.owner.clone();
        let external_id_hash = request.external_id_hash;
        let now = Utc::now();
        let id = self.store.insert_with(&owner, &external_id_hash, |id| {
            IdentityRecord::create(id, request, registrar.clone(), now)
        })?;

        self.events.append(RegistryEvent::Registered {
            id,
            owner: owner.clone(),
            at: now,
        });
        tracing::info!(
            id = %id,
            owner = %owner,
            registered_by = %registrar,
            "identity registered"
        );
        Ok(id)
    }

    /// Verify an identity. The caller must hold the Verifier role; the
    /// record must be active and not yet verified. Verification is
    /// one-shot: a second call fails with `AlreadyVerified`.
    pub fn verify_identity(
        &self,
        verifier: &Principal,
        id: RegistryId,
    ) -> Result<(), RegistryError> {
        self.roles.ensure(verifier, Role::Verifier)?;
        let now = Utc::now();
        self.store
            .update(id, |record| Self::mark_verified(record, verifier, now))?;

        if self.directory.record_verification(verifier).is_none() {
            tracing::debug!(
                verifier = %verifier,
                "verifier has no directory entry, count not incremented"
            );
        }
        self.events.append(RegistryEvent::Verified {
            id,
            verifier: verifier.clone(),
            at: now,
        });
        tracing::info!(id = %id, verifier = %verifier, "identity verified");
        Ok(())
    }

    /// Shared by single and bulk verification. Runs inside the store's
    /// write lock.
    pub(crate) fn mark_verified(
        record: &mut IdentityRecord,
        verifier: &Principal,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        if record.is_verified {
            return Err(RegistryError::AlreadyVerified(record.registry_id));
        }
        if record.status != IdentityStatus::Active {
            return Err(RegistryError::RecordNotActive {
                id: record.registry_id,
                status: record.status,
            });
        }
        record.is_verified = true;
        record.kyc.verified_by = Some(verifier.clone());
        record.kyc.verified_at = Some(at);
        Ok(())
    }

    /// Change a record's status. Admin-only; revocation requires a
    /// non-empty reason and is audited. Exempt from the pause gate so a
    /// freeze cannot block incident response.
    pub fn change_status(
        &self,
        admin: &Principal,
        id: RegistryId,
        new_status: IdentityStatus,
        reason: &str,
    ) -> Result<(), RegistryError> {
        self.roles.ensure(admin, Role::Admin)?;
        if new_status == IdentityStatus::Revoked && reason.trim().is_empty() {
            return Err(RegistryError::ReasonRequired);
        }

        let from = self.store.admin_update(id, |record| {
            let from = record.status;
            StatusTransitions::check(from, new_status).map_err(|_| {
                RegistryError::InvalidStatusTransition {
                    from,
                    to: new_status,
                }
            })?;
            record.status = new_status;
            Ok(from)
        })?;

        if new_status == IdentityStatus::Revoked {
            self.audit
                .append(AuditAction::Revocation, admin.clone(), id, reason);
        }
        self.events.append(RegistryEvent::StatusChanged {
            id,
            from,
            to: new_status,
            by: admin.clone(),
            at: Utc::now(),
        });
        tracing::info!(
            id = %id,
            from = %from,
            to = %new_status,
            by = %admin,
            "identity status changed"
        );
        Ok(())
    }

    /// Add an emergency contact. Owner-only; at most
    /// [`MAX_EMERGENCY_CONTACTS`] per record. Gated by the pause flag.
    pub fn add_emergency_contact(
        &self,
        caller: &Principal,
        id: RegistryId,
        contact: EmergencyContact,
    ) -> Result<(), RegistryError> {
        self.store.update(id, |record| {
            if record.owner != *caller {
                return Err(RegistryError::NotOwner {
                    principal: caller.clone(),
                    id,
                });
            }
            if record.emergency_contacts.len() >= MAX_EMERGENCY_CONTACTS {
                return Err(RegistryError::ContactLimitExceeded {
                    limit: MAX_EMERGENCY_CONTACTS,
                });
            }
            record.emergency_contacts.push(contact);
            Ok(())
        })?;
        tracing::debug!(id = %id, "emergency contact added");
        Ok(())
    }

    /// Emergency override read. Requires the EmergencyResponder role and
    /// a non-empty reason; returns the record regardless of status and
    /// appends exactly one audit entry. A lookup miss fails without an
    /// audit entry.
    pub fn emergency_access(
        &self,
        responder: &Principal,
        id: RegistryId,
        reason: &str,
    ) -> Result<IdentityRecord, RegistryError> {
        self.roles.ensure(responder, Role::EmergencyResponder)?;
        if reason.trim().is_empty() {
            return Err(RegistryError::ReasonRequired);
        }

        let record = self
            .store
            .get(id)
            .ok_or(RegistryError::RecordNotFound(id))?;

        self.audit
            .append(AuditAction::EmergencyAccess, responder.clone(), id, reason);
        tracing::warn!(
            id = %id,
            responder = %responder,
            reason = reason,
            "emergency access granted"
        );
        Ok(record)
    }

    /// Read a record by id. Visible to the owner, admins, and verifiers.
    pub fn record(
        &self,
        caller: &Principal,
        id: RegistryId,
    ) -> Result<IdentityRecord, RegistryError> {
        let record = self
            .store
            .get(id)
            .ok_or(RegistryError::RecordNotFound(id))?;
        self.check_read_access(caller, &record)?;
        Ok(record)
    }

    /// Read a record by its owner principal.
    pub fn record_by_owner(
        &self,
        caller: &Principal,
        owner: &Principal,
    ) -> Result<IdentityRecord, RegistryError> {
        let record = self
            .store
            .get_by_owner(owner)
            .ok_or_else(|| RegistryError::OwnerNotFound(owner.clone()))?;
        self.check_read_access(caller, &record)?;
        Ok(record)
    }

    /// Read a record by its external id hash.
    pub fn record_by_external_id(
        &self,
        caller: &Principal,
        hash: &ExternalIdHash,
    ) -> Result<IdentityRecord, RegistryError> {
        let record = self
            .store
            .get_by_external(hash)
            .ok_or(RegistryError::ExternalIdNotFound(*hash))?;
        self.check_read_access(caller, &record)?;
        Ok(record)
    }

    /// Owner, admin, and verifier may read. Emergency responders go
    /// through `emergency_access` instead, which audits.
    fn check_read_access(
        &self,
        caller: &Principal,
        record: &IdentityRecord,
    ) -> Result<(), RegistryError> {
        if record.owner == *caller
            || self.roles.has_role(caller, Role::Admin)
            || self.roles.has_role(caller, Role::Verifier)
        {
            Ok(())
        } else {
            Err(RegistryError::AccessDenied(caller.clone()))
        }
    }

    /// Status summary for the panic-button gateway. No role check: the
    /// gateway is authenticated upstream and the response contains no
    /// personal material.
    pub fn alert_eligibility(
        &self,
        id: RegistryId,
    ) -> Result<AlertEligibility, RegistryError> {
        let record = self
            .store
            .get(id)
            .ok_or(RegistryError::RecordNotFound(id))?;
        Ok(AlertEligibility {
            registry_id: record.registry_id,
            status: record.status,
            is_verified: record.is_verified,
            trip_state: record.trip.state,
            eligible: record.alert_eligible(),
        })
    }

    /// Registry counters for dashboards.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats::collect(&self.store, &self.directory)
    }

    /// Freeze record-plane mutations. Admin-only.
    pub fn pause(&self, admin: &Principal) -> Result<(), RegistryError> {
        self.roles.ensure(admin, Role::Admin)?;
        self.store.pause();
        tracing::warn!(by = %admin, "registry paused");
        Ok(())
    }

    /// Lift the freeze. Admin-only.
    pub fn resume(&self, admin: &Principal) -> Result<(), RegistryError> {
        self.roles.ensure(admin, Role::Admin)?;
        self.store.resume();
        tracing::warn!(by = %admin, "registry resumed");
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.store.is_paused()
    }

    /// Onboard a verifier. Admin-only; also grants the Verifier role so
    /// the directory and the role authority stay in sync.
    pub fn register_verifier(
        &self,
        admin: &Principal,
        application: VerifierApplication,
    ) -> Result<VerifierId, RegistryError> {
        self.roles.ensure(admin, Role::Admin)?;

        let info = VerifierInfo {
            verifier_id: VerifierId::generate(),
            principal: application.principal.clone(),
            organization: application.organization,
            role_label: application.role_label,
            jurisdiction: application.jurisdiction,
            active: true,
            registered_by: admin.clone(),
            registered_at: Utc::now(),
            verifications: 0,
        };
        let id = info.verifier_id;
        self.directory.register(info)?;
        self.roles
            .grant_role(admin, &application.principal, Role::Verifier)?;

        tracing::info!(
            verifier_id = %id,
            principal = %application.principal,
            "verifier registered"
        );
        Ok(id)
    }

    /// Activate or deactivate a verifier. Admin-only; the Verifier role
    /// grant follows the flag.
    pub fn set_verifier_active(
        &self,
        admin: &Principal,
        id: VerifierId,
        active: bool,
    ) -> Result<(), RegistryError> {
        self.roles.ensure(admin, Role::Admin)?;
        let info = self.directory.set_active(id, active)?;
        if active {
            self.roles
                .grant_role(admin, &info.principal, Role::Verifier)?;
        } else {
            self.roles
                .revoke_role(admin, &info.principal, Role::Verifier)?;
        }
        tracing::info!(
            verifier_id = %id,
            principal = %info.principal,
            active,
            "verifier activation changed"
        );
        Ok(())
    }

    pub fn verifier(&self, id: VerifierId) -> Option<VerifierInfo> {
        self.directory.get(id)
    }

    pub fn verifier_by_principal(&self, principal: &Principal) -> Option<VerifierInfo> {
        self.directory.get_by_principal(principal)
    }

    pub fn verifiers(&self) -> Vec<VerifierInfo> {
        self.directory.list()
    }
}
