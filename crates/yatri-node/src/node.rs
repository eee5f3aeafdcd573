//! Registry node: wires the in-memory registry to persistent storage.
//!
//! At startup the node hydrates every table from RocksDB and seeds the
//! admin principals named in the config. Mutations go through the node
//! so each successful operation writes its touched rows back before the
//! caller sees the result. The pause flag is deliberately not
//! persisted; a restarted node always comes up unpaused.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use yatri_core::{IdentityStatus, Principal, RegistryId, Role, VerifierId};
use yatri_registry::{
    BulkVerifyReport, EmergencyContact, IdentityRecord, IdentityRegistry, RegistrationRequest,
    RegistryError, RegistryLimits, RoleAuthority, VerifierApplication,
};

use crate::config::YatriConfig;
use crate::storage::Storage;

/// Error surfaced by node operations: a registry rule violation or a
/// storage failure.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// A running registry node.
pub struct RegistryNode {
    config: YatriConfig,
    registry: Arc<IdentityRegistry>,
    storage: Storage,
    start_time: Instant,
    /// Highest audit sequence number already written to storage.
    persisted_audit_seq: AtomicU64,
}

impl RegistryNode {
    /// Open storage, hydrate the registry, and seed configured admins.
    pub fn new(config: YatriConfig) -> Result<Self> {
        let storage = Storage::open(&config.storage.data_dir)?;

        let mut admins = config.registry.admins.iter();
        let root = admins
            .next()
            .context("registry.admins must list at least one principal")?;
        let root = Principal::new(root.as_str())
            .with_context(|| format!("invalid admin principal in config: {root:?}"))?;
        let roles = Arc::new(RoleAuthority::new(root));
        for admin in admins {
            let principal = Principal::new(admin.as_str())
                .with_context(|| format!("invalid admin principal in config: {admin:?}"))?;
            roles.restore(principal, Role::Admin);
        }

        let limits = RegistryLimits {
            max_bulk_batch: config.registry.max_bulk_batch,
        };
        let registry = Arc::new(IdentityRegistry::with_limits(roles, limits));

        for (principal, role) in storage.load_role_grants()? {
            registry.roles().restore(principal, role);
        }
        let records = storage.load_records()?;
        let record_count = records.len();
        for record in records {
            registry.store().restore(record);
        }
        let verifiers = storage.load_verifiers()?;
        let verifier_count = verifiers.len();
        for info in verifiers {
            registry.directory().restore(info);
        }
        let mut last_seq = 0;
        let audit_entries = storage.load_audit_entries()?;
        let audit_count = audit_entries.len();
        for entry in audit_entries {
            last_seq = last_seq.max(entry.seq);
            registry.audit().restore(entry);
        }

        tracing::info!(
            records = record_count,
            verifiers = verifier_count,
            audit_entries = audit_count,
            "registry hydrated from storage"
        );

        Ok(Self {
            config,
            registry,
            storage,
            start_time: Instant::now(),
            persisted_audit_seq: AtomicU64::new(last_seq),
        })
    }

    pub fn config(&self) -> &YatriConfig {
        &self.config
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Serve the HTTP API until the task is cancelled or the listener
    /// fails.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let addr = self.config.api_socket_addr()?;
        crate::api::start_api_server(addr, self).await
    }

    pub fn shutdown(&self) {
        tracing::info!(uptime_secs = self.uptime_secs(), "registry node stopped");
    }

    // ---- mutations, written through to storage ----

    pub fn register_identity(
        &self,
        registrar: &Principal,
        request: RegistrationRequest,
    ) -> Result<RegistryId, NodeError> {
        let id = self.registry.register_identity(registrar, request)?;
        self.persist_record(id)?;
        Ok(id)
    }

    pub fn verify_identity(
        &self,
        verifier: &Principal,
        id: RegistryId,
    ) -> Result<(), NodeError> {
        self.registry.verify_identity(verifier, id)?;
        self.persist_record(id)?;
        self.persist_verifier_entry(verifier)
    }

    pub fn bulk_verify(
        &self,
        verifier: &Principal,
        ids: &[RegistryId],
    ) -> Result<BulkVerifyReport, NodeError> {
        let result = self.registry.bulk_verify(verifier, ids);
        match &result {
            Ok(report) => {
                for &id in &report.succeeded {
                    self.persist_record(id)?;
                }
                self.persist_verifier_entry(verifier)?;
            }
            // A pause lands mid-batch after some records were already
            // verified. Rewrite every requested row that is verified
            // now; unchanged rows are an idempotent rewrite.
            Err(RegistryError::RegistryPaused) => {
                for &id in ids {
                    if matches!(self.registry.store().get(id), Some(r) if r.is_verified) {
                        self.persist_record(id)?;
                    }
                }
                self.persist_verifier_entry(verifier)?;
            }
            Err(_) => {}
        }
        Ok(result?)
    }

    pub fn change_status(
        &self,
        admin: &Principal,
        id: RegistryId,
        new_status: IdentityStatus,
        reason: &str,
    ) -> Result<(), NodeError> {
        self.registry.change_status(admin, id, new_status, reason)?;
        self.persist_record(id)?;
        self.persist_audit_tail()
    }

    pub fn add_emergency_contact(
        &self,
        caller: &Principal,
        id: RegistryId,
        contact: EmergencyContact,
    ) -> Result<(), NodeError> {
        self.registry.add_emergency_contact(caller, id, contact)?;
        self.persist_record(id)
    }

    pub fn start_trip(&self, caller: &Principal, id: RegistryId) -> Result<(), NodeError> {
        self.registry.start_trip(caller, id)?;
        self.persist_record(id)
    }

    pub fn end_trip(&self, caller: &Principal, id: RegistryId) -> Result<(), NodeError> {
        self.registry.end_trip(caller, id)?;
        self.persist_record(id)
    }

    pub fn emergency_access(
        &self,
        responder: &Principal,
        id: RegistryId,
        reason: &str,
    ) -> Result<IdentityRecord, NodeError> {
        let record = self.registry.emergency_access(responder, id, reason)?;
        self.persist_audit_tail()?;
        Ok(record)
    }

    pub fn register_verifier(
        &self,
        admin: &Principal,
        application: VerifierApplication,
    ) -> Result<VerifierId, NodeError> {
        let principal = application.principal.clone();
        let id = self.registry.register_verifier(admin, application)?;
        if let Some(info) = self.registry.verifier(id) {
            self.storage.put_verifier(&info)?;
        }
        self.storage.put_role_grant(&principal, Role::Verifier)?;
        Ok(id)
    }

    pub fn set_verifier_active(
        &self,
        admin: &Principal,
        id: VerifierId,
        active: bool,
    ) -> Result<(), NodeError> {
        self.registry.set_verifier_active(admin, id, active)?;
        if let Some(info) = self.registry.verifier(id) {
            self.storage.put_verifier(&info)?;
            if active {
                self.storage.put_role_grant(&info.principal, Role::Verifier)?;
            } else {
                self.storage.delete_role_grant(&info.principal, Role::Verifier)?;
            }
        }
        Ok(())
    }

    pub fn grant_role(
        &self,
        caller: &Principal,
        principal: &Principal,
        role: Role,
    ) -> Result<(), NodeError> {
        self.registry.roles().grant_role(caller, principal, role)?;
        self.storage.put_role_grant(principal, role)?;
        Ok(())
    }

    pub fn revoke_role(
        &self,
        caller: &Principal,
        principal: &Principal,
        role: Role,
    ) -> Result<(), NodeError> {
        self.registry.roles().revoke_role(caller, principal, role)?;
        self.storage.delete_role_grant(principal, role)?;
        Ok(())
    }

    pub fn pause(&self, admin: &Principal) -> Result<(), NodeError> {
        Ok(self.registry.pause(admin)?)
    }

    pub fn resume(&self, admin: &Principal) -> Result<(), NodeError> {
        Ok(self.registry.resume(admin)?)
    }

    // ---- persistence helpers ----

    fn persist_record(&self, id: RegistryId) -> Result<(), NodeError> {
        if let Some(record) = self.registry.store().get(id) {
            self.storage.put_record(&record)?;
        }
        Ok(())
    }

    fn persist_verifier_entry(&self, principal: &Principal) -> Result<(), NodeError> {
        if let Some(info) = self.registry.verifier_by_principal(principal) {
            self.storage.put_verifier(&info)?;
        }
        Ok(())
    }

    /// Persist audit entries appended since the last write-through.
    fn persist_audit_tail(&self) -> Result<(), NodeError> {
        let last = self.persisted_audit_seq.load(Ordering::SeqCst);
        for entry in self.registry.audit().since(last) {
            self.storage.put_audit_entry(&entry)?;
            self.persisted_audit_seq.fetch_max(entry.seq, Ordering::SeqCst);
        }
        Ok(())
    }
}
