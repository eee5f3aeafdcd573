//! Persistent storage backed by RocksDB.
//!
//! One column family per table: identity records, the verifier
//! directory, role grants, and the audit log. Values are JSON; numeric
//! keys are zero-padded so iteration returns rows in id order. The
//! in-memory registry is the source of truth at runtime and rows are
//! written through after each successful mutation.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, DB};
use serde::{Deserialize, Serialize};

use yatri_core::{Principal, RegistryId, Role, VerifierId};
use yatri_registry::{AuditEntry, IdentityRecord, VerifierInfo};

const CF_IDENTITIES: &str = "identities";
const CF_VERIFIERS: &str = "verifiers";
const CF_ROLE_GRANTS: &str = "role_grants";
const CF_AUDIT_LOG: &str = "audit_log";

/// A persisted role grant. The key encodes (role, principal) for
/// uniqueness; the row carries both so loading never parses keys.
#[derive(Debug, Serialize, Deserialize)]
struct RoleGrantRow {
    principal: Principal,
    role: Role,
}

/// RocksDB-backed storage for the registry node.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_IDENTITIES, Options::default()),
            ColumnFamilyDescriptor::new(CF_VERIFIERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_ROLE_GRANTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_AUDIT_LOG, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        tracing::info!(path = %path.display(), "storage opened");
        Ok(Self { db })
    }

    fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow!("missing column family: {cf_name}"))?;
        self.db.put_cf(&cf, key, value)?;
        Ok(())
    }

    fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow!("missing column family: {cf_name}"))?;
        Ok(self.db.get_cf(&cf, key)?)
    }

    fn delete(&self, cf_name: &str, key: &[u8]) -> Result<()> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow!("missing column family: {cf_name}"))?;
        self.db.delete_cf(&cf, key)?;
        Ok(())
    }

    fn load_all<T: serde::de::DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow!("missing column family: {cf_name}"))?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }

    fn record_key(id: RegistryId) -> String {
        format!("{:020}", id.value())
    }

    fn audit_key(seq: u64) -> String {
        format!("{:020}", seq)
    }

    fn role_grant_key(principal: &Principal, role: Role) -> String {
        // Role names never contain '/', so the key parses unambiguously
        // even though principals may.
        format!("{}/{}", role, principal)
    }

    // ---- identity records ----

    pub fn put_record(&self, record: &IdentityRecord) -> Result<()> {
        let value = serde_json::to_vec(record)?;
        self.put(
            CF_IDENTITIES,
            Self::record_key(record.registry_id).as_bytes(),
            &value,
        )
    }

    pub fn get_record(&self, id: RegistryId) -> Result<Option<IdentityRecord>> {
        match self.get(CF_IDENTITIES, Self::record_key(id).as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// All identity records, in registry id order.
    pub fn load_records(&self) -> Result<Vec<IdentityRecord>> {
        self.load_all(CF_IDENTITIES)
    }

    // ---- verifier directory ----

    pub fn put_verifier(&self, info: &VerifierInfo) -> Result<()> {
        let value = serde_json::to_vec(info)?;
        self.put(
            CF_VERIFIERS,
            info.verifier_id.to_string().as_bytes(),
            &value,
        )
    }

    pub fn get_verifier(&self, id: VerifierId) -> Result<Option<VerifierInfo>> {
        match self.get(CF_VERIFIERS, id.to_string().as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn load_verifiers(&self) -> Result<Vec<VerifierInfo>> {
        self.load_all(CF_VERIFIERS)
    }

    // ---- role grants ----

    pub fn put_role_grant(&self, principal: &Principal, role: Role) -> Result<()> {
        let row = RoleGrantRow {
            principal: principal.clone(),
            role,
        };
        let value = serde_json::to_vec(&row)?;
        self.put(
            CF_ROLE_GRANTS,
            Self::role_grant_key(principal, role).as_bytes(),
            &value,
        )
    }

    pub fn delete_role_grant(&self, principal: &Principal, role: Role) -> Result<()> {
        self.delete(
            CF_ROLE_GRANTS,
            Self::role_grant_key(principal, role).as_bytes(),
        )
    }

    pub fn load_role_grants(&self) -> Result<Vec<(Principal, Role)>> {
        let rows: Vec<RoleGrantRow> = self.load_all(CF_ROLE_GRANTS)?;
        Ok(rows.into_iter().map(|r| (r.principal, r.role)).collect())
    }

    // ---- audit log ----

    pub fn put_audit_entry(&self, entry: &AuditEntry) -> Result<()> {
        let value = serde_json::to_vec(entry)?;
        self.put(CF_AUDIT_LOG, Self::audit_key(entry.seq).as_bytes(), &value)
    }

    /// All audit entries, in sequence order.
    pub fn load_audit_entries(&self) -> Result<Vec<AuditEntry>> {
        self.load_all(CF_AUDIT_LOG)
    }
}
