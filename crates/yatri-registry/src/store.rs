use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use yatri_core::{ExternalIdHash, Principal, RegistryId};

use crate::error::RegistryError;
use crate::record::IdentityRecord;

/// The identity table: records plus both uniqueness indexes and the
/// pause flag, all behind one lock. Keeping the flag inside the table
/// means a gated mutation checks it in the same critical section that
/// applies the change.
struct IdentityTable {
    next_id: u64,
    records: BTreeMap<RegistryId, IdentityRecord>,
    by_owner: HashMap<Principal, RegistryId>,
    by_external: HashMap<ExternalIdHash, RegistryId>,
    paused: bool,
}

/// Concurrent store of identity records with injective owner and
/// external-id indexes. Ids are allocated monotonically from 1 and
/// never reused; records are never physically deleted.
pub struct IdentityStore {
    table: RwLock<IdentityTable>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(IdentityTable {
                next_id: 1,
                records: BTreeMap::new(),
                by_owner: HashMap::new(),
                by_external: HashMap::new(),
                paused: false,
            }),
        }
    }

    /// Insert a new record. Uniqueness checks, id allocation, and index
    /// insertion happen under one write lock; the builder closure receives
    /// the allocated id. Fails when paused or when either key is taken.
    pub fn insert_with(
        &self,
        owner: &Principal,
        external_id_hash: &ExternalIdHash,
        build: impl FnOnce(RegistryId) -> IdentityRecord,
    ) -> Result<RegistryId, RegistryError> {
        let mut table = self.table.write().unwrap();
        if table.paused {
            return Err(RegistryError::RegistryPaused);
        }
        if table.by_owner.contains_key(owner) {
            return Err(RegistryError::DuplicateOwner(owner.clone()));
        }
        if table.by_external.contains_key(external_id_hash) {
            return Err(RegistryError::DuplicateExternalId(*external_id_hash));
        }

        let id = RegistryId(table.next_id);
        table.next_id += 1;
        table.by_owner.insert(owner.clone(), id);
        table.by_external.insert(*external_id_hash, id);
        table.records.insert(id, build(id));
        Ok(id)
    }

    /// Read-modify-write a record under the write lock. Gated by the
    /// pause flag.
    pub fn update<T>(
        &self,
        id: RegistryId,
        f: impl FnOnce(&mut IdentityRecord) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut table = self.table.write().unwrap();
        if table.paused {
            return Err(RegistryError::RegistryPaused);
        }
        let record = table
            .records
            .get_mut(&id)
            .ok_or(RegistryError::RecordNotFound(id))?;
        f(record)
    }

    /// Read-modify-write exempt from the pause gate. Admin-plane
    /// operations (status changes) use this so an incident freeze cannot
    /// block revocations.
    pub fn admin_update<T>(
        &self,
        id: RegistryId,
        f: impl FnOnce(&mut IdentityRecord) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut table = self.table.write().unwrap();
        let record = table
            .records
            .get_mut(&id)
            .ok_or(RegistryError::RecordNotFound(id))?;
        f(record)
    }

    pub fn get(&self, id: RegistryId) -> Option<IdentityRecord> {
        self.table.read().unwrap().records.get(&id).cloned()
    }

    pub fn get_by_owner(&self, owner: &Principal) -> Option<IdentityRecord> {
        let table = self.table.read().unwrap();
        let id = table.by_owner.get(owner)?;
        table.records.get(id).cloned()
    }

    pub fn get_by_external(&self, hash: &ExternalIdHash) -> Option<IdentityRecord> {
        let table = self.table.read().unwrap();
        let id = table.by_external.get(hash)?;
        table.records.get(id).cloned()
    }

    /// Visit every record under the read lock, in id order.
    pub fn for_each(&self, mut f: impl FnMut(&IdentityRecord)) {
        let table = self.table.read().unwrap();
        for record in table.records.values() {
            f(record);
        }
    }

    pub fn len(&self) -> usize {
        self.table.read().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pause(&self) {
        self.table.write().unwrap().paused = true;
    }

    pub fn resume(&self) {
        self.table.write().unwrap().paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.table.read().unwrap().paused
    }

    /// Rehydrate a record from storage: inserts it, rebuilds both
    /// indexes, and advances the id counter past it.
    pub fn restore(&self, record: IdentityRecord) {
        let mut table = self.table.write().unwrap();
        let id = record.registry_id;
        table.next_id = table.next_id.max(id.0 + 1);
        table.by_owner.insert(record.owner.clone(), id);
        table.by_external.insert(record.external_id_hash, id);
        table.records.insert(id, record);
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}
