use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yatri_core::{Principal, VerifierId};

use crate::error::RegistryError;

/// An onboarded verifier: a government office, police post, or partner
/// organization authorized to verify identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierInfo {
    pub verifier_id: VerifierId,
    pub principal: Principal,
    pub organization: String,
    /// Human-readable function ("immigration officer", "tourist police").
    pub role_label: String,
    pub jurisdiction: String,
    pub active: bool,
    pub registered_by: Principal,
    pub registered_at: DateTime<Utc>,
    /// Lifetime count of verifications performed.
    pub verifications: u64,
}

/// Application payload for onboarding a verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierApplication {
    pub principal: Principal,
    pub organization: String,
    pub role_label: String,
    pub jurisdiction: String,
}

#[derive(Default)]
struct VerifierTable {
    by_id: HashMap<VerifierId, VerifierInfo>,
    by_principal: HashMap<Principal, VerifierId>,
}

/// Directory of onboarded verifiers, keyed by verifier id with a
/// principal index. Distinct from the role authority: the directory is
/// bookkeeping (who they are, how many verifications), the role grant
/// is what authorizes.
pub struct VerifierDirectory {
    table: RwLock<VerifierTable>,
}

impl VerifierDirectory {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(VerifierTable::default()),
        }
    }

    /// Add a verifier. At most one entry per principal.
    pub fn register(&self, info: VerifierInfo) -> Result<(), RegistryError> {
        let mut table = self.table.write().unwrap();
        if table.by_principal.contains_key(&info.principal) {
            return Err(RegistryError::DuplicateVerifier(info.principal.clone()));
        }
        table.by_principal.insert(info.principal.clone(), info.verifier_id);
        table.by_id.insert(info.verifier_id, info);
        Ok(())
    }

    pub fn get(&self, id: VerifierId) -> Option<VerifierInfo> {
        self.table.read().unwrap().by_id.get(&id).cloned()
    }

    pub fn get_by_principal(&self, principal: &Principal) -> Option<VerifierInfo> {
        let table = self.table.read().unwrap();
        let id = table.by_principal.get(principal)?;
        table.by_id.get(id).cloned()
    }

    /// Flip the active flag, returning the updated entry.
    pub fn set_active(
        &self,
        id: VerifierId,
        active: bool,
    ) -> Result<VerifierInfo, RegistryError> {
        let mut table = self.table.write().unwrap();
        let info = table
            .by_id
            .get_mut(&id)
            .ok_or(RegistryError::VerifierNotFound(id))?;
        info.active = active;
        Ok(info.clone())
    }

    /// Bump the verification counter for a principal's entry, returning
    /// the updated entry. `None` when the principal was never onboarded.
    pub fn record_verification(&self, principal: &Principal) -> Option<VerifierInfo> {
        let mut table = self.table.write().unwrap();
        let id = *table.by_principal.get(principal)?;
        let info = table.by_id.get_mut(&id)?;
        info.verifications += 1;
        Some(info.clone())
    }

    /// All entries, unordered.
    pub fn list(&self) -> Vec<VerifierInfo> {
        self.table.read().unwrap().by_id.values().cloned().collect()
    }

    /// (total, active) counts.
    pub fn counts(&self) -> (usize, usize) {
        let table = self.table.read().unwrap();
        let total = table.by_id.len();
        let active = table.by_id.values().filter(|v| v.active).count();
        (total, active)
    }

    /// Rehydrate an entry from storage.
    pub fn restore(&self, info: VerifierInfo) {
        let mut table = self.table.write().unwrap();
        table.by_principal.insert(info.principal.clone(), info.verifier_id);
        table.by_id.insert(info.verifier_id, info);
    }
}

impl Default for VerifierDirectory {
    fn default() -> Self {
        Self::new()
    }
}
