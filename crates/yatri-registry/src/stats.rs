use serde::{Deserialize, Serialize};

use yatri_core::IdentityStatus;

use crate::directory::VerifierDirectory;
use crate::store::IdentityStore;

/// Registry counters for dashboards and the status endpoint. Computed by
/// scanning the live tables; nothing is cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_records: u64,
    pub active_records: u64,
    /// Verified records in any status.
    pub verified_records: u64,
    /// Active records awaiting verification.
    pub pending_verification: u64,
    pub revoked_records: u64,
    pub total_verifiers: u64,
    pub active_verifiers: u64,
}

impl RegistryStats {
    pub fn collect(store: &IdentityStore, directory: &VerifierDirectory) -> Self {
        let mut stats = Self::default();
        store.for_each(|record| {
            stats.total_records += 1;
            match record.status {
                IdentityStatus::Active => {
                    stats.active_records += 1;
                    if !record.is_verified {
                        stats.pending_verification += 1;
                    }
                }
                IdentityStatus::Revoked => stats.revoked_records += 1,
                IdentityStatus::Suspended | IdentityStatus::Expired => {}
            }
            if record.is_verified {
                stats.verified_records += 1;
            }
        });

        let (total, active) = directory.counts();
        stats.total_verifiers = total as u64;
        stats.active_verifiers = active as u64;
        stats
    }
}
