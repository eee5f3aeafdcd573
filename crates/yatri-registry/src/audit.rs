use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yatri_core::{Principal, RegistryId};

/// Actions that must leave an audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    /// An admin revoked an identity record.
    Revocation,
    /// An emergency responder accessed a record.
    EmergencyAccess,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revocation => write!(f, "Revocation"),
            Self::EmergencyAccess => write!(f, "EmergencyAccess"),
        }
    }
}

/// One immutable audit entry. `reason` is mandatory for every action
/// currently recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic sequence number, assigned on append.
    pub seq: u64,
    pub action: AuditAction,
    pub actor: Principal,
    pub target: RegistryId,
    pub reason: String,
    pub at: DateTime<Utc>,
}

struct AuditTable {
    next_seq: u64,
    entries: Vec<AuditEntry>,
}

/// Append-only log of privileged and emergency actions.
pub struct AuditLog {
    inner: RwLock<AuditTable>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(AuditTable {
                next_seq: 1,
                entries: Vec::new(),
            }),
        }
    }

    /// Append an entry, returning it with its assigned sequence number.
    pub fn append(
        &self,
        action: AuditAction,
        actor: Principal,
        target: RegistryId,
        reason: impl Into<String>,
    ) -> AuditEntry {
        let mut table = self.inner.write().unwrap();
        let entry = AuditEntry {
            seq: table.next_seq,
            action,
            actor,
            target,
            reason: reason.into(),
            at: Utc::now(),
        };
        table.next_seq += 1;
        table.entries.push(entry.clone());
        entry
    }

    /// All entries targeting a record, oldest first.
    pub fn entries_for(&self, target: RegistryId) -> Vec<AuditEntry> {
        self.inner
            .read()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.target == target)
            .cloned()
            .collect()
    }

    /// The most recent `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let table = self.inner.read().unwrap();
        let start = table.entries.len().saturating_sub(limit);
        table.entries[start..].to_vec()
    }

    /// Entries with a sequence number strictly greater than `seq`.
    pub fn since(&self, seq: u64) -> Vec<AuditEntry> {
        self.inner
            .read()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.seq > seq)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rehydrate an entry from storage, keeping the counter ahead of it.
    pub fn restore(&self, entry: AuditEntry) {
        let mut table = self.inner.write().unwrap();
        table.next_seq = table.next_seq.max(entry.seq + 1);
        table.entries.push(entry);
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
