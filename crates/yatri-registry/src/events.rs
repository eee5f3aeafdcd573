use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yatri_core::{IdentityStatus, Principal, RegistryId};

/// Domain events emitted by registry operations. Observability surface
/// for dashboards and the alert pipeline; not part of persisted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistryEvent {
    Registered {
        id: RegistryId,
        owner: Principal,
        at: DateTime<Utc>,
    },
    Verified {
        id: RegistryId,
        verifier: Principal,
        at: DateTime<Utc>,
    },
    StatusChanged {
        id: RegistryId,
        from: IdentityStatus,
        to: IdentityStatus,
        by: Principal,
        at: DateTime<Utc>,
    },
    TripStarted {
        id: RegistryId,
        at: DateTime<Utc>,
    },
    TripEnded {
        id: RegistryId,
        at: DateTime<Utc>,
    },
    BulkVerified {
        verifier: Principal,
        verified: Vec<RegistryId>,
        at: DateTime<Utc>,
    },
}

impl RegistryEvent {
    /// Short label for logs and API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "registered",
            Self::Verified { .. } => "verified",
            Self::StatusChanged { .. } => "status_changed",
            Self::TripStarted { .. } => "trip_started",
            Self::TripEnded { .. } => "trip_ended",
            Self::BulkVerified { .. } => "bulk_verified",
        }
    }
}

/// In-memory append-only journal of registry events.
pub struct EventJournal {
    events: RwLock<Vec<RegistryEvent>>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn append(&self, event: RegistryEvent) {
        tracing::debug!(kind = event.kind(), "registry event");
        self.events.write().unwrap().push(event);
    }

    /// Events from `offset` onward. An offset past the end yields none.
    pub fn since(&self, offset: usize) -> Vec<RegistryEvent> {
        let events = self.events.read().unwrap();
        if offset >= events.len() {
            return Vec::new();
        }
        events[offset..].to_vec()
    }

    pub fn all(&self) -> Vec<RegistryEvent> {
        self.events.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new()
    }
}
