use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yatri_core::{ContentHash, IdentityStatus, Principal, RegistryId, TripState};

use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::registry::IdentityRegistry;

/// Trip itinerary submitted at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripPlan {
    pub itinerary_hash: ContentHash,
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,
    /// Free-form purpose label ("tourism", "business", "pilgrimage").
    pub purpose: String,
    pub group_size: u32,
    pub accommodation_hash: ContentHash,
}

/// Trip state carried by an identity record: the plan plus lifecycle
/// state and actual start/end times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripDetails {
    pub itinerary_hash: ContentHash,
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,
    pub purpose: String,
    pub group_size: u32,
    pub accommodation_hash: ContentHash,
    pub state: TripState,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl TripDetails {
    /// Build the stored trip from a submitted plan, not yet started.
    pub fn planned(plan: TripPlan) -> Self {
        Self {
            itinerary_hash: plan.itinerary_hash,
            planned_start: plan.planned_start,
            planned_end: plan.planned_end,
            purpose: plan.purpose,
            group_size: plan.group_size,
            accommodation_hash: plan.accommodation_hash,
            state: TripState::NotStarted,
            started_at: None,
            ended_at: None,
        }
    }
}

impl IdentityRegistry {
    /// Start the owner's trip. Requires a verified, active record whose
    /// trip has not yet started. Gated by the pause flag.
    pub fn start_trip(
        &self,
        caller: &Principal,
        id: RegistryId,
    ) -> Result<(), RegistryError> {
        let now = Utc::now();
        self.store.update(id, |record| {
            if record.owner != *caller {
                return Err(RegistryError::NotOwner {
                    principal: caller.clone(),
                    id,
                });
            }
            match record.trip.state {
                TripState::Active => return Err(RegistryError::TripAlreadyActive(id)),
                TripState::Ended => return Err(RegistryError::TripAlreadyEnded(id)),
                TripState::NotStarted => {}
            }
            if record.status != IdentityStatus::Active {
                return Err(RegistryError::RecordNotActive {
                    id,
                    status: record.status,
                });
            }
            if !record.is_verified {
                return Err(RegistryError::NotVerified(id));
            }
            record.trip.state = TripState::Active;
            record.trip.started_at = Some(now);
            Ok(())
        })?;

        self.events.append(RegistryEvent::TripStarted { id, at: now });
        tracing::info!(id = %id, owner = %caller, "trip started");
        Ok(())
    }

    /// End the owner's trip. Requires an active trip; the record's status
    /// is deliberately not checked so a suspended subject's trip can still
    /// be closed out. Gated by the pause flag.
    pub fn end_trip(&self, caller: &Principal, id: RegistryId) -> Result<(), RegistryError> {
        let now = Utc::now();
        self.store.update(id, |record| {
            if record.owner != *caller {
                return Err(RegistryError::NotOwner {
                    principal: caller.clone(),
                    id,
                });
            }
            match record.trip.state {
                TripState::NotStarted => return Err(RegistryError::TripNotStarted(id)),
                TripState::Ended => return Err(RegistryError::TripAlreadyEnded(id)),
                TripState::Active => {}
            }
            record.trip.state = TripState::Ended;
            record.trip.ended_at = Some(now);
            Ok(())
        })?;

        self.events.append(RegistryEvent::TripEnded { id, at: now });
        tracing::info!(id = %id, owner = %caller, "trip ended");
        Ok(())
    }
}
