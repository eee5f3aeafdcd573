use chrono::Utc;
use serde::{Deserialize, Serialize};

use yatri_core::{Principal, RegistryId, Role};

use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::registry::IdentityRegistry;

/// Outcome of a bulk verification batch. Ids that could not be verified
/// (missing, already verified, not active) land in `skipped`; the batch
/// itself still succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkVerifyReport {
    pub attempted: usize,
    pub succeeded: Vec<RegistryId>,
    pub skipped: Vec<RegistryId>,
}

impl IdentityRegistry {
    /// Verify a batch of identities. The caller must hold the Verifier
    /// role; batches above the configured ceiling are rejected outright.
    ///
    /// Items are processed independently, each under its own critical
    /// section, so a large batch never blocks unrelated operations. The
    /// batch is not transactional: a pause landing mid-batch aborts the
    /// remainder, and items already verified stay verified.
    pub fn bulk_verify(
        &self,
        verifier: &Principal,
        ids: &[RegistryId],
    ) -> Result<BulkVerifyReport, RegistryError> {
        self.roles.ensure(verifier, Role::Verifier)?;
        if ids.len() > self.limits.max_bulk_batch {
            return Err(RegistryError::BatchTooLarge {
                size: ids.len(),
                limit: self.limits.max_bulk_batch,
            });
        }
        if self.store.is_paused() {
            return Err(RegistryError::RegistryPaused);
        }

        let mut report = BulkVerifyReport {
            attempted: ids.len(),
            succeeded: Vec::new(),
            skipped: Vec::new(),
        };
        let now = Utc::now();

        for &id in ids {
            match self
                .store
                .update(id, |record| Self::mark_verified(record, verifier, now))
            {
                Ok(()) => {
                    self.directory.record_verification(verifier);
                    report.succeeded.push(id);
                }
                Err(
                    reason @ (RegistryError::RecordNotFound(_)
                    | RegistryError::AlreadyVerified(_)
                    | RegistryError::RecordNotActive { .. }),
                ) => {
                    tracing::debug!(id = %id, reason = %reason, "bulk verify item skipped");
                    report.skipped.push(id);
                }
                Err(err) => {
                    // A pause landed mid-batch. Record what did change,
                    // then abort the remainder.
                    if !report.succeeded.is_empty() {
                        self.events.append(RegistryEvent::BulkVerified {
                            verifier: verifier.clone(),
                            verified: report.succeeded.clone(),
                            at: now,
                        });
                    }
                    tracing::warn!(
                        verifier = %verifier,
                        verified = report.succeeded.len(),
                        error = %err,
                        "bulk verification aborted"
                    );
                    return Err(err);
                }
            }
        }

        self.events.append(RegistryEvent::BulkVerified {
            verifier: verifier.clone(),
            verified: report.succeeded.clone(),
            at: now,
        });
        tracing::info!(
            verifier = %verifier,
            attempted = report.attempted,
            succeeded = report.succeeded.len(),
            skipped = report.skipped.len(),
            "bulk verification completed"
        );
        Ok(report)
    }
}
