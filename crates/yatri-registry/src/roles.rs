use std::collections::HashSet;

use dashmap::DashMap;

use yatri_core::{Principal, Role};

use crate::error::RegistryError;

/// Holds role grants for every principal the registry recognizes.
///
/// Grants are (principal, role) pairs; a principal may hold several roles.
/// Granting and revoking are themselves admin-gated, so the authority is
/// seeded with a root admin at construction.
pub struct RoleAuthority {
    grants: DashMap<Principal, HashSet<Role>>,
}

impl RoleAuthority {
    /// Create a role authority with a single root admin.
    pub fn new(root_admin: Principal) -> Self {
        let authority = Self {
            grants: DashMap::new(),
        };
        authority
            .grants
            .insert(root_admin, HashSet::from([Role::Admin]));
        authority
    }

    /// Whether the principal holds the given role.
    pub fn has_role(&self, principal: &Principal, role: Role) -> bool {
        self.grants
            .get(principal)
            .map(|roles| roles.contains(&role))
            .unwrap_or(false)
    }

    /// Require the principal to hold the given role.
    pub fn ensure(&self, principal: &Principal, role: Role) -> Result<(), RegistryError> {
        if self.has_role(principal, role) {
            Ok(())
        } else {
            Err(RegistryError::MissingRole {
                principal: principal.clone(),
                role,
            })
        }
    }

    /// Grant a role. The caller must be an admin.
    pub fn grant_role(
        &self,
        caller: &Principal,
        principal: &Principal,
        role: Role,
    ) -> Result<(), RegistryError> {
        self.ensure(caller, Role::Admin)?;
        self.grants
            .entry(principal.clone())
            .or_default()
            .insert(role);
        tracing::info!(
            principal = %principal,
            role = %role,
            granted_by = %caller,
            "role granted"
        );
        Ok(())
    }

    /// Revoke a role. The caller must be an admin. Revoking a role the
    /// principal does not hold is a no-op.
    pub fn revoke_role(
        &self,
        caller: &Principal,
        principal: &Principal,
        role: Role,
    ) -> Result<(), RegistryError> {
        self.ensure(caller, Role::Admin)?;
        if let Some(mut roles) = self.grants.get_mut(principal) {
            roles.remove(&role);
        }
        tracing::info!(
            principal = %principal,
            role = %role,
            revoked_by = %caller,
            "role revoked"
        );
        Ok(())
    }

    /// Rehydrate a grant from storage. Bypasses the admin gate.
    pub fn restore(&self, principal: Principal, role: Role) {
        self.grants.entry(principal).or_default().insert(role);
    }

    /// Snapshot of every grant as (principal, role) pairs.
    pub fn all_grants(&self) -> Vec<(Principal, Role)> {
        self.grants
            .iter()
            .flat_map(|entry| {
                let principal = entry.key().clone();
                entry
                    .value()
                    .iter()
                    .map(|role| (principal.clone(), *role))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
