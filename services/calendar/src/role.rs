//! Role administration

use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult, DatabaseResultExt, triage},
    models::{CreateRoleRequest, Role, RoleAssignmentRequest, RoleChanges, User},
    repositories::{RoleRepository, UserRepository},
    state::SharedClock,
    validation::require_non_empty,
};

/// Role manager
#[derive(Clone)]
pub struct RoleService {
    roles: RoleRepository,
    users: UserRepository,
    clock: SharedClock,
}

/// Role ids arrive as path text; anything that is not a number names no role
pub fn parse_role_id(raw: &str) -> ApiResult<i64> {
    raw.trim().parse().map_err(|_| ApiError::RoleNotFound)
}

impl RoleService {
    /// Create a new role manager
    pub fn new(roles: RoleRepository, users: UserRepository, clock: SharedClock) -> Self {
        Self {
            roles,
            users,
            clock,
        }
    }

    /// All live roles ordered by name
    pub async fn list(&self) -> ApiResult<Vec<Role>> {
        self.roles.list().await.or_api_error(ApiError::Internal)
    }

    pub async fn get(&self, role_id: &str) -> ApiResult<Role> {
        let role_id = parse_role_id(role_id)?;
        self.roles
            .find_by_id(role_id)
            .await
            .not_found_or(ApiError::RoleNotFound, ApiError::Internal)
    }

    /// Create a role with a unique name, returning its ID
    pub async fn create(&self, request: &CreateRoleRequest) -> ApiResult<i64> {
        require_non_empty("name", &request.name)?;

        if self
            .roles
            .name_taken(&request.name, None)
            .await
            .or_api_error(ApiError::RoleCreation)?
        {
            return Err(ApiError::RoleAlreadyExists);
        }

        self.roles
            .create(
                &request.name,
                request.description.as_deref(),
                self.clock.utc(),
            )
            .await
            .conflict_or(ApiError::RoleAlreadyExists, ApiError::RoleCreation)
    }

    /// Update the supplied fields of a role
    pub async fn update(&self, role_id: &str, changes: &RoleChanges) -> ApiResult<Role> {
        let role = self.get(role_id).await?;

        if let Some(name) = &changes.name {
            require_non_empty("name", name)?;

            if self
                .roles
                .name_taken(name, Some(role.role_id))
                .await
                .or_api_error(ApiError::RoleUpdate)?
            {
                return Err(ApiError::RoleAlreadyExists);
            }
        }

        self.roles
            .update(role.role_id, changes, self.clock.utc())
            .await
            .map_err(|e| {
                triage(
                    e,
                    Some(ApiError::RoleNotFound),
                    Some(ApiError::RoleAlreadyExists),
                    ApiError::RoleUpdate,
                )
            })
    }

    /// Delete a role, then its assignments
    ///
    /// The role stays deleted even when the assignments cannot be cleaned up.
    pub async fn delete(&self, role_id: &str) -> ApiResult<()> {
        let role_id = parse_role_id(role_id)?;
        let now = self.clock.utc();

        self.roles
            .soft_delete(role_id, now)
            .await
            .not_found_or(ApiError::RoleNotFound, ApiError::RoleDelete)?;

        match self.roles.delete_assignments(role_id, now).await {
            Ok(count) => info!("Removed {} assignments of role {}", count, role_id),
            Err(e) => warn!("Failed to remove assignments of role {}: {}", role_id, e),
        }

        Ok(())
    }

    /// Give a live role to a live user
    pub async fn assign(&self, request: &RoleAssignmentRequest) -> ApiResult<()> {
        self.users
            .find_by_id(request.user_id)
            .await
            .not_found_or(ApiError::UserNotFound, ApiError::UserVerification)?;
        self.roles
            .find_by_id(request.role_id)
            .await
            .not_found_or(ApiError::RoleNotFound, ApiError::RoleAssignment)?;

        if self
            .roles
            .assignment_exists(request.user_id, request.role_id)
            .await
            .or_api_error(ApiError::RoleAssignment)?
        {
            return Err(ApiError::RoleAlreadyAssigned);
        }

        self.roles
            .assign(request.user_id, request.role_id, self.clock.utc())
            .await
            .conflict_or(ApiError::RoleAlreadyAssigned, ApiError::RoleAssignment)?;

        Ok(())
    }

    /// Remove a live assignment
    pub async fn revoke(&self, request: &RoleAssignmentRequest) -> ApiResult<()> {
        self.roles
            .revoke(request.user_id, request.role_id, self.clock.utc())
            .await
            .not_found_or(ApiError::UserRoleNotFound, ApiError::RoleRevocation)
    }

    /// Live roles of an already resolved user
    pub async fn roles_of(&self, user: &User) -> ApiResult<Vec<Role>> {
        self.roles
            .roles_for_user(user.user_id)
            .await
            .or_api_error(ApiError::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_numeric_role_id_is_not_found() {
        assert_eq!(parse_role_id("admin"), Err(ApiError::RoleNotFound));
        assert_eq!(parse_role_id(""), Err(ApiError::RoleNotFound));
        assert_eq!(parse_role_id("42"), Ok(42));
    }
}
