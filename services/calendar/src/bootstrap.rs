//! Start-up provisioning of the first administrator

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    models::{NewUser, RoleAssignmentRequest, role::ADMIN_ROLE, role::DEFAULT_ROLE},
    state::AppState,
    validation::{validate_email, validate_password},
};

/// Make sure some live user holds the `admin` role
///
/// Does nothing unless `ADMIN_EMAIL` and `ADMIN_PASSWORD` are configured or
/// when an administrator already exists. An existing user with the configured
/// email is promoted, otherwise the account is created.
pub async fn ensure_admin(state: &AppState) -> Result<()> {
    let Some((email, password)) = state.settings.admin_credentials() else {
        return Ok(());
    };

    if state
        .role_repository
        .any_user_has_role(ADMIN_ROLE)
        .await
        .context("checking for an existing administrator")?
    {
        return Ok(());
    }

    let now = state.now();

    let role_id = match state
        .role_repository
        .find_by_name(ADMIN_ROLE)
        .await
        .context("loading the admin role")?
    {
        Some(role) => role.role_id,
        None => state
            .role_repository
            .create(ADMIN_ROLE, Some("Full administrative access"), now)
            .await
            .context("creating the admin role")?,
    };

    let user_id = match state
        .user_repository
        .find_by_email(email)
        .await
        .context("looking up the administrator account")?
    {
        Some(user) => user.user_id,
        None => {
            validate_email(email).context("ADMIN_EMAIL")?;
            validate_password(password).context("ADMIN_PASSWORD")?;

            let new_user = NewUser {
                lastname: "Administrator".to_string(),
                firstname: "Calendar".to_string(),
                email: email.to_string(),
                password_hash: state.passwords.hash(password).await?,
            };
            state
                .user_repository
                .create(&new_user, DEFAULT_ROLE, now)
                .await
                .context("creating the administrator account")?
        }
    };

    state
        .role_service
        .assign(&RoleAssignmentRequest { user_id, role_id })
        .await?;

    info!("Granted the admin role to {}", email);
    Ok(())
}
