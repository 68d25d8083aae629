use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use schooldesk_application::{
    AuthorizationService, CreateUserInput, PermissionRepository, RoleInput, RoleRepository,
    UserService,
};
use schooldesk_core::AppResult;
use schooldesk_domain::{Permission, PermissionName, Role, permission_catalog};
use schooldesk_infrastructure::{
    Argon2PasswordHasher, PostgresAuditRepository, PostgresAuthorizationRepository,
    PostgresPermissionRepository, PostgresRoleRepository, PostgresUserRepository,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::SeedAdminConfig;

const ADMIN_ROLE_NAME: &str = "Admin";

/// Prepares a fresh installation: catalog permissions, an `Admin` role
/// holding all of them and, when configured, an administrator account.
///
/// Safe to re-run; existing rows and any extra Admin grants are kept.
pub async fn run(pool: PgPool, seed_admin: Option<&SeedAdminConfig>) -> AppResult<()> {
    let permission_repository = Arc::new(PostgresPermissionRepository::new(pool.clone()));
    let role_repository = Arc::new(PostgresRoleRepository::new(pool.clone()));

    let existing = permission_repository.list_permissions().await?;
    let missing = missing_catalog_permissions(&existing)?;
    for name in &missing {
        permission_repository.create_permission(name).await?;
    }
    info!(created = missing.len(), "seeded catalog permissions");

    let admin_role = ensure_admin_role(role_repository.as_ref()).await?;

    let Some(seed_admin) = seed_admin else {
        info!("SEED_ADMIN_EMAIL not set, skipping administrator account");
        return Ok(());
    };

    let authorization_service = AuthorizationService::bootstrap(
        permission_repository,
        Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
    )
    .await;
    let user_service = UserService::new(
        Arc::new(PostgresUserRepository::new(pool.clone())),
        Arc::new(Argon2PasswordHasher::new()?),
        authorization_service,
        Arc::new(PostgresAuditRepository::new(pool)),
    );

    let user = user_service
        .ensure_user(CreateUserInput {
            email: seed_admin.email.clone(),
            display_name: seed_admin.display_name.clone(),
            password: seed_admin.password.clone(),
        })
        .await?;
    role_repository
        .assign_role_to_subject(&user.id.to_string(), admin_role.id())
        .await?;

    info!(user_id = %user.id, role_id = %admin_role.id(), "seeded administrator account");
    Ok(())
}

async fn ensure_admin_role(role_repository: &dyn RoleRepository) -> AppResult<Role> {
    let existing = role_repository
        .list_roles()
        .await?
        .into_iter()
        .find(|role| role.name().as_str() == ADMIN_ROLE_NAME);

    let input = RoleInput {
        name: ADMIN_ROLE_NAME.to_owned(),
        permissions: admin_role_grants(existing.as_ref())?,
    };

    match existing {
        Some(role) => role_repository.update_role(role.id(), input).await,
        None => role_repository.create_role(input).await,
    }
}

/// Catalog names plus whatever the existing role already grants.
fn admin_role_grants(existing: Option<&Role>) -> AppResult<Vec<PermissionName>> {
    let mut grants: BTreeSet<PermissionName> = catalog_permission_names()?.into_iter().collect();
    if let Some(role) = existing {
        grants.extend(role.permissions().iter().cloned());
    }

    Ok(grants.into_iter().collect())
}

fn catalog_permission_names() -> AppResult<Vec<PermissionName>> {
    permission_catalog::all()
        .iter()
        .map(|name| PermissionName::new(*name))
        .collect()
}

fn missing_catalog_permissions(existing: &[Permission]) -> AppResult<Vec<PermissionName>> {
    let present: HashSet<&str> = existing
        .iter()
        .map(|permission| permission.name().as_str())
        .collect();

    Ok(catalog_permission_names()?
        .into_iter()
        .filter(|name| !present.contains(name.as_str()))
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use schooldesk_domain::RecordTimestamps;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn only_absent_catalog_names_are_missing() -> AppResult<()> {
        let existing = vec![
            Permission::new(
                Uuid::new_v4(),
                PermissionName::new(permission_catalog::OPCR_ACCESS)?,
                Utc::now(),
            ),
            Permission::new(
                Uuid::new_v4(),
                PermissionName::new("custom_report_access")?,
                Utc::now(),
            ),
        ];

        let missing = missing_catalog_permissions(&existing)?;

        assert_eq!(missing.len(), permission_catalog::all().len() - 1);
        assert!(
            missing
                .iter()
                .all(|name| name.as_str() != permission_catalog::OPCR_ACCESS)
        );
        Ok(())
    }

    #[test]
    fn fresh_installation_misses_whole_catalog() -> AppResult<()> {
        let missing = missing_catalog_permissions(&[])?;
        assert_eq!(missing.len(), permission_catalog::all().len());
        Ok(())
    }

    #[test]
    fn reseeding_keeps_custom_admin_grants() -> AppResult<()> {
        let custom = PermissionName::new("report_export")?;
        let admin = Role::new(
            Uuid::new_v4(),
            ADMIN_ROLE_NAME,
            [
                custom.clone(),
                PermissionName::new(permission_catalog::USER_ACCESS)?,
            ],
            RecordTimestamps::created(Utc::now()),
        )?;

        let grants = admin_role_grants(Some(&admin))?;

        assert!(grants.contains(&custom));
        assert_eq!(grants.len(), permission_catalog::all().len() + 1);
        Ok(())
    }

    #[test]
    fn new_admin_role_gets_whole_catalog() -> AppResult<()> {
        let grants = admin_role_grants(None)?;
        assert_eq!(grants.len(), permission_catalog::all().len());
        Ok(())
    }
}
