use std::sync::Arc;

use proptest::prelude::*;
use schooldesk_core::{AppError, AppResult};
use schooldesk_domain::{PermissionName, permission_catalog};
use uuid::Uuid;

use crate::test_support::{FakeSecurityStore, actor};
use crate::{RoleInput, RoleRepository};

use super::AuthorizationService;

async fn service_for(store: &Arc<FakeSecurityStore>) -> AuthorizationService {
    AuthorizationService::bootstrap(store.clone(), store.clone()).await
}

fn names(values: &[&str]) -> AppResult<Vec<PermissionName>> {
    values.iter().map(|value| PermissionName::new(*value)).collect()
}

async fn admin_role(store: &FakeSecurityStore, permissions: &[&str]) -> AppResult<Uuid> {
    let role = store
        .create_role(RoleInput {
            name: "Admin".to_owned(),
            permissions: names(permissions)?,
        })
        .await?;
    Ok(role.id())
}

#[tokio::test]
async fn require_permission_allows_granted_subject() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    let role_id = admin_role(&store, &[permission_catalog::OPCR_ACCESS]).await?;
    store.assign_role_to_subject("alice", role_id).await?;
    let service = service_for(&store).await;

    service
        .require_permission(&actor("alice"), permission_catalog::OPCR_ACCESS)
        .await
}

#[tokio::test]
async fn require_permission_denies_missing_grant() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    let service = service_for(&store).await;

    let result = service
        .require_permission(&actor("alice"), permission_catalog::OPCR_CREATE)
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    Ok(())
}

#[tokio::test]
async fn bootstrap_registers_every_stored_permission() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    let service = service_for(&store).await;

    assert_eq!(
        service.registered_permission_count().await,
        permission_catalog::all().len()
    );
    for name in permission_catalog::all() {
        assert!(service.is_registered(name).await);
    }
    assert!(!service.is_registered("report_export").await);
    Ok(())
}

#[tokio::test]
async fn unregistered_name_is_denied_despite_membership() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    let role_id = admin_role(&store, &[permission_catalog::DCP_ACCESS]).await?;
    store.assign_role_to_subject("alice", role_id).await?;
    store.forget_permission(permission_catalog::DCP_ACCESS).await;

    let service = service_for(&store).await;

    assert!(!service.is_authorized("alice", permission_catalog::DCP_ACCESS).await);
    assert!(matches!(
        service
            .require_permission(&actor("alice"), permission_catalog::DCP_ACCESS)
            .await,
        Err(AppError::Forbidden(_))
    ));
    Ok(())
}

#[tokio::test]
async fn empty_permission_store_denies_everything() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::default());
    let service = service_for(&store).await;

    assert_eq!(service.registered_permission_count().await, 0);
    for name in permission_catalog::all() {
        assert!(!service.is_authorized("alice", name).await);
    }
    Ok(())
}

#[tokio::test]
async fn unavailable_store_at_startup_degrades_until_reload() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    store
        .grant_subject_permission("alice", &PermissionName::new(permission_catalog::ROLE_ACCESS)?)
        .await?;
    store.set_unavailable(true).await;

    let service = service_for(&store).await;
    store.set_unavailable(false).await;

    assert_eq!(service.registered_permission_count().await, 0);
    assert!(!service.is_authorized("alice", permission_catalog::ROLE_ACCESS).await);

    service.reload().await?;
    assert!(service.is_authorized("alice", permission_catalog::ROLE_ACCESS).await);
    Ok(())
}

#[tokio::test]
async fn failed_reload_keeps_previous_registry() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    let service = service_for(&store).await;
    store.set_unavailable(true).await;

    assert!(service.reload().await.is_err());
    assert_eq!(
        service.registered_permission_count().await,
        permission_catalog::all().len()
    );
    Ok(())
}

#[tokio::test]
async fn lookup_failure_is_a_denial() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    store
        .grant_subject_permission("alice", &PermissionName::new(permission_catalog::USER_ACCESS)?)
        .await?;
    let service = service_for(&store).await;
    store.set_unavailable(true).await;

    assert!(!service.is_authorized("alice", permission_catalog::USER_ACCESS).await);
    assert!(
        service
            .require_permission(&actor("alice"), permission_catalog::USER_ACCESS)
            .await
            .is_err()
    );
    Ok(())
}

#[tokio::test]
async fn role_edit_takes_effect_without_rebuilding_registry() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    let role_id = admin_role(
        &store,
        &[permission_catalog::USER_ACCESS, permission_catalog::ROLE_ACCESS],
    )
    .await?;
    store.assign_role_to_subject("alice", role_id).await?;
    let service = service_for(&store).await;
    let registered = service.registered_permission_count().await;

    assert!(service.is_authorized("alice", permission_catalog::USER_ACCESS).await);

    store
        .update_role(
            role_id,
            RoleInput {
                name: "Admin".to_owned(),
                permissions: names(&[permission_catalog::ROLE_ACCESS])?,
            },
        )
        .await?;

    assert!(!service.is_authorized("alice", permission_catalog::USER_ACCESS).await);
    assert!(service.is_authorized("alice", permission_catalog::ROLE_ACCESS).await);
    assert_eq!(service.registered_permission_count().await, registered);
    Ok(())
}

#[tokio::test]
async fn deleted_role_stops_granting() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    let role_id = admin_role(&store, &[permission_catalog::OPCR_EDIT]).await?;
    store.assign_role_to_subject("alice", role_id).await?;
    let service = service_for(&store).await;

    store.soft_delete_role(role_id).await?;

    assert!(!service.is_authorized("alice", permission_catalog::OPCR_EDIT).await);
    Ok(())
}

#[tokio::test]
async fn granted_permissions_lists_registered_names_once() -> AppResult<()> {
    let store = Arc::new(FakeSecurityStore::with_catalog().await?);
    let role_id = admin_role(
        &store,
        &[permission_catalog::DCP_ACCESS, permission_catalog::DCP_EDIT],
    )
    .await?;
    store.assign_role_to_subject("alice", role_id).await?;
    store
        .grant_subject_permission("alice", &PermissionName::new(permission_catalog::DCP_ACCESS)?)
        .await?;
    store.forget_permission(permission_catalog::DCP_EDIT).await;
    let service = service_for(&store).await;

    let granted = service.granted_permissions("alice").await?;

    assert_eq!(granted, names(&[permission_catalog::DCP_ACCESS])?);
    Ok(())
}

fn query_name() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(permission_catalog::all().to_vec()).prop_map(str::to_owned),
        "[a-z]{3,10}_[a-z]{3,8}",
    ]
}

proptest! {
    #[test]
    fn authorization_never_allows_beyond_live_membership(
        granted in proptest::sample::subsequence(
            permission_catalog::all().to_vec(),
            0..=permission_catalog::all().len(),
        ),
        queried in query_name(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| TestCaseError::fail(error.to_string()))?;

        let allowed = runtime
            .block_on(async {
                let store = Arc::new(FakeSecurityStore::with_catalog().await?);
                let role_id = admin_role(&store, &granted).await?;
                store.assign_role_to_subject("alice", role_id).await?;
                let service = service_for(&store).await;
                Ok::<_, AppError>(service.is_authorized("alice", &queried).await)
            })
            .map_err(|error| TestCaseError::fail(error.to_string()))?;

        prop_assert_eq!(allowed, granted.contains(&queried.as_str()));
    }
}
