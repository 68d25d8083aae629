//! In-memory fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use schooldesk_core::{AppError, AppResult, UserIdentity};
use schooldesk_domain::{
    ChangeNotification, DcpBatch, DcpRecipient, Opcr, Permission, PermissionName,
    RecordTimestamps, Role, Topic, UserId, permission_catalog,
};

use crate::{
    AuditEvent, AuditRepository, AuthorizationRepository, AuthorizationService, ChangeFeed,
    ChangeNotifier, ChangePublisher, ChangeSubscription, DcpBatchInput, DcpRecipientInput,
    DcpRepository, OpcrInput, OpcrRepository, PasswordHasher, PermissionRepository,
    RoleAssignment, RoleInput, RoleRepository, UserRecord, UserRepository,
};

pub(crate) fn actor(subject: &str) -> UserIdentity {
    UserIdentity::new(subject, subject, None)
}

fn updated(timestamps: &RecordTimestamps) -> AppResult<RecordTimestamps> {
    RecordTimestamps::restore(timestamps.created_at(), Utc::now(), None)
}

fn deleted(timestamps: &RecordTimestamps) -> AppResult<RecordTimestamps> {
    let now = Utc::now();
    RecordTimestamps::restore(timestamps.created_at(), now, Some(now))
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

impl FakeAuditRepository {
    pub(crate) async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Publisher that records every notification and fans it out locally.
pub(crate) struct RecordingPublisher {
    published: Mutex<Vec<ChangeNotification>>,
    senders: HashMap<Topic, broadcast::Sender<ChangeNotification>>,
    reported_subscribers: Option<usize>,
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            senders: Topic::all()
                .iter()
                .map(|topic| (*topic, broadcast::channel(16).0))
                .collect(),
            reported_subscribers: None,
        }
    }
}

impl RecordingPublisher {
    pub(crate) fn with_subscribers(subscribers: usize) -> Self {
        Self {
            reported_subscribers: Some(subscribers),
            ..Self::default()
        }
    }

    pub(crate) async fn published(&self) -> Vec<ChangeNotification> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl ChangePublisher for RecordingPublisher {
    async fn publish(&self, notification: &ChangeNotification) -> AppResult<usize> {
        self.published.lock().await.push(notification.clone());
        let reached = self
            .senders
            .get(&notification.topic())
            .and_then(|sender| sender.send(notification.clone()).ok())
            .unwrap_or(0);
        Ok(self.reported_subscribers.unwrap_or(reached))
    }
}

impl ChangeFeed for RecordingPublisher {
    fn subscribe(&self, topic: Topic) -> ChangeSubscription {
        let receiver = match self.senders.get(&topic) {
            Some(sender) => sender.subscribe(),
            None => broadcast::channel(1).1,
        };
        ChangeSubscription::new(topic, receiver)
    }
}

pub(crate) struct FailingPublisher;

#[async_trait]
impl ChangePublisher for FailingPublisher {
    async fn publish(&self, _notification: &ChangeNotification) -> AppResult<usize> {
        Err(AppError::Internal("change transport is down".to_owned()))
    }
}

pub(crate) struct StalledPublisher;

#[async_trait]
impl ChangePublisher for StalledPublisher {
    async fn publish(&self, _notification: &ChangeNotification) -> AppResult<usize> {
        std::future::pending::<()>().await;
        Ok(0)
    }
}

#[derive(Default)]
struct SecurityState {
    permissions: Vec<Permission>,
    roles: Vec<Role>,
    members: Vec<(String, Uuid)>,
    direct_grants: Vec<(String, PermissionName)>,
    unavailable: bool,
}

impl SecurityState {
    fn ensure_available(&self) -> AppResult<()> {
        if self.unavailable {
            return Err(AppError::Internal("security store is unavailable".to_owned()));
        }
        Ok(())
    }

    fn live_role_index(&self, role_id: Uuid) -> AppResult<usize> {
        self.roles
            .iter()
            .position(|role| role.id() == role_id && !role.timestamps().is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    fn ensure_known(&self, permissions: &[PermissionName]) -> AppResult<()> {
        for name in permissions {
            if !self
                .permissions
                .iter()
                .any(|permission| permission.name() == name)
            {
                return Err(AppError::Validation(format!(
                    "permission '{name}' does not exist"
                )));
            }
        }
        Ok(())
    }

    fn ensure_unique_name(&self, name: &str, except: Option<Uuid>) -> AppResult<()> {
        let taken = self.roles.iter().any(|role| {
            !role.timestamps().is_deleted()
                && role.name().as_str() == name.trim()
                && Some(role.id()) != except
        });
        if taken {
            return Err(AppError::Conflict(format!("role '{}' already exists", name.trim())));
        }
        Ok(())
    }

    fn effective(&self, subject: &str) -> Vec<PermissionName> {
        let from_roles = self
            .members
            .iter()
            .filter(|(member, _)| member == subject)
            .filter_map(|(_, role_id)| {
                self.roles
                    .iter()
                    .find(|role| role.id() == *role_id && !role.timestamps().is_deleted())
            })
            .flat_map(|role| role.permissions().iter().cloned());
        let direct = self
            .direct_grants
            .iter()
            .filter(|(member, _)| member == subject)
            .map(|(_, permission)| permission.clone());

        from_roles.chain(direct).collect()
    }
}

/// Permission, role and grant store backed by one shared state.
#[derive(Default)]
pub(crate) struct FakeSecurityStore {
    state: Mutex<SecurityState>,
}

impl FakeSecurityStore {
    pub(crate) async fn with_catalog() -> AppResult<Self> {
        let store = Self::default();
        for name in permission_catalog::all() {
            store.create_permission(&PermissionName::new(*name)?).await?;
        }
        Ok(store)
    }

    pub(crate) async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Removes the permission record but leaves existing grants in place.
    pub(crate) async fn forget_permission(&self, name: &str) {
        self.state
            .lock()
            .await
            .permissions
            .retain(|permission| permission.name().as_str() != name);
    }
}

#[async_trait]
impl PermissionRepository for FakeSecurityStore {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let state = self.state.lock().await;
        state.ensure_available()?;
        Ok(state.permissions.clone())
    }

    async fn create_permission(&self, name: &PermissionName) -> AppResult<Permission> {
        let mut state = self.state.lock().await;
        state.ensure_available()?;
        if state
            .permissions
            .iter()
            .any(|permission| permission.name() == name)
        {
            return Err(AppError::Conflict(format!("permission '{name}' already exists")));
        }

        let permission = Permission::new(Uuid::new_v4(), name.clone(), Utc::now());
        state.permissions.push(permission.clone());
        Ok(permission)
    }

    async fn delete_permission(&self, permission_id: Uuid) -> AppResult<Permission> {
        let mut state = self.state.lock().await;
        let index = state
            .permissions
            .iter()
            .position(|permission| permission.id() == permission_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("permission '{permission_id}' does not exist"))
            })?;
        let permission = state.permissions.remove(index);

        state
            .direct_grants
            .retain(|(_, name)| name != permission.name());
        for role in &mut state.roles {
            let remaining: Vec<PermissionName> = role
                .permissions()
                .iter()
                .filter(|name| *name != permission.name())
                .cloned()
                .collect();
            *role = Role::new(role.id(), role.name().as_str(), remaining, *role.timestamps())?;
        }

        Ok(permission)
    }
}

#[async_trait]
impl AuthorizationRepository for FakeSecurityStore {
    async fn subject_has_permission(&self, subject: &str, permission: &str) -> AppResult<bool> {
        let state = self.state.lock().await;
        state.ensure_available()?;
        Ok(state
            .effective(subject)
            .iter()
            .any(|name| name.as_str() == permission))
    }

    async fn list_permissions_for_subject(&self, subject: &str) -> AppResult<Vec<PermissionName>> {
        let state = self.state.lock().await;
        state.ensure_available()?;
        Ok(state.effective(subject))
    }
}

#[async_trait]
impl RoleRepository for FakeSecurityStore {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .iter()
            .filter(|role| !role.timestamps().is_deleted())
            .cloned()
            .collect())
    }

    async fn find_role(&self, role_id: Uuid) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .iter()
            .find(|role| role.id() == role_id && !role.timestamps().is_deleted())
            .cloned())
    }

    async fn create_role(&self, input: RoleInput) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        state.ensure_known(&input.permissions)?;
        state.ensure_unique_name(&input.name, None)?;

        let role = Role::new(
            Uuid::new_v4(),
            input.name,
            input.permissions,
            RecordTimestamps::created(Utc::now()),
        )?;
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn update_role(&self, role_id: Uuid, input: RoleInput) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        let index = state.live_role_index(role_id)?;
        state.ensure_known(&input.permissions)?;
        state.ensure_unique_name(&input.name, Some(role_id))?;

        let timestamps = updated(state.roles[index].timestamps())?;
        let role = Role::new(role_id, input.name, input.permissions, timestamps)?;
        state.roles[index] = role.clone();
        Ok(role)
    }

    async fn soft_delete_role(&self, role_id: Uuid) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        let index = state.live_role_index(role_id)?;
        let current = state.roles[index].clone();

        let role = Role::new(
            role_id,
            current.name().as_str(),
            current.permissions().to_vec(),
            deleted(current.timestamps())?,
        )?;
        state.roles[index] = role.clone();
        Ok(role)
    }

    async fn assign_role_to_subject(&self, subject: &str, role_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.live_role_index(role_id)?;
        let assignment = (subject.to_owned(), role_id);
        if !state.members.contains(&assignment) {
            state.members.push(assignment);
        }
        Ok(())
    }

    async fn remove_role_from_subject(&self, subject: &str, role_id: Uuid) -> AppResult<()> {
        self.state
            .lock()
            .await
            .members
            .retain(|(member, assigned)| !(member == subject && *assigned == role_id));
        Ok(())
    }

    async fn list_role_assignments(&self) -> AppResult<Vec<RoleAssignment>> {
        let state = self.state.lock().await;
        Ok(state
            .members
            .iter()
            .filter_map(|(subject, role_id)| {
                state
                    .roles
                    .iter()
                    .find(|role| role.id() == *role_id && !role.timestamps().is_deleted())
                    .map(|role| RoleAssignment {
                        subject: subject.clone(),
                        role_id: role.id(),
                        role_name: role.name().to_string(),
                        assigned_at: role.timestamps().created_at(),
                    })
            })
            .collect())
    }

    async fn grant_subject_permission(
        &self,
        subject: &str,
        permission: &PermissionName,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_known(std::slice::from_ref(permission))?;
        let grant = (subject.to_owned(), permission.clone());
        if !state.direct_grants.contains(&grant) {
            state.direct_grants.push(grant);
        }
        Ok(())
    }

    async fn revoke_subject_permission(
        &self,
        subject: &str,
        permission: &PermissionName,
    ) -> AppResult<()> {
        self.state
            .lock()
            .await
            .direct_grants
            .retain(|(member, name)| !(member == subject && name == permission));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeRecordStore {
    opcrs: Mutex<Vec<Opcr>>,
    batches: Mutex<Vec<DcpBatch>>,
    recipients: Mutex<Vec<DcpRecipient>>,
}

fn opcr_from_input(id: Uuid, input: OpcrInput, timestamps: RecordTimestamps) -> AppResult<Opcr> {
    Opcr::new(
        id,
        input.title,
        input.office,
        input.rating_period,
        input.status,
        input.remarks,
        timestamps,
    )
}

#[async_trait]
impl OpcrRepository for FakeRecordStore {
    async fn list_opcrs(&self) -> AppResult<Vec<Opcr>> {
        Ok(self
            .opcrs
            .lock()
            .await
            .iter()
            .filter(|opcr| !opcr.timestamps().is_deleted())
            .cloned()
            .collect())
    }

    async fn find_opcr(&self, opcr_id: Uuid) -> AppResult<Option<Opcr>> {
        Ok(self
            .opcrs
            .lock()
            .await
            .iter()
            .find(|opcr| opcr.id() == opcr_id && !opcr.timestamps().is_deleted())
            .cloned())
    }

    async fn create_opcr(&self, input: OpcrInput) -> AppResult<Opcr> {
        let opcr = opcr_from_input(
            Uuid::new_v4(),
            input,
            RecordTimestamps::created(Utc::now()),
        )?;
        self.opcrs.lock().await.push(opcr.clone());
        Ok(opcr)
    }

    async fn update_opcr(&self, opcr_id: Uuid, input: OpcrInput) -> AppResult<Opcr> {
        let mut opcrs = self.opcrs.lock().await;
        let slot = opcrs
            .iter_mut()
            .find(|opcr| opcr.id() == opcr_id && !opcr.timestamps().is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("opcr '{opcr_id}' does not exist")))?;
        *slot = opcr_from_input(opcr_id, input, updated(slot.timestamps())?)?;
        Ok(slot.clone())
    }

    async fn soft_delete_opcr(&self, opcr_id: Uuid) -> AppResult<Opcr> {
        let mut opcrs = self.opcrs.lock().await;
        let slot = opcrs
            .iter_mut()
            .find(|opcr| opcr.id() == opcr_id && !opcr.timestamps().is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("opcr '{opcr_id}' does not exist")))?;
        *slot = Opcr::new(
            opcr_id,
            slot.title().as_str(),
            slot.office().as_str(),
            slot.rating_period().as_str(),
            slot.status(),
            slot.remarks().map(str::to_owned),
            deleted(slot.timestamps())?,
        )?;
        Ok(slot.clone())
    }
}

fn batch_from_input(
    id: Uuid,
    input: DcpBatchInput,
    timestamps: RecordTimestamps,
) -> AppResult<DcpBatch> {
    DcpBatch::new(
        id,
        input.batch_name,
        input.school_name,
        input.delivery_date,
        input.status,
        input.remarks,
        timestamps,
    )
}

fn recipient_from_input(
    id: Uuid,
    batch_id: Uuid,
    input: DcpRecipientInput,
    timestamps: RecordTimestamps,
) -> AppResult<DcpRecipient> {
    DcpRecipient::new(
        id,
        batch_id,
        input.recipient_name,
        input.quantity,
        input.condition,
        input.remarks,
        timestamps,
    )
}

#[async_trait]
impl DcpRepository for FakeRecordStore {
    async fn list_batches(&self) -> AppResult<Vec<DcpBatch>> {
        Ok(self
            .batches
            .lock()
            .await
            .iter()
            .filter(|batch| !batch.timestamps().is_deleted())
            .cloned()
            .collect())
    }

    async fn find_batch(&self, batch_id: Uuid) -> AppResult<Option<DcpBatch>> {
        Ok(self
            .batches
            .lock()
            .await
            .iter()
            .find(|batch| batch.id() == batch_id && !batch.timestamps().is_deleted())
            .cloned())
    }

    async fn create_batch(&self, input: DcpBatchInput) -> AppResult<DcpBatch> {
        let batch = batch_from_input(
            Uuid::new_v4(),
            input,
            RecordTimestamps::created(Utc::now()),
        )?;
        self.batches.lock().await.push(batch.clone());
        Ok(batch)
    }

    async fn update_batch(&self, batch_id: Uuid, input: DcpBatchInput) -> AppResult<DcpBatch> {
        let mut batches = self.batches.lock().await;
        let slot = batches
            .iter_mut()
            .find(|batch| batch.id() == batch_id && !batch.timestamps().is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("dcp batch '{batch_id}' does not exist")))?;
        *slot = batch_from_input(batch_id, input, updated(slot.timestamps())?)?;
        Ok(slot.clone())
    }

    async fn soft_delete_batch(&self, batch_id: Uuid) -> AppResult<DcpBatch> {
        let mut batches = self.batches.lock().await;
        let slot = batches
            .iter_mut()
            .find(|batch| batch.id() == batch_id && !batch.timestamps().is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("dcp batch '{batch_id}' does not exist")))?;
        *slot = DcpBatch::new(
            batch_id,
            slot.batch_name().as_str(),
            slot.school_name().as_str(),
            slot.delivery_date(),
            slot.status(),
            slot.remarks().map(str::to_owned),
            deleted(slot.timestamps())?,
        )?;
        Ok(slot.clone())
    }

    async fn list_recipients(&self, batch_id: Uuid) -> AppResult<Vec<DcpRecipient>> {
        Ok(self
            .recipients
            .lock()
            .await
            .iter()
            .filter(|recipient| {
                recipient.dcp_batch_id() == batch_id && !recipient.timestamps().is_deleted()
            })
            .cloned()
            .collect())
    }

    async fn create_recipient(
        &self,
        batch_id: Uuid,
        input: DcpRecipientInput,
    ) -> AppResult<DcpRecipient> {
        if self.find_batch(batch_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "dcp batch '{batch_id}' does not exist"
            )));
        }

        let recipient = recipient_from_input(
            Uuid::new_v4(),
            batch_id,
            input,
            RecordTimestamps::created(Utc::now()),
        )?;
        self.recipients.lock().await.push(recipient.clone());
        Ok(recipient)
    }

    async fn update_recipient(
        &self,
        recipient_id: Uuid,
        input: DcpRecipientInput,
    ) -> AppResult<DcpRecipient> {
        let mut recipients = self.recipients.lock().await;
        let slot = recipients
            .iter_mut()
            .find(|recipient| {
                recipient.id() == recipient_id && !recipient.timestamps().is_deleted()
            })
            .ok_or_else(|| {
                AppError::NotFound(format!("dcp recipient '{recipient_id}' does not exist"))
            })?;
        *slot = recipient_from_input(
            recipient_id,
            slot.dcp_batch_id(),
            input,
            updated(slot.timestamps())?,
        )?;
        Ok(slot.clone())
    }

    async fn soft_delete_recipient(&self, recipient_id: Uuid) -> AppResult<DcpRecipient> {
        let mut recipients = self.recipients.lock().await;
        let slot = recipients
            .iter_mut()
            .find(|recipient| {
                recipient.id() == recipient_id && !recipient.timestamps().is_deleted()
            })
            .ok_or_else(|| {
                AppError::NotFound(format!("dcp recipient '{recipient_id}' does not exist"))
            })?;
        *slot = DcpRecipient::new(
            recipient_id,
            slot.dcp_batch_id(),
            slot.recipient_name().as_str(),
            slot.quantity(),
            slot.condition(),
            slot.remarks().map(str::to_owned),
            deleted(slot.timestamps())?,
        )?;
        Ok(slot.clone())
    }
}

#[derive(Default)]
pub(crate) struct FakeUserRepository {
    users: Mutex<Vec<UserRecord>>,
}

impl FakeUserRepository {
    pub(crate) async fn count(&self) -> usize {
        self.users.lock().await.len()
    }
}

#[async_trait]
impl UserRepository for FakeUserRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.id == user_id)
            .cloned())
    }

    async fn create(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
    ) -> AppResult<UserRecord> {
        let user = UserRecord {
            id: UserId::new(),
            email: email.to_owned(),
            display_name: display_name.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: Utc::now(),
        };
        self.users.lock().await.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<UserRecord>> {
        Ok(self.users.lock().await.clone())
    }
}

pub(crate) struct FakePasswordHasher;

impl PasswordHasher for FakePasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash.strip_prefix("hashed:") == Some(password))
    }
}

/// Wiring of fakes behind the real application services.
pub(crate) struct Harness {
    pub(crate) security: Arc<FakeSecurityStore>,
    pub(crate) records: Arc<FakeRecordStore>,
    pub(crate) audit: Arc<FakeAuditRepository>,
    pub(crate) publisher: Arc<RecordingPublisher>,
    pub(crate) notifier: ChangeNotifier,
    pub(crate) authorization: AuthorizationService,
}

impl Harness {
    /// Seeds the permission catalog, grants `permissions` directly to
    /// `subject` and bootstraps authorization.
    pub(crate) async fn with_grants(subject: &str, permissions: &[&str]) -> AppResult<Self> {
        let security = Arc::new(FakeSecurityStore::with_catalog().await?);
        for permission in permissions {
            security
                .grant_subject_permission(subject, &PermissionName::new(*permission)?)
                .await?;
        }

        let authorization = AuthorizationService::bootstrap(security.clone(), security.clone()).await;
        let publisher = Arc::new(RecordingPublisher::default());
        let notifier = ChangeNotifier::new(publisher.clone(), Duration::from_secs(1));

        Ok(Self {
            security,
            records: Arc::new(FakeRecordStore::default()),
            audit: Arc::new(FakeAuditRepository::default()),
            publisher,
            notifier,
            authorization,
        })
    }
}
