//! User accounts and password authentication.
//!
//! Login failures are reported with a single generic outcome so callers
//! cannot tell unknown emails apart from wrong passwords.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use schooldesk_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use schooldesk_domain::{AuditAction, EmailAddress, UserId, permission_catalog, validate_password};

use crate::{AuditEvent, AuditRepository, AuthorizationService};

/// User record returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Canonical email address.
    pub email: String,
    /// Name shown in the admin console.
    pub display_name: String,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Builds the session identity for this user.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(
            self.id.to_string(),
            self.display_name.clone(),
            Some(self.email.clone()),
        )
    }
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by canonical email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Finds a user by id.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Creates a user; emails are unique.
    async fn create(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
    ) -> AppResult<UserRecord>;

    /// Lists all users ordered by email.
    async fn list_users(&self) -> AppResult<Vec<UserRecord>>;
}

/// Port for password hashing operations. Keeps domain/application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password using Argon2id.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Authentication succeeded. Session can be established.
    Authenticated(UserIdentity),
    /// Authentication failed.
    Failed,
}

/// Parameters for creating a user account.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Email address for the new account.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Plaintext password.
    pub password: String,
}

/// Application service for user authentication and account management.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    authorization_service: AuthorizationService,
    audit_repository: Arc<dyn AuditRepository>,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        authorization_service: AuthorizationService,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            authorization_service,
            audit_repository,
        }
    }

    /// Authenticates a user with email and password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthOutcome> {
        let Ok(email) = EmailAddress::new(email) else {
            return Ok(AuthOutcome::Failed);
        };

        let Some(user) = self.user_repository.find_by_email(email.as_str()).await? else {
            // Hash anyway so unknown emails cost the same as wrong passwords.
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            return Ok(AuthOutcome::Failed);
        }

        Ok(AuthOutcome::Authenticated(user.identity()))
    }

    /// Creates a user account on behalf of an administrator.
    pub async fn create_user(
        &self,
        actor: &UserIdentity,
        input: CreateUserInput,
    ) -> AppResult<UserRecord> {
        self.authorization_service
            .require_permission(actor, permission_catalog::USER_CREATE)
            .await?;

        let user = self.insert_user(input).await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::UserCreated,
                resource_type: "user".to_owned(),
                resource_id: user.id.to_string(),
                detail: Some(format!("created user '{}'", user.email)),
            })
            .await?;

        Ok(user)
    }

    /// Lists user accounts.
    pub async fn list_users(&self, actor: &UserIdentity) -> AppResult<Vec<UserRecord>> {
        self.authorization_service
            .require_permission(actor, permission_catalog::USER_ACCESS)
            .await?;
        self.user_repository.list_users().await
    }

    /// Returns the user with the given email, creating it when missing.
    ///
    /// Used by installation seeding, which runs before any actor exists.
    pub async fn ensure_user(&self, input: CreateUserInput) -> AppResult<UserRecord> {
        let email = EmailAddress::new(&input.email)?;
        if let Some(existing) = self.user_repository.find_by_email(email.as_str()).await? {
            return Ok(existing);
        }

        let user = self.insert_user(input).await?;
        info!(user_id = %user.id, email = %user.email, "seeded user account");
        Ok(user)
    }

    async fn insert_user(&self, input: CreateUserInput) -> AppResult<UserRecord> {
        let email = EmailAddress::new(&input.email)?;
        let display_name = NonEmptyString::new(input.display_name)?;
        validate_password(&input.password)?;

        if self
            .user_repository
            .find_by_email(email.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "a user with email '{}' already exists",
                email.as_str()
            )));
        }

        let password_hash = self.password_hasher.hash_password(&input.password)?;
        self.user_repository
            .create(email.as_str(), display_name.as_str(), &password_hash)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use schooldesk_core::{AppError, AppResult};
    use schooldesk_domain::permission_catalog;

    use crate::test_support::{FakePasswordHasher, FakeUserRepository, Harness, actor};

    use super::{AuthOutcome, CreateUserInput, UserService};

    fn service(harness: &Harness, users: Arc<FakeUserRepository>) -> UserService {
        UserService::new(
            users,
            Arc::new(FakePasswordHasher),
            harness.authorization.clone(),
            harness.audit.clone(),
        )
    }

    fn input(email: &str) -> CreateUserInput {
        CreateUserInput {
            email: email.to_owned(),
            display_name: "Records Officer".to_owned(),
            password: "quiet-harbor-lantern".to_owned(),
        }
    }

    #[tokio::test]
    async fn created_user_can_log_in() -> AppResult<()> {
        let harness = Harness::with_grants("admin", &[permission_catalog::USER_CREATE]).await?;
        let service = service(&harness, Arc::new(FakeUserRepository::default()));

        let user = service
            .create_user(&actor("admin"), input("Officer@Division.example"))
            .await?;
        assert_eq!(user.email, "officer@division.example");

        let outcome = service
            .login("officer@division.example", "quiet-harbor-lantern")
            .await?;
        assert!(matches!(
            outcome,
            AuthOutcome::Authenticated(identity) if identity.subject() == user.id.to_string()
        ));
        assert_eq!(harness.audit.events().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_alike() -> AppResult<()> {
        let harness = Harness::with_grants("admin", &[]).await?;
        let service = service(&harness, Arc::new(FakeUserRepository::default()));
        service.ensure_user(input("officer@division.example")).await?;

        assert_eq!(
            service
                .login("officer@division.example", "not-the-password")
                .await?,
            AuthOutcome::Failed
        );
        assert_eq!(
            service
                .login("nobody@division.example", "quiet-harbor-lantern")
                .await?,
            AuthOutcome::Failed
        );
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() -> AppResult<()> {
        let harness = Harness::with_grants("admin", &[permission_catalog::USER_CREATE]).await?;
        let service = service(&harness, Arc::new(FakeUserRepository::default()));
        service.ensure_user(input("officer@division.example")).await?;

        let result = service
            .create_user(&actor("admin"), input("officer@division.example"))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() -> AppResult<()> {
        let harness = Harness::with_grants("admin", &[]).await?;
        let users = Arc::new(FakeUserRepository::default());
        let service = service(&harness, users.clone());

        let first = service.ensure_user(input("officer@division.example")).await?;
        let second = service.ensure_user(input("officer@division.example")).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(users.count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn listing_users_requires_user_access() -> AppResult<()> {
        let harness = Harness::with_grants("clerk", &[]).await?;
        let service = service(&harness, Arc::new(FakeUserRepository::default()));

        let result = service.list_users(&actor("clerk")).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        Ok(())
    }
}
