use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schooldesk_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::change::{Topic, TrackableEntity};
use crate::lifecycle::RecordTimestamps;

/// Maximum accepted length of a permission name.
const PERMISSION_NAME_MAX_LENGTH: usize = 120;

/// Globally unique permission name used as an authorization-check key.
///
/// Names are lowercase ASCII, start with a letter and may contain digits,
/// `_` and `.` (for example `role_edit` or `dcp.recipient.edit`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName(String);

impl PermissionName {
    /// Creates a validated permission name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "permission name must not be empty".to_owned(),
            ));
        }

        if trimmed.len() > PERMISSION_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "permission name must not exceed {PERMISSION_NAME_MAX_LENGTH} characters"
            )));
        }

        if !trimmed.starts_with(|character: char| character.is_ascii_lowercase()) {
            return Err(AppError::Validation(format!(
                "permission name '{trimmed}' must start with a lowercase letter"
            )));
        }

        if let Some(invalid) = trimmed.chars().find(|character| {
            !(character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || *character == '_'
                || *character == '.')
        }) {
            return Err(AppError::Validation(format!(
                "permission name '{trimmed}' contains invalid character '{invalid}'"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for PermissionName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.0
    }
}

impl std::fmt::Display for PermissionName {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Administrator-managed permission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: Uuid,
    name: PermissionName,
    created_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a permission record.
    #[must_use]
    pub fn new(id: Uuid, name: PermissionName, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            created_at,
        }
    }

    /// Returns the stable permission identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the unique permission name.
    #[must_use]
    pub fn name(&self) -> &PermissionName {
        &self.name
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Named bundle of permissions assignable to actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: Uuid,
    name: NonEmptyString,
    permissions: Vec<PermissionName>,
    #[serde(flatten)]
    timestamps: RecordTimestamps,
}

impl Role {
    /// Creates a role; duplicate grants are collapsed and sorted.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = PermissionName>,
        timestamps: RecordTimestamps,
    ) -> AppResult<Self> {
        let permissions = permissions
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            permissions,
            timestamps,
        })
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the unique role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns granted permission names in sorted order.
    #[must_use]
    pub fn permissions(&self) -> &[PermissionName] {
        &self.permissions
    }

    /// Returns whether the role grants a permission.
    #[must_use]
    pub fn grants(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|value| value.as_str() == permission)
    }

    /// Returns persistence timestamps.
    #[must_use]
    pub fn timestamps(&self) -> &RecordTimestamps {
        &self.timestamps
    }
}

impl TrackableEntity for Role {
    const TOPIC: Topic = Topic::Roles;

    fn entity_id(&self) -> Uuid {
        self.id
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a permission record is created.
    PermissionCreated,
    /// Emitted when a permission record is deleted.
    PermissionDeleted,
    /// Emitted when the permission registry is rebuilt on request.
    PermissionRegistryReloaded,
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role's name or grants change.
    RoleUpdated,
    /// Emitted when a role is soft-deleted.
    RoleDeleted,
    /// Emitted when a role is assigned to a subject.
    RoleAssigned,
    /// Emitted when a role is removed from a subject.
    RoleUnassigned,
    /// Emitted when a permission is granted directly to a subject.
    SubjectPermissionGranted,
    /// Emitted when a direct subject permission is revoked.
    SubjectPermissionRevoked,
    /// Emitted when a user account is created.
    UserCreated,
    /// Emitted when an OPCR record is created.
    OpcrCreated,
    /// Emitted when an OPCR record is updated.
    OpcrUpdated,
    /// Emitted when an OPCR record is soft-deleted.
    OpcrDeleted,
    /// Emitted when a DCP batch is created.
    DcpCreated,
    /// Emitted when a DCP batch is updated.
    DcpUpdated,
    /// Emitted when a DCP batch is soft-deleted.
    DcpDeleted,
    /// Emitted when a DCP recipient allocation is created.
    DcpRecipientCreated,
    /// Emitted when a DCP recipient allocation is updated.
    DcpRecipientUpdated,
    /// Emitted when a DCP recipient allocation is soft-deleted.
    DcpRecipientDeleted,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionCreated => "security.permission.created",
            Self::PermissionDeleted => "security.permission.deleted",
            Self::PermissionRegistryReloaded => "security.permission.registry_reloaded",
            Self::RoleCreated => "security.role.created",
            Self::RoleUpdated => "security.role.updated",
            Self::RoleDeleted => "security.role.deleted",
            Self::RoleAssigned => "security.role.assigned",
            Self::RoleUnassigned => "security.role.unassigned",
            Self::SubjectPermissionGranted => "security.subject_permission.granted",
            Self::SubjectPermissionRevoked => "security.subject_permission.revoked",
            Self::UserCreated => "security.user.created",
            Self::OpcrCreated => "opcr.created",
            Self::OpcrUpdated => "opcr.updated",
            Self::OpcrDeleted => "opcr.deleted",
            Self::DcpCreated => "dcp.created",
            Self::DcpUpdated => "dcp.updated",
            Self::DcpDeleted => "dcp.deleted",
            Self::DcpRecipientCreated => "dcp_recipient.created",
            Self::DcpRecipientUpdated => "dcp_recipient.updated",
            Self::DcpRecipientDeleted => "dcp_recipient.deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;
    use uuid::Uuid;

    use super::{PermissionName, Role};
    use crate::lifecycle::RecordTimestamps;

    #[test]
    fn permission_name_accepts_catalog_style_values() {
        assert!(PermissionName::new("user_access").is_ok());
        assert!(PermissionName::new("dcp.recipient.edit").is_ok());
    }

    #[test]
    fn permission_name_rejects_uppercase_and_spaces() {
        assert!(PermissionName::new("User_Access").is_err());
        assert!(PermissionName::new("user access").is_err());
        assert!(PermissionName::new("1user").is_err());
    }

    #[test]
    fn permission_name_deserialization_validates() {
        let parsed = serde_json::from_str::<PermissionName>("\"Not Valid\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn role_collapses_duplicate_grants() -> schooldesk_core::AppResult<()> {
        let role = Role::new(
            Uuid::new_v4(),
            "Admin",
            [
                PermissionName::new("role_edit")?,
                PermissionName::new("role_access")?,
                PermissionName::new("role_edit")?,
            ],
            RecordTimestamps::created(Utc::now()),
        )?;

        assert_eq!(role.permissions().len(), 2);
        assert_eq!(role.permissions()[0].as_str(), "role_access");
        assert!(role.grants("role_edit"));
        assert!(!role.grants("user_access"));
        Ok(())
    }

    proptest! {
        #[test]
        fn valid_names_roundtrip_through_storage(value in "[a-z][a-z0-9_.]{0,60}") {
            let name = PermissionName::new(value.clone());
            prop_assert!(name.is_ok());
            let name = name.unwrap_or_else(|_| unreachable!());
            prop_assert_eq!(name.as_str(), value.as_str());
        }

        #[test]
        fn names_with_foreign_characters_are_rejected(
            prefix in "[a-z]{1,8}",
            invalid in "[A-Z/:-]",
            suffix in "[a-z]{0,8}",
        ) {
            let candidate = format!("{prefix}{invalid}{suffix}");
            prop_assert!(PermissionName::new(candidate).is_err());
        }
    }
}
