use std::collections::BTreeSet;

use schooldesk_domain::Permission;

/// Set of permission names that have an authorization check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PermissionRegistry {
    names: BTreeSet<String>,
}

impl PermissionRegistry {
    /// Registers one check per permission record; later duplicates are no-ops.
    #[must_use]
    pub(crate) fn from_permissions(permissions: &[Permission]) -> Self {
        Self {
            names: permissions
                .iter()
                .map(|permission| permission.name().as_str().to_owned())
                .collect(),
        }
    }

    /// Returns whether a check is registered for the name.
    #[must_use]
    pub(crate) fn contains(&self, permission: &str) -> bool {
        self.names.contains(permission)
    }

    /// Returns the number of registered names.
    #[must_use]
    pub(crate) fn registered_count(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use schooldesk_core::AppResult;
    use schooldesk_domain::{Permission, PermissionName};
    use uuid::Uuid;

    use super::PermissionRegistry;

    #[test]
    fn duplicate_records_register_one_check() -> AppResult<()> {
        let permission = |name: &str| -> AppResult<Permission> {
            Ok(Permission::new(Uuid::new_v4(), PermissionName::new(name)?, Utc::now()))
        };
        let registry = PermissionRegistry::from_permissions(&[
            permission("opcr_access")?,
            permission("opcr_access")?,
            permission("dcp_access")?,
        ]);

        assert_eq!(registry.registered_count(), 2);
        assert!(registry.contains("dcp_access"));
        assert!(!registry.contains("role_access"));
        Ok(())
    }
}
