//! Permission names the application services check.
//!
//! The permission table is administrator-editable; this catalog only lists
//! the names the code asks for and seeds a fresh installation with them.

/// View user accounts.
pub const USER_ACCESS: &str = "user_access";
/// Create user accounts.
pub const USER_CREATE: &str = "user_create";
/// Change role assignments and direct grants of a user.
pub const USER_EDIT: &str = "user_edit";
/// View permission records.
pub const PERMISSION_ACCESS: &str = "permission_access";
/// Create permission records and reload the registry.
pub const PERMISSION_CREATE: &str = "permission_create";
/// Delete permission records.
pub const PERMISSION_DELETE: &str = "permission_delete";
/// View roles.
pub const ROLE_ACCESS: &str = "role_access";
/// Create roles.
pub const ROLE_CREATE: &str = "role_create";
/// Rename roles and change their grants.
pub const ROLE_EDIT: &str = "role_edit";
/// Soft-delete roles.
pub const ROLE_DELETE: &str = "role_delete";
/// View OPCR records.
pub const OPCR_ACCESS: &str = "opcr_access";
/// Create OPCR records.
pub const OPCR_CREATE: &str = "opcr_create";
/// Update OPCR records.
pub const OPCR_EDIT: &str = "opcr_edit";
/// Soft-delete OPCR records.
pub const OPCR_DELETE: &str = "opcr_delete";
/// View DCP batches and recipient allocations.
pub const DCP_ACCESS: &str = "dcp_access";
/// Create DCP batches.
pub const DCP_CREATE: &str = "dcp_create";
/// Update DCP batches and manage their recipient allocations.
pub const DCP_EDIT: &str = "dcp_edit";
/// Soft-delete DCP batches.
pub const DCP_DELETE: &str = "dcp_delete";

/// Returns every catalog name, used to seed new installations.
#[must_use]
pub fn all() -> &'static [&'static str] {
    const ALL: &[&str] = &[
        USER_ACCESS,
        USER_CREATE,
        USER_EDIT,
        PERMISSION_ACCESS,
        PERMISSION_CREATE,
        PERMISSION_DELETE,
        ROLE_ACCESS,
        ROLE_CREATE,
        ROLE_EDIT,
        ROLE_DELETE,
        OPCR_ACCESS,
        OPCR_CREATE,
        OPCR_EDIT,
        OPCR_DELETE,
        DCP_ACCESS,
        DCP_CREATE,
        DCP_EDIT,
        DCP_DELETE,
    ];

    ALL
}
