//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod authorization_service;
mod change_notifier;
mod change_ports;
mod dcp_service;
mod live_collection;
mod opcr_service;
mod record_ports;
mod security_admin_ports;
mod security_admin_service;
mod user_service;

#[cfg(test)]
mod test_support;

pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_service::{AuthorizationRepository, AuthorizationService, PermissionRepository};
pub use change_notifier::{ChangeNotifier, NotifyOutcome};
pub use change_ports::{ChangeFeed, ChangePublisher, ChangeSubscription};
pub use dcp_service::DcpService;
pub use live_collection::{LiveCollection, MergeOutcome};
pub use opcr_service::OpcrService;
pub use record_ports::{
    DcpBatchInput, DcpRecipientInput, DcpRepository, OpcrInput, OpcrRepository,
};
pub use security_admin_ports::{RoleAssignment, RoleInput, RoleRepository};
pub use security_admin_service::SecurityAdminService;
pub use user_service::{
    AuthOutcome, CreateUserInput, PasswordHasher, UserRecord, UserRepository, UserService,
};
