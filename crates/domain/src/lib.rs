//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod change;
mod dcp;
mod lifecycle;
mod opcr;
pub mod permission_catalog;
mod security;
mod user;

pub use change::{ChangeNotification, Topic, TrackableEntity};
pub use dcp::{DcpBatch, DcpRecipient, EquipmentCondition};
pub use lifecycle::RecordTimestamps;
pub use opcr::{Opcr, OpcrStatus};
pub use security::{AuditAction, Permission, PermissionName, Role};
pub use user::{EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, UserId, validate_password};
