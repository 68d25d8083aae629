use schooldesk_application::{CreateUserInput, UserRecord};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for administrator-created accounts.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-user-request.ts"
)]
pub struct CreateUserRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

/// API representation of a user account.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-response.ts"
)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: String,
}

impl From<CreateUserRequest> for CreateUserInput {
    fn from(value: CreateUserRequest) -> Self {
        Self {
            email: value.email,
            display_name: value.display_name,
            password: value.password,
        }
    }
}

impl From<UserRecord> for UserResponse {
    fn from(value: UserRecord) -> Self {
        Self {
            user_id: value.id.to_string(),
            email: value.email,
            display_name: value.display_name,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}
