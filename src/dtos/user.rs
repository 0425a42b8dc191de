use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::{Role, User};

#[derive(Deserialize)]
pub struct UpsertUserRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct SearchUsersQuery {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Serialize)]
pub struct RoleResponse {
    pub role: Role,
}
