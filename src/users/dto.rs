use serde::{Deserialize, Serialize};

use crate::users::repo_types::{UserPatch, UserView};

/// Request body for user creation. All fields are required.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
        }
    }
}

/// `?page=&pageSize=`, both required.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub total_records: i64,
    pub total_pages: i64,
    pub users: Vec<UserView>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedUserResponse {
    pub message: &'static str,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
