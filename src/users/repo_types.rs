use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,     // assigned by the store on insert
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // Argon2 hash, not exposed in JSON
}

/// Insert payload. Carries no id; the store assigns it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Public projection of a user, without the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

/// Fields an update may change. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// One page of users plus the totals it was cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedResult {
    pub items: Vec<UserView>,
    pub total_records: i64,
    pub total_pages: i64,
}
