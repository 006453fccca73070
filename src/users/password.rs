use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::users::error::{UserError, UserResult};

/// Salted one-way hash with Argon2 default parameters, in PHC string form.
pub fn hash_password(plain: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            UserError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// [`hash_password`] on the blocking pool, so the runtime keeps serving
/// other requests and an enclosing deadline can fire while the hash runs.
pub async fn hash_password_blocking(plain: String) -> UserResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| UserError::Hashing(format!("spawn_blocking join error: {}", e)))?
}
