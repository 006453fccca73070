use crate::config::{AppConfig, TimeoutConfig};
use crate::db;
use crate::users::{
    memory::InMemoryUserRepository,
    repo::{PgUserRepository, UserRepository},
    services::{UserService, UserServiceImpl},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserService>,
    pub timeouts: TimeoutConfig,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.db).await?;
        let repo = Arc::new(PgUserRepository::new(pool)) as Arc<dyn UserRepository>;
        let users = Arc::new(UserServiceImpl::new(repo, config.timeouts.service_call))
            as Arc<dyn UserService>;
        Ok(Self::from_parts(users, config.timeouts))
    }

    pub fn from_parts(users: Arc<dyn UserService>, timeouts: TimeoutConfig) -> Self {
        Self { users, timeouts }
    }

    /// State backed by [`InMemoryUserRepository`], no database needed.
    pub fn in_memory() -> Self {
        let timeouts = TimeoutConfig::default();
        let repo = Arc::new(InMemoryUserRepository::new()) as Arc<dyn UserRepository>;
        let users = Arc::new(UserServiceImpl::new(repo, timeouts.service_call))
            as Arc<dyn UserService>;
        Self::from_parts(users, timeouts)
    }
}
