use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DbConfig;

/// Bounded pool; every store call borrows a connection for one query only.
pub async fn connect(cfg: &DbConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .idle_timeout(cfg.idle_timeout)
        .max_lifetime(cfg.max_lifetime)
        .acquire_timeout(cfg.acquire_timeout)
        .connect(&cfg.url)
        .await
        .context("connect to database")?;
    tracing::info!(max_connections = cfg.max_connections, "connected to database");
    Ok(db)
}
