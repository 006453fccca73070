use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::users::{
    error::{UserError, UserResult},
    repo_types::{NewUser, PagedResult, User, UserPatch, UserView},
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Persistence operations for users. The only layer that touches storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert one row and return it with the store-assigned id.
    async fn create(&self, user: NewUser) -> UserResult<User>;

    /// Total number of rows.
    async fn count(&self) -> UserResult<i64>;

    /// One page of users. See [`PageRequest`] for normalisation rules.
    async fn list(&self, page: i64, page_size: i64) -> UserResult<PagedResult>;

    async fn get_by_id(&self, id: i64) -> UserResult<Option<UserView>>;

    /// Apply `patch` to the row and return the result. `NotFound` if no row has `id`.
    async fn update(&self, id: i64, patch: UserPatch) -> UserResult<UserView>;

    /// Hard delete. `NotFound` if no row has `id`.
    async fn delete(&self, id: i64) -> UserResult<()>;
}

/// Page-count pagination: 1-based page index plus page size.
///
/// `page <= 0` becomes 1 and `page_size <= 0` becomes [`DEFAULT_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: if page <= 0 { 1 } else { page },
            page_size: if page_size <= 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
        }
    }

    /// `ceil(total_records / page_size)`
    pub fn total_pages(&self, total_records: i64) -> i64 {
        if total_records <= 0 {
            return 0;
        }
        (total_records - 1) / self.page_size + 1
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// True when the requested page lies past the last one.
    pub fn is_beyond(&self, total_pages: i64) -> bool {
        self.page > total_pages
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> UserResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.db)
        .await?;
        debug!(user_id = user.id, "user row inserted");
        Ok(user)
    }

    async fn count(&self) -> UserResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }

    async fn list(&self, page: i64, page_size: i64) -> UserResult<PagedResult> {
        let req = PageRequest::new(page, page_size);
        let total_records = self.count().await?;
        let total_pages = req.total_pages(total_records);

        if req.is_beyond(total_pages) {
            return Ok(PagedResult {
                items: Vec::new(),
                total_records,
                total_pages,
            });
        }

        let items = sqlx::query_as::<_, UserView>(
            r#"
            SELECT id, name, email
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(req.page_size)
        .bind(req.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PagedResult {
            items,
            total_records,
            total_pages,
        })
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<UserView>> {
        let user = sqlx::query_as::<_, UserView>(
            r#"
            SELECT id, name, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: i64, patch: UserPatch) -> UserResult<UserView> {
        let user = sqlx::query_as::<_, UserView>(
            r#"
            UPDATE users
               SET name = COALESCE($1, name),
                   email = COALESCE($2, email)
             WHERE id = $3
            RETURNING id, name, email
            "#,
        )
        .bind(patch.name)
        .bind(patch.email)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        user.ok_or(UserError::NotFound)
    }

    async fn delete(&self, id: i64) -> UserResult<()> {
        let affected = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(UserError::NotFound);
        }
        debug!(user_id = id, "user row deleted");
        Ok(())
    }
}
