use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::users::{
    error::{UserError, UserResult},
    repo::{PageRequest, UserRepository},
    repo_types::{NewUser, PagedResult, User, UserPatch, UserView},
};

/// In-memory implementation of [`UserRepository`] for tests and local runs.
///
/// Ids are handed out from a counter starting at 1 and never reused.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<Rows>,
}

#[derive(Debug, Default)]
struct Rows {
    by_id: BTreeMap<i64, User>,
    last_id: i64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> UserResult<User> {
        let mut rows = self.inner.write().await;
        rows.last_id += 1;
        let user = User {
            id: rows.last_id,
            name: user.name,
            email: user.email,
            password: user.password,
        };
        rows.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn count(&self) -> UserResult<i64> {
        Ok(self.inner.read().await.by_id.len() as i64)
    }

    async fn list(&self, page: i64, page_size: i64) -> UserResult<PagedResult> {
        let req = PageRequest::new(page, page_size);
        let rows = self.inner.read().await;
        let total_records = rows.by_id.len() as i64;
        let total_pages = req.total_pages(total_records);

        let items = if req.is_beyond(total_pages) {
            Vec::new()
        } else {
            rows.by_id
                .values()
                .skip(req.offset() as usize)
                .take(req.page_size as usize)
                .cloned()
                .map(UserView::from)
                .collect()
        };

        Ok(PagedResult {
            items,
            total_records,
            total_pages,
        })
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<UserView>> {
        let rows = self.inner.read().await;
        Ok(rows.by_id.get(&id).cloned().map(UserView::from))
    }

    async fn update(&self, id: i64, patch: UserPatch) -> UserResult<UserView> {
        let mut rows = self.inner.write().await;
        let user = rows.by_id.get_mut(&id).ok_or(UserError::NotFound)?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        Ok(UserView::from(user.clone()))
    }

    async fn delete(&self, id: i64) -> UserResult<()> {
        let mut rows = self.inner.write().await;
        rows.by_id.remove(&id).map(|_| ()).ok_or(UserError::NotFound)
    }
}
