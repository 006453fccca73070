use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{error, warn};

use crate::users::{
    error::{UserError, UserResult},
    repo::UserRepository,
    repo_types::{NewUser, PagedResult, User, UserPatch, UserView},
};

/// Orchestration over a [`UserRepository`]. Mirrors it one-to-one.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn create_user(&self, user: NewUser) -> UserResult<User>;
    async fn list_users(&self, page: i64, page_size: i64) -> UserResult<PagedResult>;
    async fn get_user(&self, id: i64) -> UserResult<Option<UserView>>;
    async fn update_user(&self, id: i64, patch: UserPatch) -> UserResult<UserView>;
    async fn delete_user(&self, id: i64) -> UserResult<()>;
}

/// Wraps every store call in its own deadline and logs failures.
/// Errors are returned as the store produced them; nothing is retried.
pub struct UserServiceImpl {
    repo: Arc<dyn UserRepository>,
    call_timeout: Duration,
}

impl UserServiceImpl {
    pub fn new(repo: Arc<dyn UserRepository>, call_timeout: Duration) -> Self {
        Self { repo, call_timeout }
    }

    async fn call<T, F>(&self, op: &'static str, fut: F) -> UserResult<T>
    where
        F: Future<Output = UserResult<T>> + Send,
        T: Send,
    {
        let result = match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(UserError::Timeout(op)),
        };
        match &result {
            Err(e @ UserError::NotFound) => warn!(op, error = %e, "user service call"),
            Err(e) => error!(op, error = %e, "user service call failed"),
            Ok(_) => {}
        }
        result
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create_user(&self, user: NewUser) -> UserResult<User> {
        self.call("create_user", self.repo.create(user)).await
    }

    async fn list_users(&self, page: i64, page_size: i64) -> UserResult<PagedResult> {
        self.call("list_users", self.repo.list(page, page_size)).await
    }

    async fn get_user(&self, id: i64) -> UserResult<Option<UserView>> {
        self.call("get_user", self.repo.get_by_id(id)).await
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> UserResult<UserView> {
        self.call("update_user", self.repo.update(id, patch)).await
    }

    async fn delete_user(&self, id: i64) -> UserResult<()> {
        self.call("delete_user", self.repo.delete(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned repository: id 1 exists, everything else is absent.
    struct MockRepo {
        delay: Duration,
        broken: bool,
    }

    impl MockRepo {
        fn ok() -> Arc<Self> {
            Arc::new(Self { delay: Duration::ZERO, broken: false })
        }
    }

    fn user_one() -> UserView {
        UserView {
            id: 1,
            name: "User 1".into(),
            email: "user1@example.com".into(),
        }
    }

    #[async_trait]
    impl UserRepository for MockRepo {
        async fn create(&self, user: NewUser) -> UserResult<User> {
            Ok(User {
                id: 1,
                name: user.name,
                email: user.email,
                password: user.password,
            })
        }

        async fn count(&self) -> UserResult<i64> {
            Ok(2)
        }

        async fn list(&self, _page: i64, _page_size: i64) -> UserResult<PagedResult> {
            tokio::time::sleep(self.delay).await;
            if self.broken {
                return Err(UserError::Store(sqlx::Error::PoolTimedOut));
            }
            Ok(PagedResult {
                items: vec![
                    user_one(),
                    UserView {
                        id: 2,
                        name: "User 2".into(),
                        email: "user2@example.com".into(),
                    },
                ],
                total_records: 2,
                total_pages: 1,
            })
        }

        async fn get_by_id(&self, id: i64) -> UserResult<Option<UserView>> {
            tokio::time::sleep(self.delay).await;
            Ok((id == 1).then(user_one))
        }

        async fn update(&self, id: i64, patch: UserPatch) -> UserResult<UserView> {
            if id != 1 {
                return Err(UserError::NotFound);
            }
            let base = user_one();
            Ok(UserView {
                id,
                name: patch.name.unwrap_or(base.name),
                email: patch.email.unwrap_or(base.email),
            })
        }

        async fn delete(&self, id: i64) -> UserResult<()> {
            if id == 1 {
                Ok(())
            } else {
                Err(UserError::NotFound)
            }
        }
    }

    fn service(repo: Arc<MockRepo>) -> UserServiceImpl {
        UserServiceImpl::new(repo, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn create_user_passes_through() {
        let svc = service(MockRepo::ok());
        let created = svc
            .create_user(NewUser {
                name: "Test User".into(),
                email: "test@example.com".into(),
                password: "hash".into(),
            })
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.name, "Test User");
    }

    #[tokio::test]
    async fn list_users_passes_through() {
        let svc = service(MockRepo::ok());
        let page = svc.list_users(1, 10).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_records, 2);
        assert_eq!(page.items[0].name, "User 1");
    }

    #[tokio::test]
    async fn get_user_present_and_absent() {
        let svc = service(MockRepo::ok());
        assert_eq!(svc.get_user(1).await.unwrap(), Some(user_one()));
        assert_eq!(svc.get_user(5).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_user_returns_patched_view() {
        let svc = service(MockRepo::ok());
        let patch = UserPatch {
            name: Some("Updated User".into()),
            email: Some("updated@example.com".into()),
        };
        let updated = svc.update_user(1, patch).await.unwrap();
        assert_eq!(updated.id, 1);
        assert_eq!(updated.name, "Updated User");
        assert_eq!(updated.email, "updated@example.com");
    }

    #[tokio::test]
    async fn delete_user_keeps_not_found_signal() {
        let svc = service(MockRepo::ok());
        svc.delete_user(1).await.unwrap();
        assert!(matches!(svc.delete_user(2).await, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn store_errors_are_returned_unchanged() {
        let svc = service(Arc::new(MockRepo { delay: Duration::ZERO, broken: true }));
        let err = svc.list_users(1, 10).await.unwrap_err();
        assert!(matches!(err, UserError::Store(sqlx::Error::PoolTimedOut)));
    }

    #[tokio::test]
    async fn slow_store_call_hits_deadline() {
        let repo = Arc::new(MockRepo { delay: Duration::from_secs(5), broken: false });
        let svc = UserServiceImpl::new(repo, Duration::from_millis(20));
        let err = svc.get_user(1).await.unwrap_err();
        assert!(matches!(err, UserError::Timeout("get_user")));
    }
}
