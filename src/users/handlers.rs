use std::{future::Future, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    state::AppState,
    users::{
        dto::{
            CreateUserRequest, ListUsersResponse, MessageResponse, UpdateUserRequest,
            UpdatedUserResponse,
        },
        error::{UserError, UserResult},
        extractors::{JsonBody, PageQuery, UserId},
        password::hash_password_blocking,
        repo_types::{NewUser, UserView},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Request-scoped deadline. Dropping the handler future (client gone) aborts the work too.
async fn within<T, F>(limit: Duration, op: &'static str, fut: F) -> UserResult<T>
where
    F: Future<Output = UserResult<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or_else(|_| Err(UserError::Timeout(op)))
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateUserRequest>,
) -> UserResult<(StatusCode, Json<UserView>)> {
    within(state.timeouts.create_request, "create_user", async move {
        let password = hash_password_blocking(body.password).await?;
        let user = state
            .users
            .create_user(NewUser {
                name: body.name,
                email: body.email,
                password,
            })
            .await?;
        info!(user_id = user.id, "user created");
        Ok((StatusCode::CREATED, Json(UserView::from(user))))
    })
    .await
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> UserResult<Json<UserView>> {
    within(state.timeouts.request, "get_user", async move {
        let user = state.users.get_user(id).await?.ok_or(UserError::NotFound)?;
        Ok(Json(user))
    })
    .await
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    PageQuery(params): PageQuery,
) -> UserResult<Json<ListUsersResponse>> {
    within(state.timeouts.request, "list_users", async move {
        let page = state.users.list_users(params.page, params.page_size).await?;
        Ok(Json(ListUsersResponse {
            total_records: page.total_records,
            total_pages: page.total_pages,
            users: page.items,
        }))
    })
    .await
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    JsonBody(body): JsonBody<UpdateUserRequest>,
) -> UserResult<Json<UpdatedUserResponse>> {
    within(state.timeouts.request, "update_user", async move {
        let user = state.users.update_user(id, body.into()).await?;
        info!(user_id = id, "user updated");
        Ok(Json(UpdatedUserResponse {
            message: "updated successfully",
            user,
        }))
    })
    .await
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> UserResult<Json<MessageResponse>> {
    within(state.timeouts.request, "delete_user", async move {
        state.users.delete_user(id).await?;
        info!(user_id = id, "user deleted");
        Ok(Json(MessageResponse {
            message: "deleted successfully",
        }))
    })
    .await
}
