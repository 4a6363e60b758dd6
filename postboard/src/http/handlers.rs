use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::{
    post, user, PostAttributes, PostWithUser, StoreError, UserAttributes, UserWithPosts,
};

use super::error::ApiError;
use super::extract::ApiJson;
use super::responses::{HealthResponse, MessageResponse};
use super::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{uuid}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/posts", get(list_posts).post(create_post))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        // Set must wrap Propagate so a generated id reaches the response.
        .layer(tower_http::request_id::PropagateRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
        ))
        .layer(tower_http::request_id::SetRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
            tower_http::request_id::MakeRequestUuid,
        ))
        .with_state(state)
}

fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidUuid(raw.to_string()))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "up",
            }),
        ),
        Err(error) => {
            warn!(error = %error, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    database: "down",
                }),
            )
        }
    }
}

async fn create_user(
    State(state): State<AppState>,
    ApiJson(attributes): ApiJson<UserAttributes>,
) -> Result<Json<user::Model>, ApiError> {
    let user = state.store.create_user(attributes).await?;
    debug!(uuid = %user.uuid, "user created");
    Ok(Json(user))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<user::Model>>, ApiError> {
    let users = state.store.list_users().await?;
    debug!(users = users.len(), "users listed");
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<UserWithPosts>, ApiError> {
    let uuid = parse_uuid(&uuid)?;
    let found = state
        .store
        .find_user_with_posts(uuid)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("user {uuid} not found")))?;
    debug!(uuid = %uuid, posts = found.posts.len(), "user fetched");
    Ok(Json(found))
}

async fn update_user(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    ApiJson(attributes): ApiJson<UserAttributes>,
) -> Result<Json<user::Model>, ApiError> {
    let uuid = parse_uuid(&uuid)?;
    let user = state.store.update_user(uuid, attributes).await?;
    debug!(uuid = %uuid, "user updated");
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let uuid = parse_uuid(&uuid)?;
    state.store.delete_user(uuid).await?;
    debug!(uuid = %uuid, "user deleted");
    Ok(Json(MessageResponse {
        message: "User deleted",
    }))
}

async fn create_post(
    State(state): State<AppState>,
    ApiJson(attributes): ApiJson<PostAttributes>,
) -> Result<Json<post::Model>, ApiError> {
    let post = state.store.create_post(attributes).await?;
    debug!(id = post.id, user_id = post.user_id, "post created");
    Ok(Json(post))
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostWithUser>>, ApiError> {
    let posts = state.store.list_posts_with_user().await?;
    debug!(posts = posts.len(), "posts listed");
    Ok(Json(posts))
}
