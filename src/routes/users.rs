use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    middleware::auth::require_admin,
    models::{
        auth::AuthenticatedUser,
        pagination::Paginated,
        user::{RegisterRequest, UpdateUserRequest, UserListQuery, UserProfile},
    },
    routes::{internal, not_found, ApiError},
    services::users::UserService,
    AppState,
};

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    UserService::find(&state.db, user.user_id)
        .await
        .map_err(internal)?
        .map(|u| Json(u.into()))
        .ok_or_else(|| not_found("User"))
}

/// PATCH /users/me. The role field is ignored.
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    UserService::update_profile(&state.db, &user, body)
        .await?
        .map(|u| Json(u.into()))
        .ok_or_else(|| not_found("User"))
}

/// POST /users (admin only)
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    require_admin(&user)?;
    let created =
        UserService::create(&state.db, &body, Some(&user), &state.config.default_timezone).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /users?page=&limit=&sort=&search=&role= (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<UserListQuery>,
) -> Result<Json<Paginated<UserProfile>>, ApiError> {
    require_admin(&user)?;
    UserService::list(&state.db, &params)
        .await
        .map(Json)
        .map_err(internal)
}

pub async fn get_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    require_admin(&user)?;
    UserService::find(&state.db, id)
        .await
        .map_err(internal)?
        .map(|u| Json(u.into()))
        .ok_or_else(|| not_found("User"))
}

pub async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    require_admin(&user)?;
    UserService::update(&state.db, id, &body, &user)
        .await?
        .map(|u| Json(u.into()))
        .ok_or_else(|| not_found("User"))
}

pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;
    if UserService::delete(&state.db, id, &user).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("User"))
    }
}
