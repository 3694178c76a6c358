use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    middleware::auth::require_admin,
    models::{
        auth::AuthenticatedUser,
        preference::{Preference, UpdatePreferenceRequest},
    },
    routes::{bad_request, internal, not_found, ApiError},
    services::{preferences::PreferenceService, users::UserService},
    AppState,
};

async fn ensure_user_exists(state: &AppState, user_id: Uuid) -> Result<(), ApiError> {
    UserService::find(&state.db, user_id)
        .await
        .map_err(internal)?
        .map(|_| ())
        .ok_or_else(|| not_found("User"))
}

/// GET /preferences/me (an empty preference is created on first access)
pub async fn get_mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Preference>, ApiError> {
    PreferenceService::get_or_create(&state.db, user.user_id)
        .await
        .map(Json)
        .map_err(internal)
}

pub async fn update_mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdatePreferenceRequest>,
) -> Result<Json<Preference>, ApiError> {
    body.validate().map_err(bad_request)?;
    PreferenceService::upsert(&state.db, user.user_id, &body)
        .await
        .map(Json)
        .map_err(internal)
}

/// GET /preferences/{user_id} (admin only)
pub async fn get_for_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Preference>, ApiError> {
    require_admin(&user)?;
    ensure_user_exists(&state, user_id).await?;
    PreferenceService::get_or_create(&state.db, user_id)
        .await
        .map(Json)
        .map_err(internal)
}

/// PATCH /preferences/{user_id} (admin only)
pub async fn update_for_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdatePreferenceRequest>,
) -> Result<Json<Preference>, ApiError> {
    require_admin(&user)?;
    body.validate().map_err(bad_request)?;
    ensure_user_exists(&state, user_id).await?;
    PreferenceService::upsert(&state.db, user_id, &body)
        .await
        .map(Json)
        .map_err(internal)
}
