use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    middleware::auth::require_admin,
    models::{
        auth::AuthenticatedUser,
        schedule::{Schedule, UpdateScheduleRequest},
    },
    routes::{bad_request, internal, not_found, ApiError},
    services::{schedules::ScheduleService, users::UserService},
    AppState,
};

/// New schedules default to the owner's own timezone.
async fn owner_timezone(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    UserService::find(&state.db, user_id)
        .await
        .map_err(internal)?
        .map(|u| u.timezone)
        .ok_or_else(|| not_found("User"))
}

async fn load(state: &AppState, user_id: Uuid) -> Result<Json<Schedule>, ApiError> {
    let timezone = owner_timezone(state, user_id).await?;
    ScheduleService::get_or_create(&state.db, user_id, &timezone)
        .await
        .map(Json)
        .map_err(internal)
}

async fn save(
    state: &AppState,
    user_id: Uuid,
    body: UpdateScheduleRequest,
) -> Result<Json<Schedule>, ApiError> {
    let body = body.normalize().map_err(bad_request)?;
    let timezone = owner_timezone(state, user_id).await?;
    ScheduleService::upsert(&state.db, user_id, &body, &timezone)
        .await
        .map(Json)
        .map_err(internal)
}

pub async fn get_mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Schedule>, ApiError> {
    load(&state, user.user_id).await
}

pub async fn update_mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateScheduleRequest>,
) -> Result<Json<Schedule>, ApiError> {
    save(&state, user.user_id, body).await
}

pub async fn get_for_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Schedule>, ApiError> {
    require_admin(&user)?;
    load(&state, user_id).await
}

pub async fn update_for_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateScheduleRequest>,
) -> Result<Json<Schedule>, ApiError> {
    require_admin(&user)?;
    save(&state, user_id, body).await
}
