use axum::{extract::State, Json};

use crate::{
    models::{
        auth::AuthenticatedUser,
        suggestion::{DailySuggestion, RerollRequest},
    },
    routes::{internal, not_found, ApiError},
    services::users::UserService,
    AppState,
};

/// "Today" is resolved in the caller's stored timezone.
async fn caller_timezone(state: &AppState, user: &AuthenticatedUser) -> Result<String, ApiError> {
    UserService::find(&state.db, user.user_id)
        .await
        .map_err(internal)?
        .map(|u| u.timezone)
        .ok_or_else(|| not_found("User"))
}

/// POST /suggestions/generate-today
pub async fn generate_today(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<DailySuggestion>, ApiError> {
    let timezone = caller_timezone(&state, &user).await?;
    state
        .suggestions
        .generate_today(user.user_id, &timezone)
        .await
        .map(Json)
        .map_err(internal)
}

/// GET /suggestions/today (`null` until something was generated)
pub async fn get_today(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Option<DailySuggestion>>, ApiError> {
    let timezone = caller_timezone(&state, &user).await?;
    state
        .suggestions
        .get_today(user.user_id, &timezone)
        .await
        .map(Json)
        .map_err(internal)
}

/// POST /suggestions/reroll { "meal_type": "lunch" }
pub async fn reroll(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<RerollRequest>,
) -> Result<Json<DailySuggestion>, ApiError> {
    let timezone = caller_timezone(&state, &user).await?;
    state
        .suggestions
        .reroll(user.user_id, &timezone, body.meal_type)
        .await
        .map(Json)
        .map_err(internal)
}
