use axum::{extract::State, Json};

use crate::{
    middleware::rate_limit::check_rate_limit,
    models::{
        auth::AuthenticatedUser,
        user::{AuthResponse, LoginRequest, RegisterRequest},
    },
    routes::ApiError,
    services::auth::AuthService,
    AppState,
};

/// POST /auth/register. Open to everyone; an admin caller may pick the role.
pub async fn register(
    State(state): State<AppState>,
    caller: Option<AuthenticatedUser>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let rate_key = format!("rate:register:{}", body.email.trim().to_lowercase());
    let mut redis = state.redis.clone();
    check_rate_limit(
        &mut redis,
        &rate_key,
        state.config.rate_limit_max,
        state.config.rate_limit_window_secs,
    )
    .await?;

    let res = AuthService::register(
        &state.db,
        &body,
        caller.as_ref(),
        &state.config.default_timezone,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )
    .await?;
    Ok(Json(res))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let rate_key = format!("rate:login:{}", body.email.trim().to_lowercase());
    let mut redis = state.redis.clone();
    check_rate_limit(
        &mut redis,
        &rate_key,
        state.config.rate_limit_max,
        state.config.rate_limit_window_secs,
    )
    .await?;

    let res = AuthService::login(
        &state.db,
        &body,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )
    .await?;
    Ok(Json(res))
}
