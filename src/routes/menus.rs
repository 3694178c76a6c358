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
        menu::{CreateMenuRequest, MenuItem, MenuListQuery, UpdateMenuRequest},
        pagination::Paginated,
    },
    routes::{bad_request, internal, not_found, ApiError},
    services::menu::MenuService,
    AppState,
};

/// POST /menus (admin only)
pub async fn create_menu(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateMenuRequest>,
) -> Result<(StatusCode, Json<MenuItem>), ApiError> {
    require_admin(&user)?;
    body.validate().map_err(bad_request)?;

    let menu = MenuService::create(&state.db, &body).await.map_err(internal)?;
    state.suggestions.invalidate_candidates();
    tracing::info!("Menu {} created by {}", menu.id, user.user_id);
    Ok((StatusCode::CREATED, Json(menu)))
}

/// GET /menus?page=&limit=&sort=&search=&meal_type=&cuisine=&is_active=
pub async fn list_menus(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<MenuListQuery>,
) -> Result<Json<Paginated<MenuItem>>, ApiError> {
    MenuService::list(&state.db, &params)
        .await
        .map(Json)
        .map_err(internal)
}

pub async fn get_menu(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MenuItem>, ApiError> {
    MenuService::find(&state.db, id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Menu"))
}

/// PATCH /menus/{id} (admin only)
pub async fn update_menu(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMenuRequest>,
) -> Result<Json<MenuItem>, ApiError> {
    require_admin(&user)?;
    body.validate().map_err(bad_request)?;

    let menu = MenuService::update(&state.db, id, &body)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Menu"))?;
    state.suggestions.invalidate_candidates();
    Ok(Json(menu))
}

/// DELETE /menus/{id} (admin only)
pub async fn delete_menu(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;
    if MenuService::delete(&state.db, id).await.map_err(internal)? {
        state.suggestions.invalidate_candidates();
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Menu"))
    }
}
