pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use middleware::auth::JwtSecret;
use services::suggestions::SuggestionEngine;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: redis::aio::MultiplexedConnection,
    pub config: Arc<Config>,
    pub suggestions: Arc<SuggestionEngine>,
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match &config.cors_origins {
        None => AllowOrigin::any(),
        Some(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!("ignoring invalid CORS origin {o:?}");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(origin)
}

pub fn app(state: AppState) -> Router {
    let jwt_secret = JwtSecret(state.config.jwt_secret.clone());
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        // Users
        .route("/users/me", get(routes::users::me).patch(routes::users::update_me))
        .route("/users", get(routes::users::list_users).post(routes::users::create_user))
        .route(
            "/users/{id}",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        // Menus
        .route("/menus", get(routes::menus::list_menus).post(routes::menus::create_menu))
        .route(
            "/menus/{id}",
            get(routes::menus::get_menu)
                .patch(routes::menus::update_menu)
                .delete(routes::menus::delete_menu),
        )
        // Preferences
        .route(
            "/preferences/me",
            get(routes::preferences::get_mine).patch(routes::preferences::update_mine),
        )
        .route(
            "/preferences/{user_id}",
            get(routes::preferences::get_for_user).patch(routes::preferences::update_for_user),
        )
        // Schedules
        .route(
            "/schedules/me",
            get(routes::schedules::get_mine).patch(routes::schedules::update_mine),
        )
        .route(
            "/schedules/{user_id}",
            get(routes::schedules::get_for_user).patch(routes::schedules::update_for_user),
        )
        // Suggestions
        .route("/suggestions/generate-today", post(routes::suggestions::generate_today))
        .route("/suggestions/today", get(routes::suggestions::get_today))
        .route("/suggestions/reroll", post(routes::suggestions::reroll))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
