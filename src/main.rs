use std::{sync::Arc, time::Duration};

use redis::Client as RedisClient;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meal_planner_api::{
    app,
    config::Config,
    db,
    services::{
        candidate_cache::CandidateCache,
        daily_suggestions::PgDailySuggestionStore,
        menu::PgMenuCatalog,
        preferences::PgPreferenceStore,
        suggestions::{SuggestionEngine, SuggestionSettings},
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let redis_client = RedisClient::open(config.redis_url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    info!("Redis connected");

    let settings = SuggestionSettings {
        sample_size: config.suggestion_sample_size,
        cache_ttl: Duration::from_secs(config.suggestion_cache_ttl_secs),
    };
    let suggestions = SuggestionEngine::new(
        Arc::new(PgMenuCatalog::new(pool.clone())),
        Arc::new(PgPreferenceStore::new(pool.clone())),
        Arc::new(PgDailySuggestionStore::new(pool.clone())),
        Arc::new(CandidateCache::new()),
        settings,
    );

    let state = AppState {
        db: pool,
        redis: redis_conn,
        config: config.clone(),
        suggestions: Arc::new(suggestions),
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("meal planner API listening on {}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
