use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::preference::{Preference, PreferenceRow, UpdatePreferenceRequest},
    services::suggestions::PreferenceStore,
};

const PREFERENCE_COLUMNS: &str =
    "user_id, cuisines, allergens_avoid, budget_min, budget_max, excluded_meal_types, created_at, updated_at";

pub struct PreferenceService;

impl PreferenceService {
    pub async fn find(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Preference>> {
        let row = sqlx::query_as::<_, PreferenceRow>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(Preference::from))
    }

    /// Fetch the user's preference, creating the empty default row on first access.
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Preference> {
        sqlx::query("INSERT INTO preferences (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(pool)
            .await?;
        Self::find(pool, user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Preference for user {user_id} vanished after insert"))
    }

    /// Insert or update; fields absent from the request keep their stored value.
    /// $7/$8 flag budget bounds present in the request, so `null` clears them.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        req: &UpdatePreferenceRequest,
    ) -> anyhow::Result<Preference> {
        let excluded: Option<Vec<String>> = req
            .excluded_meal_types
            .as_ref()
            .map(|slots| slots.iter().map(|s| s.to_string()).collect());

        let row = sqlx::query_as::<_, PreferenceRow>(&format!(
            "INSERT INTO preferences
                (user_id, cuisines, allergens_avoid, budget_min, budget_max, excluded_meal_types)
             VALUES ($1, COALESCE($2::text[], '{{}}'), COALESCE($3::text[], '{{}}'), $4, $5, COALESCE($6::text[], '{{}}'))
             ON CONFLICT (user_id) DO UPDATE SET
                 cuisines = COALESCE($2, preferences.cuisines),
                 allergens_avoid = COALESCE($3, preferences.allergens_avoid),
                 budget_min = CASE WHEN $7 THEN EXCLUDED.budget_min ELSE preferences.budget_min END,
                 budget_max = CASE WHEN $8 THEN EXCLUDED.budget_max ELSE preferences.budget_max END,
                 excluded_meal_types = COALESCE($6, preferences.excluded_meal_types),
                 updated_at = NOW()
             RETURNING {PREFERENCE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&req.cuisines)
        .bind(&req.allergens_avoid)
        .bind(req.budget_min.flatten())
        .bind(req.budget_max.flatten())
        .bind(&excluded)
        .bind(req.budget_min.is_some())
        .bind(req.budget_max.is_some())
        .fetch_one(pool)
        .await?;
        Ok(row.into())
    }
}

/// [`PreferenceStore`] backed by the `preferences` table.
#[derive(Clone)]
pub struct PgPreferenceStore {
    pool: PgPool,
}

impl PgPreferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for PgPreferenceStore {
    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Preference>> {
        PreferenceService::find(&self.pool, user_id).await
    }
}
