use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{
        menu::{MealType, MenuItem},
        suggestion::{DailySuggestion, DailySuggestionRow, SuggestionPatch},
    },
    services::{menu::MenuService, suggestions::DailySuggestionStore},
};

const SUGGESTION_COLUMNS: &str =
    "id, user_id, date, breakfast_menu_id, lunch_menu_id, dinner_menu_id, created_at, updated_at";

/// [`DailySuggestionStore`] backed by `daily_suggestions`, relying on its
/// UNIQUE (user_id, date) constraint for the upsert.
#[derive(Clone)]
pub struct PgDailySuggestionStore {
    pool: PgPool,
}

impl PgDailySuggestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace menu ids with the menu rows themselves.
    async fn expand(&self, row: DailySuggestionRow) -> anyhow::Result<DailySuggestion> {
        let ids: Vec<Uuid> = MealType::ALL.iter().filter_map(|s| row.menu_id(*s)).collect();
        let menus: HashMap<Uuid, MenuItem> = MenuService::find_many(&self.pool, &ids)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let take = |slot: MealType| row.menu_id(slot).and_then(|id| menus.get(&id).cloned());

        Ok(DailySuggestion {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            breakfast: take(MealType::Breakfast),
            lunch: take(MealType::Lunch),
            dinner: take(MealType::Dinner),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl DailySuggestionStore for PgDailySuggestionStore {
    async fn upsert(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        patch: SuggestionPatch,
    ) -> anyhow::Result<DailySuggestion> {
        // $3/$5/$7 say whether the slot is being written; untouched slots keep their value.
        // An id whose menu no longer exists is stored as NULL instead of tripping the FK.
        let row = sqlx::query_as::<_, DailySuggestionRow>(&format!(
            "INSERT INTO daily_suggestions
                (user_id, date, breakfast_menu_id, lunch_menu_id, dinner_menu_id)
             VALUES ($1, $2,
                     (SELECT id FROM menus WHERE id = $4::uuid),
                     (SELECT id FROM menus WHERE id = $6::uuid),
                     (SELECT id FROM menus WHERE id = $8::uuid))
             ON CONFLICT (user_id, date) DO UPDATE SET
                 breakfast_menu_id = CASE WHEN $3 THEN EXCLUDED.breakfast_menu_id
                                          ELSE daily_suggestions.breakfast_menu_id END,
                 lunch_menu_id     = CASE WHEN $5 THEN EXCLUDED.lunch_menu_id
                                          ELSE daily_suggestions.lunch_menu_id END,
                 dinner_menu_id    = CASE WHEN $7 THEN EXCLUDED.dinner_menu_id
                                          ELSE daily_suggestions.dinner_menu_id END,
                 updated_at = NOW()
             RETURNING {SUGGESTION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(date)
        .bind(patch.breakfast.is_some())
        .bind(patch.breakfast.flatten())
        .bind(patch.lunch.is_some())
        .bind(patch.lunch.flatten())
        .bind(patch.dinner.is_some())
        .bind(patch.dinner.flatten())
        .fetch_one(&self.pool)
        .await?;

        self.expand(row).await
    }

    async fn find_one(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailySuggestion>> {
        let row = sqlx::query_as::<_, DailySuggestionRow>(&format!(
            "SELECT {SUGGESTION_COLUMNS} FROM daily_suggestions
             WHERE user_id = $1 AND date = $2"
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.expand(row).await?)),
            None => Ok(None),
        }
    }
}
