use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{
        menu::{CreateMenuRequest, MealType, MenuItem, MenuListQuery, UpdateMenuRequest},
        pagination::{order_by, PageWindow, Paginated},
        preference::MenuFilter,
    },
    services::suggestions::MenuCatalog,
};

const MENU_COLUMNS: &str = "id, title, meal_type, cuisine, is_active, notes, allergens,
    budget_min, budget_max, image_url, created_at, updated_at";

const SORTABLE: &[&str] = &["created_at", "updated_at", "title", "cuisine", "meal_type"];

/// Active items of one slot matching cuisine / allergen / budget filters ($1..$5).
const ELIGIBLE_WHERE: &str = "is_active = TRUE AND meal_type = $1
    AND (cardinality($2::text[]) = 0 OR cuisine = ANY($2))
    AND NOT (allergens && $3::text[])
    AND ($4::float8 IS NULL OR budget_max IS NULL OR budget_max >= $4)
    AND ($5::float8 IS NULL OR budget_min IS NULL OR budget_min <= $5)";

pub struct MenuService;

impl MenuService {
    pub async fn create(pool: &PgPool, req: &CreateMenuRequest) -> anyhow::Result<MenuItem> {
        let menu = sqlx::query_as::<_, MenuItem>(&format!(
            "INSERT INTO menus
                (title, meal_type, cuisine, is_active, notes, allergens, budget_min, budget_max, image_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {MENU_COLUMNS}"
        ))
        .bind(req.title.trim())
        .bind(req.meal_type.as_str())
        .bind(req.cuisine.trim())
        .bind(req.is_active)
        .bind(&req.notes)
        .bind(&req.allergens)
        .bind(req.budget_min)
        .bind(req.budget_max)
        .bind(&req.image_url)
        .fetch_one(pool)
        .await?;
        Ok(menu)
    }

    pub async fn list(pool: &PgPool, query: &MenuListQuery) -> anyhow::Result<Paginated<MenuItem>> {
        let window = PageWindow::new(query.page, query.limit);
        let order = order_by(query.sort.as_deref(), SORTABLE);
        let filters = "($1::text IS NULL OR meal_type = $1)
              AND ($2::text IS NULL OR cuisine ILIKE '%' || $2 || '%')
              AND ($3::bool IS NULL OR is_active = $3)
              AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%')";
        let meal_type = query.meal_type.map(|m| m.as_str());

        let menus = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus
             WHERE {filters}
             ORDER BY {order}
             LIMIT $5 OFFSET $6"
        ))
        .bind(meal_type)
        .bind(&query.cuisine)
        .bind(query.is_active)
        .bind(&query.search)
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM menus WHERE {filters}"))
            .bind(meal_type)
            .bind(&query.cuisine)
            .bind(query.is_active)
            .bind(&query.search)
            .fetch_one(pool)
            .await?;

        Ok(Paginated::new(menus, total, window))
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<MenuItem>> {
        let menu = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(menu)
    }

    pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<MenuItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let menus = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(pool)
        .await?;
        Ok(menus)
    }

    /// Partial update; returns `None` for an unknown id.
    /// $11..$14 flag nullable fields present in the request, so `null` clears them.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateMenuRequest,
    ) -> anyhow::Result<Option<MenuItem>> {
        let menu = sqlx::query_as::<_, MenuItem>(&format!(
            "UPDATE menus
             SET title = COALESCE($1, title),
                 meal_type = COALESCE($2, meal_type),
                 cuisine = COALESCE($3, cuisine),
                 is_active = COALESCE($4, is_active),
                 notes = CASE WHEN $11 THEN $5 ELSE notes END,
                 allergens = COALESCE($6, allergens),
                 budget_min = CASE WHEN $12 THEN $7 ELSE budget_min END,
                 budget_max = CASE WHEN $13 THEN $8 ELSE budget_max END,
                 image_url = CASE WHEN $14 THEN $9 ELSE image_url END,
                 updated_at = NOW()
             WHERE id = $10
             RETURNING {MENU_COLUMNS}"
        ))
        .bind(req.title.as_deref().map(str::trim))
        .bind(req.meal_type.map(|m| m.as_str()))
        .bind(req.cuisine.as_deref().map(str::trim))
        .bind(req.is_active)
        .bind(req.notes.clone().flatten())
        .bind(&req.allergens)
        .bind(req.budget_min.flatten())
        .bind(req.budget_max.flatten())
        .bind(req.image_url.clone().flatten())
        .bind(id)
        .bind(req.notes.is_some())
        .bind(req.budget_min.is_some())
        .bind(req.budget_max.is_some())
        .bind(req.image_url.is_some())
        .fetch_optional(pool)
        .await?;
        Ok(menu)
    }

    /// Returns `false` when no row matched.
    pub async fn delete(pool: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

/// [`MenuCatalog`] over the `menus` table; randomness comes from `ORDER BY random()`.
#[derive(Clone)]
pub struct PgMenuCatalog {
    pool: PgPool,
}

impl PgMenuCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn eligible(
        &self,
        slot: MealType,
        filter: &MenuFilter,
        limit: i64,
    ) -> anyhow::Result<Vec<MenuItem>> {
        let menus = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus
             WHERE {ELIGIBLE_WHERE}
             ORDER BY random()
             LIMIT $6"
        ))
        .bind(slot.as_str())
        .bind(&filter.cuisines)
        .bind(&filter.allergens_avoid)
        .bind(filter.budget_min)
        .bind(filter.budget_max)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(menus)
    }
}

#[async_trait]
impl MenuCatalog for PgMenuCatalog {
    async fn sample_eligible(
        &self,
        slot: MealType,
        filter: &MenuFilter,
        count: usize,
    ) -> anyhow::Result<Vec<MenuItem>> {
        self.eligible(slot, filter, i64::try_from(count)?).await
    }

    async fn pick_one_eligible(
        &self,
        slot: MealType,
        filter: &MenuFilter,
    ) -> anyhow::Result<Option<MenuItem>> {
        Ok(self.eligible(slot, filter, 1).await?.into_iter().next())
    }

    async fn pick_one_by_slot_only(&self, slot: MealType) -> anyhow::Result<Option<MenuItem>> {
        let menu = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus
             WHERE is_active = TRUE AND meal_type = $1
             ORDER BY random()
             LIMIT 1"
        ))
        .bind(slot.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(menu)
    }

    async fn most_recent_active(&self, slot: MealType) -> anyhow::Result<Option<MenuItem>> {
        let menu = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus
             WHERE is_active = TRUE AND meal_type = $1
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(slot.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(menu)
    }
}
