use sqlx::PgPool;
use uuid::Uuid;

use crate::models::schedule::{Schedule, UpdateScheduleRequest, DEFAULT_TIMES};

const SCHEDULE_COLUMNS: &str = "user_id, times, timezone, created_at, updated_at";

pub struct ScheduleService;

impl ScheduleService {
    pub async fn find(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Schedule>> {
        let schedule = sqlx::query_as::<_, Schedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(schedule)
    }

    /// Fetch the schedule, creating the default one (in `timezone`) if the user has none.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: Uuid,
        timezone: &str,
    ) -> anyhow::Result<Schedule> {
        let times: Vec<String> = DEFAULT_TIMES.iter().map(|t| t.to_string()).collect();
        sqlx::query(
            "INSERT INTO schedules (user_id, times, timezone) VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(&times)
        .bind(timezone)
        .execute(pool)
        .await?;
        Self::find(pool, user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Schedule for user {user_id} vanished after insert"))
    }

    /// Insert or update. `req` must already be normalised; a new row falls back to the
    /// default times and `default_timezone` for fields the request leaves out.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        req: &UpdateScheduleRequest,
        default_timezone: &str,
    ) -> anyhow::Result<Schedule> {
        let default_times: Vec<String> = DEFAULT_TIMES.iter().map(|t| t.to_string()).collect();
        let schedule = sqlx::query_as::<_, Schedule>(&format!(
            "INSERT INTO schedules (user_id, times, timezone)
             VALUES ($1, COALESCE($2::text[], $4::text[]), COALESCE($3::text, $5::text))
             ON CONFLICT (user_id) DO UPDATE SET
                 times = COALESCE($2::text[], schedules.times),
                 timezone = COALESCE($3::text, schedules.timezone),
                 updated_at = NOW()
             RETURNING {SCHEDULE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&req.times)
        .bind(&req.timezone)
        .bind(&default_times)
        .bind(default_timezone)
        .fetch_one(pool)
        .await?;
        Ok(schedule)
    }
}
