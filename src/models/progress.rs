use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Progress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Appends a completion event. This is an event log, not an upsert; repeated
/// calls for the same lesson accumulate history.
pub async fn record(
    pool: &PgPool,
    user_id: Uuid,
    course_id: Uuid,
    lesson_id: Option<Uuid>,
    completed: bool,
) -> Result<Progress, ApiError> {
    let progress = sqlx::query_as::<_, Progress>(
        r#"
            INSERT INTO progress (user_id, course_id, lesson_id, completed)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(lesson_id)
    .bind(completed)
    .fetch_one(pool)
    .await?;

    Ok(progress)
}

pub async fn list_for_course(
    pool: &PgPool,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Vec<Progress>, ApiError> {
    let events = sqlx::query_as::<_, Progress>(
        r#"
            SELECT * FROM progress
            WHERE user_id = $1 AND course_id = $2
            ORDER BY updated_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(events)
}
