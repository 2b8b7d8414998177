use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub score: i32,
    pub submitted_at: DateTime<Utc>,
}

/// Scores are immutable once recorded; there is no update path.
pub async fn record(
    pool: &PgPool,
    user_id: Uuid,
    quiz_id: Uuid,
    score: i32,
) -> Result<Submission, ApiError> {
    let submission = sqlx::query_as::<_, Submission>(
        r#"
            INSERT INTO submissions (user_id, quiz_id, score)
            VALUES ($1, $2, $3)
            RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(score)
    .fetch_one(pool)
    .await?;

    Ok(submission)
}

pub async fn count_submissions(pool: &PgPool) -> Result<i64, ApiError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submissions")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
