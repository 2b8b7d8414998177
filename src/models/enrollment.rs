use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
}

/// Idempotent: a second call for the same (user, course) pair returns the
/// existing row untouched, whatever its status. The unique index on the pair
/// makes this safe under concurrent callers.
pub async fn enroll(pool: &PgPool, user_id: Uuid, course_id: Uuid) -> Result<Enrollment, ApiError> {
    let inserted = sqlx::query_as::<_, Enrollment>(
        r#"
            INSERT INTO enrollments (user_id, course_id, status)
            VALUES ($1, $2, 'active')
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    if let Some(enrollment) = inserted {
        return Ok(enrollment);
    }

    let existing = sqlx::query_as::<_, Enrollment>(
        r#"
            SELECT * FROM enrollments
            WHERE user_id = $1 AND course_id = $2
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await?;

    Ok(existing)
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Enrollment>, ApiError> {
    let enrollments = sqlx::query_as::<_, Enrollment>(
        r#"
            SELECT * FROM enrollments
            WHERE user_id = $1
            ORDER BY enrolled_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(enrollments)
}

async fn get_for_user(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Enrollment>, ApiError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
            SELECT * FROM enrollments
            WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(enrollment)
}

/// Transitions are legal only out of `active`; the conditional update is the
/// compare-and-set that serializes concurrent attempts. A row the caller does
/// not own reads as absent.
pub async fn transition(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    to: EnrollmentStatus,
) -> Result<Enrollment, ApiError> {
    let updated = sqlx::query_as::<_, Enrollment>(
        r#"
            UPDATE enrollments SET status = $3
            WHERE id = $1 AND user_id = $2 AND status = 'active'
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(to)
    .fetch_optional(pool)
    .await?;

    if let Some(enrollment) = updated {
        return Ok(enrollment);
    }

    match get_for_user(pool, id, user_id).await? {
        Some(_) => Err(ApiError::NotEligible(
            "Enrollment is no longer active".to_string(),
        )),
        None => Err(ApiError::NotFound("Enrollment not found".to_string())),
    }
}

pub async fn find_completed(
    pool: &PgPool,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Option<Enrollment>, ApiError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
            SELECT * FROM enrollments
            WHERE user_id = $1 AND course_id = $2 AND status = 'completed'
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(enrollment)
}

pub async fn count_enrollments(pool: &PgPool) -> Result<i64, ApiError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enrollments")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
