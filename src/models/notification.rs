use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn create_notification(
    pool: &PgPool,
    user_id: Uuid,
    message: &str,
) -> Result<Notification, ApiError> {
    let notification = sqlx::query_as::<_, Notification>(
        r#"
            INSERT INTO notifications (user_id, message)
            VALUES ($1, $2)
            RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(message)
    .fetch_one(pool)
    .await?;

    Ok(notification)
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Notification>, ApiError> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
            SELECT * FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

/// Scoped to the owner; a foreign or absent id reads the same from outside.
pub async fn mark_read(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
    let result = sqlx::query(
        r#"
            UPDATE notifications SET read = true
            WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
