use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{auth::Role, errors::ApiError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

pub async fn create_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    full_name: &str,
    role: Role,
) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>(
        r#"
            INSERT INTO users (email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
            ApiError::Conflict("Email already in use".to_string())
        } else {
            ApiError::Database(e)
        }
    })
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
            SELECT * FROM users
            WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
            SELECT * FROM users
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, ApiError> {
    let users = sqlx::query_as::<_, User>(
        r#"
            SELECT * FROM users
            ORDER BY created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Current role as stored, for actions that must not trust a stale claim.
pub async fn get_role(pool: &PgPool, id: Uuid) -> Result<Option<Role>, ApiError> {
    let role = sqlx::query_scalar::<_, Role>(
        r#"
            SELECT role FROM users
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(role)
}

pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool, ApiError> {
    let result = sqlx::query(
        r#"
            DELETE FROM users
            WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| {
        if matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation()) {
            ApiError::Conflict("User has associated records".to_string())
        } else {
            ApiError::Database(e)
        }
    })?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_users(pool: &PgPool) -> Result<i64, ApiError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
