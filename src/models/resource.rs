use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub resource_type: String,
    pub url: String,
}

pub async fn create_resource(
    pool: &PgPool,
    course_id: Uuid,
    title: &str,
    resource_type: &str,
    url: &str,
) -> Result<Resource, ApiError> {
    let resource = sqlx::query_as::<_, Resource>(
        r#"
            INSERT INTO resources (course_id, title, resource_type, url)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(resource_type)
    .bind(url)
    .fetch_one(pool)
    .await?;

    Ok(resource)
}

pub async fn list_for_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<Resource>, ApiError> {
    let resources = sqlx::query_as::<_, Resource>(
        r#"
            SELECT * FROM resources
            WHERE course_id = $1
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(resources)
}
