use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{errors::ApiError, schema::course::UpdateLesson};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub position: i32,
}

pub async fn create_lesson(
    pool: &PgPool,
    course_id: Uuid,
    title: &str,
    content: Option<&str>,
    video_url: Option<&str>,
    position: i32,
) -> Result<Lesson, ApiError> {
    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
            INSERT INTO lessons (course_id, title, content, video_url, "position")
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(content)
    .bind(video_url)
    .bind(position)
    .fetch_one(pool)
    .await?;

    Ok(lesson)
}

pub async fn list_for_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<Lesson>, ApiError> {
    let lessons = sqlx::query_as::<_, Lesson>(
        r#"
            SELECT * FROM lessons
            WHERE course_id = $1
            ORDER BY "position"
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(lessons)
}

pub async fn get_lesson(pool: &PgPool, id: Uuid) -> Result<Option<Lesson>, ApiError> {
    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
            SELECT * FROM lessons
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(lesson)
}

pub async fn update_lesson(
    pool: &PgPool,
    id: Uuid,
    changes: &UpdateLesson,
) -> Result<Lesson, ApiError> {
    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
            UPDATE lessons
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                video_url = COALESCE($4, video_url),
                "position" = COALESCE($5, "position")
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(changes.title.as_deref())
    .bind(changes.content.as_deref())
    .bind(changes.video_url.as_deref())
    .bind(changes.position)
    .fetch_one(pool)
    .await?;

    Ok(lesson)
}

pub async fn delete_lesson(pool: &PgPool, id: Uuid) -> Result<bool, ApiError> {
    let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
