use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{errors::ApiError, schema::course::UpdateCourse};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub instructor_id: Uuid,
    pub price_cents: i32,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn create_course(
    pool: &PgPool,
    title: &str,
    description: Option<&str>,
    instructor_id: Uuid,
    price_cents: i32,
    published: bool,
) -> Result<Course, ApiError> {
    let course = sqlx::query_as::<_, Course>(
        r#"
            INSERT INTO courses (title, description, instructor_id, price_cents, published)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(instructor_id)
    .bind(price_cents)
    .bind(published)
    .fetch_one(pool)
    .await?;

    Ok(course)
}

pub async fn get_course(pool: &PgPool, id: Uuid) -> Result<Option<Course>, ApiError> {
    let course = sqlx::query_as::<_, Course>(
        r#"
            SELECT * FROM courses
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(course)
}

pub async fn list_courses(pool: &PgPool, published: Option<bool>) -> Result<Vec<Course>, ApiError> {
    let courses = sqlx::query_as::<_, Course>(
        r#"
            SELECT * FROM courses
            WHERE ($1::boolean IS NULL OR published = $1)
            ORDER BY created_at DESC
        "#,
    )
    .bind(published)
    .fetch_all(pool)
    .await?;

    Ok(courses)
}

/// Partial update; absent fields keep their stored values.
pub async fn update_course(
    pool: &PgPool,
    id: Uuid,
    changes: &UpdateCourse,
) -> Result<Course, ApiError> {
    let course = sqlx::query_as::<_, Course>(
        r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                price_cents = COALESCE($4, price_cents),
                published = COALESCE($5, published)
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id)
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.price_cents)
    .bind(changes.published)
    .fetch_one(pool)
    .await?;

    Ok(course)
}

/// Deletes a course and everything it exclusively owns in one transaction:
/// quiz options, questions, submissions, quizzes, lessons, resources and
/// enrollments. Progress and payment rows reference the course by id only
/// and survive.
pub async fn delete_course_cascade(pool: &PgPool, id: Uuid) -> Result<bool, ApiError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
            UPDATE questions SET correct_option_id = NULL
            WHERE quiz_id IN (SELECT id FROM quizzes WHERE course_id = $1)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
            DELETE FROM quiz_options
            WHERE question_id IN (
                SELECT q.id FROM questions q
                JOIN quizzes z ON q.quiz_id = z.id
                WHERE z.course_id = $1
            )
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
            DELETE FROM questions
            WHERE quiz_id IN (SELECT id FROM quizzes WHERE course_id = $1)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
            DELETE FROM submissions
            WHERE quiz_id IN (SELECT id FROM quizzes WHERE course_id = $1)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM quizzes WHERE course_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM lessons WHERE course_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM resources WHERE course_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM enrollments WHERE course_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_courses(pool: &PgPool) -> Result<i64, ApiError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
