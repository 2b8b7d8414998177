use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Quiz {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub passing_score: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub text: String,
    pub correct_option_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuizOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
}

pub async fn create_quiz(
    pool: &PgPool,
    course_id: Uuid,
    title: &str,
    passing_score: i32,
) -> Result<Quiz, ApiError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
            INSERT INTO quizzes (course_id, title, passing_score)
            VALUES ($1, $2, $3)
            RETURNING *
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(passing_score)
    .fetch_one(pool)
    .await?;

    Ok(quiz)
}

pub async fn list_for_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<Quiz>, ApiError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
            SELECT * FROM quizzes
            WHERE course_id = $1
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(quizzes)
}

pub async fn get_quiz(pool: &PgPool, id: Uuid) -> Result<Option<Quiz>, ApiError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
            SELECT * FROM quizzes
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(quiz)
}

pub async fn load_questions(pool: &PgPool, quiz_id: Uuid) -> Result<Vec<Question>, ApiError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
            SELECT * FROM questions
            WHERE quiz_id = $1
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

pub async fn load_options(pool: &PgPool, quiz_id: Uuid) -> Result<Vec<QuizOption>, ApiError> {
    let options = sqlx::query_as::<_, QuizOption>(
        r#"
            SELECT o.* FROM quiz_options o
            JOIN questions q ON o.question_id = q.id
            WHERE q.quiz_id = $1
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(options)
}

/// Out-of-range indices are clamped, not rejected.
pub fn clamp_correct_index(correct_index: i64, option_count: usize) -> usize {
    if option_count == 0 {
        return 0;
    }
    correct_index.clamp(0, option_count as i64 - 1) as usize
}

/// Creates a question and its options atomically, then points the question at
/// the option selected by the clamped index. With no options the correct
/// reference stays unset.
pub async fn create_question_with_options(
    pool: &PgPool,
    quiz_id: Uuid,
    text: &str,
    options: &[String],
    correct_index: i64,
) -> Result<Question, ApiError> {
    let mut tx = pool.begin().await?;

    let mut question = sqlx::query_as::<_, Question>(
        r#"
            INSERT INTO questions (quiz_id, text)
            VALUES ($1, $2)
            RETURNING *
        "#,
    )
    .bind(quiz_id)
    .bind(text)
    .fetch_one(&mut *tx)
    .await?;

    let mut option_ids = Vec::with_capacity(options.len());
    for option_text in options {
        let option_id = sqlx::query_scalar::<_, Uuid>(
            r#"
                INSERT INTO quiz_options (question_id, text)
                VALUES ($1, $2)
                RETURNING id
            "#,
        )
        .bind(question.id)
        .bind(option_text)
        .fetch_one(&mut *tx)
        .await?;
        option_ids.push(option_id);
    }

    if !option_ids.is_empty() {
        let correct_id = option_ids[clamp_correct_index(correct_index, option_ids.len())];
        sqlx::query(
            r#"
                UPDATE questions SET correct_option_id = $2
                WHERE id = $1
            "#,
        )
        .bind(question.id)
        .bind(correct_id)
        .execute(&mut *tx)
        .await?;
        question.correct_option_id = Some(correct_id);
    }

    tx.commit().await?;

    Ok(question)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_index_is_kept() {
        assert_eq!(clamp_correct_index(0, 3), 0);
        assert_eq!(clamp_correct_index(2, 3), 2);
    }

    #[test]
    fn out_of_range_index_clamps_to_last_option() {
        assert_eq!(clamp_correct_index(99, 2), 1);
    }

    #[test]
    fn negative_index_clamps_to_first_option() {
        assert_eq!(clamp_correct_index(-5, 4), 0);
    }

    #[test]
    fn zero_options_yield_index_zero() {
        assert_eq!(clamp_correct_index(3, 0), 0);
    }
}
