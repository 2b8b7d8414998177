use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// `created` is the only non-terminal state; the rest are absorbing.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Created)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount_cents: i32,
    pub currency: String,
    pub status: PaymentStatus,
    pub external_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Persisted in `created` state before the gateway is called, so that an
/// asynchronous confirmation can be correlated back to this row.
pub async fn create_payment(
    pool: &PgPool,
    user_id: Uuid,
    course_id: Uuid,
    amount_cents: i32,
    currency: &str,
) -> Result<Payment, ApiError> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
            INSERT INTO payments (user_id, course_id, amount_cents, currency, status)
            VALUES ($1, $2, $3, $4, 'created')
            RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(amount_cents)
    .bind(currency)
    .fetch_one(pool)
    .await?;

    Ok(payment)
}

pub async fn set_external_ref(
    pool: &PgPool,
    id: Uuid,
    external_ref: &str,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
            UPDATE payments SET external_ref = $2
            WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(external_ref)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_by_external_ref(
    pool: &PgPool,
    external_ref: &str,
) -> Result<Option<Payment>, ApiError> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
            SELECT * FROM payments
            WHERE external_ref = $1
        "#,
    )
    .bind(external_ref)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// Compare-and-set out of `created`. Returns false when the row was already
/// in a terminal state, which serializes concurrent confirmations of the same
/// payment without any in-process lock.
pub async fn transition_from_created(
    pool: &PgPool,
    id: Uuid,
    to: PaymentStatus,
) -> Result<bool, ApiError> {
    let result = sqlx::query(
        r#"
            UPDATE payments SET status = $2
            WHERE id = $1 AND status = 'created'
        "#,
    )
    .bind(id)
    .bind(to)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_created_is_non_terminal() {
        assert!(!PaymentStatus::Created.is_terminal());
        assert!(PaymentStatus::Succeeded.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::Refunded.is_terminal());
    }
}
