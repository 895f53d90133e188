use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::PlanTier,
    quota::{PlanLimits, QuotaLedger},
};

/// Ledger backed by the `users.storage_used` column.
///
/// Reservation is a single conditional UPDATE, so the check-and-increment is
/// atomic at the row level: concurrent reservations for the same user
/// serialize on the row lock and the second one re-evaluates the limit
/// against the committed value.
#[derive(Clone)]
pub struct PgQuotaLedger {
    pool: PgPool,
    limits: PlanLimits,
}

impl PgQuotaLedger {
    pub fn new(pool: PgPool, limits: PlanLimits) -> Self {
        Self { pool, limits }
    }
}

#[async_trait]
impl QuotaLedger for PgQuotaLedger {
    async fn reserve(&self, user_id: Uuid, amount: i64) -> Result<bool> {
        let plan = sqlx::query_scalar::<_, PlanTier>("SELECT plan FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)?;

        let limit = self.limits.limit_for(plan);

        let updated = sqlx::query(
            "UPDATE users SET storage_used = storage_used + $2, updated_at = NOW() \
             WHERE id = $1 AND storage_used + $2 <= $3",
        )
        .bind(user_id)
        .bind(amount)
        .bind(limit)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn release(&self, user_id: Uuid, amount: i64) -> Result<()> {
        let prev = sqlx::query_scalar::<_, i64>(
            "WITH prev AS (SELECT storage_used FROM users WHERE id = $1 FOR UPDATE) \
             UPDATE users \
             SET storage_used = GREATEST(users.storage_used - $2, 0), updated_at = NOW() \
             FROM prev WHERE users.id = $1 \
             RETURNING prev.storage_used",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        match prev {
            Some(prev) if prev < amount => {
                warn!(
                    user_id = %user_id,
                    released = amount,
                    accounted = prev,
                    "Quota release clamped at zero, accounting drift"
                );
            }
            Some(_) => {}
            None => {
                warn!(user_id = %user_id, "Quota release for unknown user");
            }
        }

        Ok(())
    }

    async fn used(&self, user_id: Uuid) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT storage_used FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)
    }
}
