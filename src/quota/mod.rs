use async_trait::async_trait;
use uuid::Uuid;

use crate::{errors::Result, models::PlanTier};

pub mod memory;
pub mod postgres;

/// Per-plan storage ceilings in bytes.
#[derive(Debug, Clone, Copy)]
pub struct PlanLimits {
    pub free: i64,
    pub pro: i64,
    pub business: i64,
}

impl PlanLimits {
    pub fn limit_for(&self, plan: PlanTier) -> i64 {
        match plan {
            PlanTier::Free => self.free,
            PlanTier::Pro => self.pro,
            PlanTier::Business => self.business,
        }
    }
}

/// Per-user byte accounting enforcing the plan storage ceiling.
///
/// `reserve` must be atomic with respect to concurrent `reserve`/`release`
/// calls for the same user: two in-flight uploads may not both pass the limit
/// check against the same pre-update value. Serialization across different
/// users is not required.
#[async_trait]
pub trait QuotaLedger: Send + Sync {
    /// Atomically checks `used + amount <= limit` and increments on success.
    /// Returns false, with no change, when the ceiling would be exceeded.
    async fn reserve(&self, user_id: Uuid, amount: i64) -> Result<bool>;

    /// Decrements the user's accounted bytes, floored at zero. A clamp is
    /// logged as accounting drift rather than silently absorbed.
    async fn release(&self, user_id: Uuid, amount: i64) -> Result<()>;

    /// Currently accounted bytes for the user.
    async fn used(&self, user_id: Uuid) -> Result<i64>;
}
