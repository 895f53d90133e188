//! In-memory quota ledger for tests and single-process setups.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::PlanTier,
    quota::{PlanLimits, QuotaLedger},
};

#[derive(Debug)]
struct Account {
    plan: PlanTier,
    used: i64,
}

/// Quota ledger holding accounts behind a Tokio mutex. The lock spans the
/// whole check-and-increment, which gives `reserve` its required atomicity.
#[derive(Debug, Clone)]
pub struct MemoryQuotaLedger {
    limits: PlanLimits,
    accounts: Arc<Mutex<HashMap<Uuid, Account>>>,
}

impl MemoryQuotaLedger {
    pub fn new(limits: PlanLimits) -> Self {
        Self {
            limits,
            accounts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers a user account with its plan tier and zero usage.
    pub async fn register(&self, user_id: Uuid, plan: PlanTier) {
        self.accounts
            .lock()
            .await
            .insert(user_id, Account { plan, used: 0 });
    }
}

#[async_trait]
impl QuotaLedger for MemoryQuotaLedger {
    async fn reserve(&self, user_id: Uuid, amount: i64) -> Result<bool> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.get_mut(&user_id).ok_or(AppError::NotFound)?;

        let limit = self.limits.limit_for(account.plan);
        if account.used + amount > limit {
            return Ok(false);
        }

        account.used += amount;
        Ok(true)
    }

    async fn release(&self, user_id: Uuid, amount: i64) -> Result<()> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.get_mut(&user_id).ok_or(AppError::NotFound)?;

        if account.used < amount {
            warn!(
                user_id = %user_id,
                released = amount,
                accounted = account.used,
                "Quota release clamped at zero, accounting drift"
            );
            account.used = 0;
        } else {
            account.used -= amount;
        }

        Ok(())
    }

    async fn used(&self, user_id: Uuid) -> Result<i64> {
        let accounts = self.accounts.lock().await;
        accounts
            .get(&user_id)
            .map(|account| account.used)
            .ok_or(AppError::NotFound)
    }
}
