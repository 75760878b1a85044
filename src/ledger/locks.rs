use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::engine::error::EngineError;
use crate::ledger::{LockKey, LockScope};

/// In-process exclusive locks, one per `LockKey`, created on demand.
pub struct KeyedLocks {
    slots: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
}

/// Held keys; released on drop.
pub struct ScopeGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Takes every key of `scope` in order. Gives up with `ConcurrentModification`
    /// when one key stays busy longer than the timeout.
    pub async fn acquire(&self, scope: &LockScope) -> Result<ScopeGuard, EngineError> {
        let mut guards = Vec::new();
        for key in scope.keys() {
            let slot = self.slot(key)?;
            let guard = tokio::time::timeout(self.timeout, slot.lock_owned())
                .await
                .map_err(|_| {
                    tracing::warn!(?key, "timed out waiting for ledger lock");
                    EngineError::ConcurrentModification
                })?;
            guards.push(guard);
        }
        Ok(ScopeGuard { _guards: guards })
    }

    fn slot(&self, key: &LockKey) -> Result<Arc<AsyncMutex<()>>, EngineError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| EngineError::Storage("lock table poisoned".to_string()))?;
        // drop slots nobody holds or waits on
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        Ok(slots.entry(key.clone()).or_default().clone())
    }

    #[cfg(test)]
    fn live_slots(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[actix_web::test]
    async fn busy_key_times_out_as_concurrent_modification() {
        let locks = KeyedLocks::new(Duration::from_millis(20));
        let scope = LockScope::employee(1);
        let _held = locks.acquire(&scope).await.unwrap();
        let second = locks.acquire(&scope).await;
        assert!(matches!(second, Err(EngineError::ConcurrentModification)));
    }

    #[actix_web::test]
    async fn disjoint_scopes_do_not_block() {
        let locks = KeyedLocks::new(Duration::from_millis(20));
        let _a = locks.acquire(&LockScope::employee(1)).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(locks.acquire(&LockScope::employee(2).with_date(date)).await.is_ok());
    }

    #[actix_web::test]
    async fn released_keys_are_reusable_and_pruned() {
        let locks = KeyedLocks::new(Duration::from_millis(20));
        {
            let _held = locks.acquire(&LockScope::employee(1)).await.unwrap();
        }
        let _again = locks.acquire(&LockScope::employee(1)).await.unwrap();
        let _other = locks.acquire(&LockScope::employee(2)).await.unwrap();
        assert_eq!(locks.live_slots(), 2);
    }
}
