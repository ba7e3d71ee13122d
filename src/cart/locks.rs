use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per customer. Cart mutations hold the guard for their whole
/// read-modify-write sequence. Entries nobody holds or waits on are dropped on
/// release, so the table only tracks customers with a cart call in flight.
#[derive(Default)]
pub struct CustomerLocks {
    locks: DashMap<i32, Arc<Mutex<()>>>,
}

impl CustomerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, customer_id: i32) -> CustomerGuard<'_> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = self
            .locks
            .entry(customer_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        CustomerGuard {
            guard: Some(lock.lock_owned().await),
            locks: &self.locks,
            customer_id,
        }
    }

    /// Number of customers with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

pub struct CustomerGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<i32, Arc<Mutex<()>>>,
    customer_id: i32,
}

impl Drop for CustomerGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters and new acquirers clone the Arc under the shard lock, so a
        // count of one means the table holds the only reference.
        self.locks
            .remove_if(&self.customer_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::CustomerLocks;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn same_customer_is_serialized() {
        let locks = Arc::new(CustomerLocks::new());
        let guard = locks.acquire(7).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(7).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("lock released")
            .expect("task ran");
    }

    #[tokio::test]
    async fn different_customers_do_not_block() {
        let locks = CustomerLocks::new();
        let _first = locks.acquire(1).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_evicted() {
        let locks = CustomerLocks::new();
        for customer_id in 0..100 {
            let _guard = locks.acquire(customer_id).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn entry_survives_while_someone_waits() {
        let locks = Arc::new(CustomerLocks::new());
        let guard = locks.acquire(3).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(3).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(locks.len(), 1);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("lock released")
            .expect("task ran");
        assert!(locks.is_empty());
    }
}
