//! Per-record mutual exclusion shared by the API write paths and the
//! payment scheduler.
//!
//! Slots exist only while somebody holds or waits for them: the last
//! [`RecordGuard`] to be released removes its slot from the map, so ids that
//! never matched a record (unknown, foreign, deleted) leave nothing behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as SlotMapMutex, MutexGuard};

use tokio::sync::{Mutex, OwnedMutexGuard};

type Slots = Arc<SlotMapMutex<HashMap<String, Arc<Mutex<()>>>>>;

#[derive(Clone, Default)]
pub struct RecordLocks {
    slots: Slots,
}

/// Exclusive hold on one record, released on drop
pub struct RecordGuard {
    record_id: String,
    slots: Slots,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, record_id: &str) -> Arc<Mutex<()>> {
        lock_slots(&self.slots)
            .entry(record_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn guard(&self, record_id: &str, guard: OwnedMutexGuard<()>) -> RecordGuard {
        RecordGuard {
            record_id: record_id.to_string(),
            slots: self.slots.clone(),
            guard: Some(guard),
        }
    }

    /// Wait until the record is free
    pub async fn lock(&self, record_id: &str) -> RecordGuard {
        let guard = self.slot(record_id).lock_owned().await;
        self.guard(record_id, guard)
    }

    /// Take the record only if nobody else holds it
    pub fn try_lock(&self, record_id: &str) -> Option<RecordGuard> {
        let guard = self.slot(record_id).try_lock_owned().ok()?;
        Some(self.guard(record_id, guard))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        lock_slots(&self.slots).len()
    }
}

impl Drop for RecordGuard {
    fn drop(&mut self) {
        // Release first so the strong count only reflects other users
        drop(self.guard.take());

        let mut slots = lock_slots(&self.slots);
        let unused = slots
            .get(&self.record_id)
            .map_or(false, |slot| Arc::strong_count(slot) == 1);
        if unused {
            slots.remove(&self.record_id);
        }
    }
}

/// The map is only touched in short non-async sections; a poisoned lock
/// still holds a consistent map.
fn lock_slots(slots: &Slots) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_try_lock_fails_while_held() {
        let locks = RecordLocks::new();

        let guard = locks.lock("a1").await;
        assert!(locks.try_lock("a1").is_none());
        assert!(locks.try_lock("a2").is_some());

        drop(guard);
        assert!(locks.try_lock("a1").is_some());
    }

    #[tokio::test]
    async fn test_clones_share_locks() {
        let locks = RecordLocks::new();
        let other = locks.clone();

        let _guard = locks.lock("a1").await;
        assert!(other.try_lock("a1").is_none());
    }

    #[tokio::test]
    async fn test_released_slots_are_removed() {
        let locks = RecordLocks::new();

        for i in 0..100 {
            drop(locks.lock(&format!("ghost-{}", i)).await);
        }
        assert_eq!(locks.len(), 0);

        let held = locks.lock("a1").await;
        assert!(locks.try_lock("a1").is_none());
        assert_eq!(locks.len(), 1);

        drop(held);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_slot_survives_while_another_task_waits() {
        let locks = RecordLocks::new();
        let first = locks.lock("a1").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _second = locks.lock("a1").await;
            })
        };
        // Let the waiter queue up on the slot
        tokio::task::yield_now().await;
        while locks
            .slots
            .lock()
            .unwrap()
            .get("a1")
            .map_or(0, Arc::strong_count)
            < 2
        {
            tokio::task::yield_now().await;
        }

        drop(first);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }
}
