//! Counter cache held entirely inside this process.

use std::sync::{Mutex, MutexGuard};

use crate::domain::ports::{CounterBacking, CounterCache, CounterCacheError};
use crate::domain::{CounterSnapshot, CounterTable, FeedbackType, Meal};

/// Lock-protected counter table.
///
/// Every operation holds the same mutex for a constant number of slot
/// reads and writes.
#[derive(Debug, Default)]
pub struct InProcessCounterCache {
    table: Mutex<CounterTable>,
}

impl InProcessCounterCache {
    /// An all-zero cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, CounterTable>, CounterCacheError> {
        self.table
            .lock()
            .map_err(|_| CounterCacheError::unavailable("counter table lock poisoned"))
    }
}

impl CounterCache for InProcessCounterCache {
    fn backing(&self) -> CounterBacking {
        CounterBacking::InProcess
    }

    fn apply_delta(
        &self,
        meal: Meal,
        feedback_type: FeedbackType,
        delta: i32,
    ) -> Result<i32, CounterCacheError> {
        Ok(self.table()?.apply(meal, feedback_type, delta))
    }

    fn snapshot(&self) -> Result<CounterSnapshot, CounterCacheError> {
        let table = *self.table()?;
        Ok(table.to_snapshot())
    }

    fn replace(&self, table: &CounterTable) -> Result<(), CounterCacheError> {
        *self.table()? = *table;
        Ok(())
    }

    fn shutdown(&self) -> Result<(), CounterCacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn starts_empty() {
        let cache = InProcessCounterCache::new();
        assert_eq!(cache.snapshot().expect("snapshot"), CounterSnapshot::default());
        assert_eq!(cache.backing(), CounterBacking::InProcess);
    }

    #[rstest]
    fn replace_overwrites_every_slot() {
        let cache = InProcessCounterCache::new();
        cache
            .apply_delta(Meal::Breakfast, FeedbackType::Good, 5)
            .expect("apply");
        let mut table = CounterTable::zeroed();
        table.set(Meal::Dinner, FeedbackType::Poor, 2);
        cache.replace(&table).expect("replace");

        let snapshot = cache.snapshot().expect("snapshot");
        assert_eq!(snapshot.get(Meal::Breakfast, FeedbackType::Good), 0);
        assert_eq!(snapshot.get(Meal::Dinner, FeedbackType::Poor), 2);
    }

    #[rstest]
    fn concurrent_deltas_are_not_lost() {
        let cache = Arc::new(InProcessCounterCache::new());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..250 {
                        cache
                            .apply_delta(Meal::Lunch, FeedbackType::Average, 1)
                            .expect("apply");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker finished");
        }

        let snapshot = cache.snapshot().expect("snapshot");
        assert_eq!(snapshot.get(Meal::Lunch, FeedbackType::Average), 2000);
    }

    #[rstest]
    fn drifted_slots_read_as_zero() {
        let cache = InProcessCounterCache::new();
        cache
            .apply_delta(Meal::Overall, FeedbackType::Good, -1)
            .expect("apply");
        let snapshot = cache.snapshot().expect("snapshot");
        assert_eq!(snapshot.get(Meal::Overall, FeedbackType::Good), 0);
    }
}
