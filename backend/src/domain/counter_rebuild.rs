//! Recompute live counters from the feedback ledger.

use tracing::info;

use crate::domain::ports::{CounterCache, FeedbackLedger};
use crate::domain::{CounterSnapshot, Error, feedback_service::map_ledger_error};

/// Replace every counter slot with the ledger's `COUNT(*)` for that slot.
///
/// The ledger is queried before the cache is touched, so the cache lock is
/// held only for the table swap. Run this before serving any counter read.
///
/// # Errors
///
/// Returns the mapped ledger error when counting fails and
/// `service_unavailable` when the cache rejects the new table.
pub async fn rebuild_counters<L, C>(ledger: &L, cache: &C) -> Result<CounterSnapshot, Error>
where
    L: FeedbackLedger + ?Sized,
    C: CounterCache + ?Sized,
{
    let table = ledger.count_feedback().await.map_err(map_ledger_error)?;
    cache.replace(&table).map_err(|err| {
        Error::service_unavailable(format!("failed to rebuild counters: {err}"))
    })?;
    let snapshot = table.to_snapshot();
    info!(
        backing = %cache.backing(),
        total = snapshot.total(),
        "counters rebuilt from ledger"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        CounterBacking, CounterCacheError, FeedbackLedgerError, MockCounterCache,
        MockFeedbackLedger,
    };
    use crate::domain::{CounterTable, ErrorCode, FeedbackType, Meal};
    use mockall::predicate::eq;

    fn ledger_counts() -> CounterTable {
        let mut table = CounterTable::zeroed();
        table.set(Meal::Lunch, FeedbackType::Good, 7);
        table.set(Meal::Overall, FeedbackType::Poor, 2);
        table
    }

    #[tokio::test]
    async fn replaces_cache_with_ledger_counts() {
        let mut ledger = MockFeedbackLedger::new();
        ledger
            .expect_count_feedback()
            .times(1)
            .returning(|| Ok(ledger_counts()));
        let mut cache = MockCounterCache::new();
        cache
            .expect_replace()
            .with(eq(ledger_counts()))
            .times(1)
            .returning(|_| Ok(()));
        cache
            .expect_backing()
            .return_const(CounterBacking::InProcess);

        let snapshot = rebuild_counters(&ledger, &cache).await.expect("rebuild");
        assert_eq!(snapshot.get(Meal::Lunch, FeedbackType::Good), 7);
        assert_eq!(snapshot.total(), 9);
    }

    #[tokio::test]
    async fn ledger_failure_leaves_cache_untouched() {
        let mut ledger = MockFeedbackLedger::new();
        ledger
            .expect_count_feedback()
            .returning(|| Err(FeedbackLedgerError::unavailable("pool timed out")));
        let mut cache = MockCounterCache::new();
        cache.expect_replace().never();

        let err = rebuild_counters(&ledger, &cache)
            .await
            .expect_err("ledger failure");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn cache_failure_is_reported() {
        let mut ledger = MockFeedbackLedger::new();
        ledger
            .expect_count_feedback()
            .returning(|| Ok(CounterTable::zeroed()));
        let mut cache = MockCounterCache::new();
        cache
            .expect_replace()
            .returning(|_| Err(CounterCacheError::unavailable("segment locked")));

        let err = rebuild_counters(&ledger, &cache)
            .await
            .expect_err("cache failure");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
