//! Counter cache backings and startup selection.
//!
//! Two interchangeable implementations of [`CounterCache`] exist: a shared
//! segment file usable by several worker processes, and a purely in-process
//! table. [`select_counter_cache`] picks one once at startup; callers only
//! ever see the trait.

mod in_process;
pub mod layout;
mod shared_segment;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::CounterCache;

pub use in_process::InProcessCounterCache;
pub use shared_segment::SharedSegmentCounterCache;

/// Startup options for counter cache selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterCacheOptions {
    /// Segment file to share counters through; `None` keeps them in-process.
    pub segment_path: Option<PathBuf>,
    /// Delete the segment on shutdown when this process created it.
    pub remove_on_shutdown: bool,
}

/// Choose the counter backing for this process.
///
/// Any failure to attach the shared segment falls back to the in-process
/// table; the fallback is logged but never fatal.
pub fn select_counter_cache(options: &CounterCacheOptions) -> Arc<dyn CounterCache> {
    let Some(path) = options.segment_path.as_ref() else {
        info!("no counter segment configured; using in-process counters");
        return Arc::new(InProcessCounterCache::new());
    };

    match SharedSegmentCounterCache::open(path, options.remove_on_shutdown) {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "shared counter segment unavailable; falling back to in-process counters"
            );
            Arc::new(InProcessCounterCache::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CounterBacking;
    use rstest::rstest;

    #[rstest]
    fn defaults_to_in_process() {
        let cache = select_counter_cache(&CounterCacheOptions::default());
        assert_eq!(cache.backing(), CounterBacking::InProcess);
    }

    #[rstest]
    fn uses_segment_when_it_opens() {
        let dir = tempfile::tempdir().expect("temp dir");
        let options = CounterCacheOptions {
            segment_path: Some(dir.path().join("counters.seg")),
            remove_on_shutdown: true,
        };
        let cache = select_counter_cache(&options);
        assert_eq!(cache.backing(), CounterBacking::SharedSegment);
        cache.shutdown().expect("shutdown");
    }

    #[rstest]
    fn falls_back_when_segment_is_invalid() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("counters.seg");
        std::fs::write(&path, b"not a counter segment").expect("write junk");
        let options = CounterCacheOptions {
            segment_path: Some(path),
            remove_on_shutdown: false,
        };
        let cache = select_counter_cache(&options);
        assert_eq!(cache.backing(), CounterBacking::InProcess);
    }
}
