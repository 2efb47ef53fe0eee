//! Port abstraction for the live counter aggregate.
//!
//! Every operation is atomic with respect to the others: a snapshot never
//! observes a half-applied delta or a half-replaced table. Implementations
//! keep their critical sections free of network and database I/O.

use std::fmt;

use crate::domain::{CounterSnapshot, CounterTable, FeedbackType, Meal};

use super::define_port_error;

define_port_error! {
    /// Errors raised by counter cache backings.
    pub enum CounterCacheError {
        /// The backing could not be read or written.
        Unavailable { message: String } => "counter cache unavailable: {message}",
        /// The shared segment failed header validation.
        InvalidSegment { message: String } => "counter segment invalid: {message}",
    }
}

/// Storage strategy selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterBacking {
    InProcess,
    SharedSegment,
}

impl fmt::Display for CounterBacking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InProcess => "in_process",
            Self::SharedSegment => "shared_segment",
        })
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait CounterCache: Send + Sync {
    /// Which backing serves this cache.
    fn backing(&self) -> CounterBacking;

    /// Add `delta` to one slot, returning the new raw value.
    fn apply_delta(
        &self,
        meal: Meal,
        feedback_type: FeedbackType,
        delta: i32,
    ) -> Result<i32, CounterCacheError>;

    /// Consistent, clamped copy of every slot.
    fn snapshot(&self) -> Result<CounterSnapshot, CounterCacheError>;

    /// Overwrite every slot at once.
    fn replace(&self, table: &CounterTable) -> Result<(), CounterCacheError>;

    /// Flush and release any external resources.
    fn shutdown(&self) -> Result<(), CounterCacheError>;
}
