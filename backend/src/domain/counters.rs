//! Live feedback counters.
//!
//! [`CounterTable`] is the raw signed aggregate held by counter cache
//! backings; [`CounterSnapshot`] is the fixed-shape, non-negative view handed
//! to callers and observers. The snapshot names every meal and every rating as
//! a field, so a serialised snapshot always carries all fifteen counts.

use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use super::{FeedbackType, Meal};

/// Number of slots in a counter table.
pub const COUNTER_SLOTS: usize = Meal::ALL.len() * FeedbackType::ALL.len();

/// Signed per-(meal, rating) counts.
///
/// Slots are signed so a decrement racing a rebuild can be represented
/// without wrapping; snapshots clamp anything below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterTable {
    slots: [[i32; 3]; 5],
}

impl CounterTable {
    /// An all-zero table.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            slots: [[0; 3]; 5],
        }
    }

    /// Flat slot position for `(meal, kind)`: `meal * 3 + kind`.
    #[must_use]
    pub const fn slot_index(meal: Meal, kind: FeedbackType) -> usize {
        meal.index() * FeedbackType::ALL.len() + kind.index()
    }

    /// Current value of one slot.
    #[must_use]
    pub fn get(&self, meal: Meal, kind: FeedbackType) -> i32 {
        self.slots[meal.index()][kind.index()]
    }

    /// Overwrite one slot.
    pub fn set(&mut self, meal: Meal, kind: FeedbackType, value: i32) {
        self.slots[meal.index()][kind.index()] = value;
    }

    /// Add `delta` to one slot and return the new value.
    pub fn apply(&mut self, meal: Meal, kind: FeedbackType, delta: i32) -> i32 {
        let slot = &mut self.slots[meal.index()][kind.index()];
        *slot = slot.saturating_add(delta);
        *slot
    }

    /// Iterate every `(meal, kind, value)` in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Meal, FeedbackType, i32)> + '_ {
        Meal::ALL.into_iter().flat_map(move |meal| {
            FeedbackType::ALL
                .into_iter()
                .map(move |kind| (meal, kind, self.get(meal, kind)))
        })
    }

    /// Build the non-negative public view, clamping drifted slots to zero.
    #[must_use]
    pub fn to_snapshot(&self) -> CounterSnapshot {
        let mut snapshot = CounterSnapshot::default();
        for (meal, kind, value) in self.iter() {
            let count = u32::try_from(value).unwrap_or_else(|_| {
                warn!(%meal, feedback_type = %kind, value, "negative counter clamped to zero");
                0
            });
            snapshot.meal_mut(meal).set(kind, count);
        }
        snapshot
    }
}

/// Counts for a single meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct MealCounts {
    pub good: u32,
    pub average: u32,
    pub poor: u32,
}

impl MealCounts {
    /// Count for one rating.
    #[must_use]
    pub const fn get(&self, kind: FeedbackType) -> u32 {
        match kind {
            FeedbackType::Good => self.good,
            FeedbackType::Average => self.average,
            FeedbackType::Poor => self.poor,
        }
    }

    fn set(&mut self, kind: FeedbackType, value: u32) {
        match kind {
            FeedbackType::Good => self.good = value,
            FeedbackType::Average => self.average = value,
            FeedbackType::Poor => self.poor = value,
        }
    }
}

/// Fixed-shape mapping of meal → rating → count.
///
/// # Examples
/// ```
/// use mess_feedback::domain::{CounterSnapshot, FeedbackType, Meal};
///
/// let snapshot = CounterSnapshot::default();
/// assert_eq!(snapshot.get(Meal::Lunch, FeedbackType::Good), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CounterSnapshot {
    pub breakfast: MealCounts,
    pub lunch: MealCounts,
    pub snacks: MealCounts,
    pub dinner: MealCounts,
    pub overall: MealCounts,
}

impl CounterSnapshot {
    /// Counts for one meal.
    #[must_use]
    pub const fn meal(&self, meal: Meal) -> &MealCounts {
        match meal {
            Meal::Breakfast => &self.breakfast,
            Meal::Lunch => &self.lunch,
            Meal::Snacks => &self.snacks,
            Meal::Dinner => &self.dinner,
            Meal::Overall => &self.overall,
        }
    }

    fn meal_mut(&mut self, meal: Meal) -> &mut MealCounts {
        match meal {
            Meal::Breakfast => &mut self.breakfast,
            Meal::Lunch => &mut self.lunch,
            Meal::Snacks => &mut self.snacks,
            Meal::Dinner => &mut self.dinner,
            Meal::Overall => &mut self.overall,
        }
    }

    /// Count for one `(meal, kind)` pair.
    #[must_use]
    pub const fn get(&self, meal: Meal, kind: FeedbackType) -> u32 {
        self.meal(meal).get(kind)
    }

    /// Sum of every slot.
    #[must_use]
    pub fn total(&self) -> u64 {
        Meal::ALL
            .into_iter()
            .flat_map(|meal| FeedbackType::ALL.into_iter().map(move |kind| (meal, kind)))
            .map(|(meal, kind)| u64::from(self.get(meal, kind)))
            .sum()
    }
}
