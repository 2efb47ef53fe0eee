//! Meal categories and feedback ratings.
//!
//! Both enumerations are closed: the counter table and the shared segment
//! layout are indexed by [`Meal::index`] and [`FeedbackType::index`], so the
//! declaration order below is part of the persisted format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Feedback category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Meal {
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
    Overall,
}

impl Meal {
    /// Every meal, in slot order.
    pub const ALL: [Self; 5] = [
        Self::Breakfast,
        Self::Lunch,
        Self::Snacks,
        Self::Dinner,
        Self::Overall,
    ];

    /// Row index of this meal in the counter table.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Breakfast => 0,
            Self::Lunch => 1,
            Self::Snacks => 2,
            Self::Dinner => 3,
            Self::Overall => 4,
        }
    }

    /// Stable lowercase name used on the wire and in the ledger.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Snacks => "snacks",
            Self::Dinner => "dinner",
            Self::Overall => "overall",
        }
    }
}

/// Quality rating attached to a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Good,
    Average,
    Poor,
}

impl FeedbackType {
    /// Every rating, in slot order.
    pub const ALL: [Self; 3] = [Self::Good, Self::Average, Self::Poor];

    /// Column index of this rating in the counter table.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Good => 0,
            Self::Average => 1,
            Self::Poor => 2,
        }
    }

    /// Stable lowercase name used on the wire and in the ledger.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Average => "average",
            Self::Poor => "poor",
        }
    }
}

/// Raised when a raw string names no known meal or rating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MealParseError {
    #[error("meal must be one of breakfast, lunch, snacks, dinner, overall")]
    UnknownMeal { value: String },
    #[error("feedback type must be one of good, average, poor")]
    UnknownFeedbackType { value: String },
}

impl MealParseError {
    /// Name of the request field that carried the bad value.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::UnknownMeal { .. } => "meal",
            Self::UnknownFeedbackType { .. } => "feedbackType",
        }
    }

    /// Value that failed to parse.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::UnknownMeal { value } | Self::UnknownFeedbackType { value } => value,
        }
    }
}

impl FromStr for Meal {
    type Err = MealParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|meal| meal.as_str() == s)
            .ok_or_else(|| MealParseError::UnknownMeal {
                value: s.to_owned(),
            })
    }
}

impl FromStr for FeedbackType {
    type Err = MealParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MealParseError::UnknownFeedbackType {
                value: s.to_owned(),
            })
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
