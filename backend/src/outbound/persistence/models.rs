//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{feedback, feedback_history, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub college_id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Insertable struct for first-login account creation.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub college_id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub role: &'a str,
}

/// Insertable struct for a first submission; timestamps use column defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feedback)]
pub(crate) struct NewFeedbackRow<'a> {
    pub user_id: Uuid,
    pub meal: &'a str,
    pub feedback_type: &'a str,
}

/// One joined row of the feedback listing.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct FeedbackListingRow {
    pub name: String,
    pub college_id: String,
    pub email: String,
    pub meal: String,
    pub feedback_type: String,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for audit rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feedback_history)]
pub(crate) struct NewHistoryRow<'a> {
    pub user_id: Uuid,
    pub meal: &'a str,
    pub feedback_type: &'a str,
    pub action: &'a str,
    pub recorded_at: DateTime<Utc>,
}
