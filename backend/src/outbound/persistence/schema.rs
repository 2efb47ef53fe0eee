//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, regenerate with `diesel print-schema` or
//! update by hand.

diesel::table! {
    /// Accounts, unique by college id and by email.
    users (id) {
        id -> Uuid,
        college_id -> Varchar,
        email -> Varchar,
        name -> Varchar,
        /// `student` or `admin`.
        role -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Current rating per `(user_id, meal)`; the ledger of truth.
    feedback (id) {
        id -> Int8,
        user_id -> Uuid,
        meal -> Varchar,
        feedback_type -> Varchar,
        submitted_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit log of submissions.
    feedback_history (id) {
        id -> Int8,
        user_id -> Uuid,
        meal -> Varchar,
        feedback_type -> Varchar,
        /// `submitted` or `updated`.
        action -> Varchar,
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(feedback -> users (user_id));
diesel::joinable!(feedback_history -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, feedback, feedback_history);
