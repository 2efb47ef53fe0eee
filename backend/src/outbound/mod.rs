//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL ledger and user store using Diesel ORM
//! - **memory**: process-local ledger and user store for database-less runs
//! - **counters**: shared-segment and in-process counter cache backings
//! - **broadcast**: Tokio broadcast hub fanning updates out to observers
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations.

pub mod broadcast;
pub mod counters;
pub mod memory;
pub mod persistence;
