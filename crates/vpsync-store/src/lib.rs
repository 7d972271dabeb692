//! vpsync-store: MySQL client for the vantage point store.
//!
//! The single write path into the `vantage_point` table. Lookups match on
//! hostname (the natural key); writes go through one transaction per batch
//! so a failed run leaves the table untouched. `schema.sql` in this crate
//! documents the expected table.

pub mod client;
pub mod mutations;
pub mod queries;

pub use client::{StoreClient, StoreConfig, StoreError};
