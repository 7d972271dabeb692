//! vpsync-reconcile: reconcile the node registry against the vantage point store.
//!
//! One pass per invocation: fetch the registry snapshot (with best-effort
//! address resolution and tag overrides), merge it against the store by
//! hostname, commit the computed changes in one transaction, then enroll
//! the nodes that are missing from the measurement slice.

pub mod config;
pub mod error;
pub mod fetch;
pub mod membership;
pub mod merge;
pub mod persist;
pub mod resolver;
pub mod sync;
