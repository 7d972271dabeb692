//! vpsync-core: Shared types for the vantage point reconciler.
//!
//! This crate provides the types used across the vpsync components:
//! - The `VantagePoint` row of the controller database
//! - `VpAction`, the merger's insert/update decision
//! - IPv4 address packing between dotted-quad and `u32` form

pub mod addr;
pub mod types;

pub use types::{VantagePoint, VpAction};
