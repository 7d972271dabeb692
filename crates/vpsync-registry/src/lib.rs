//! vpsync-registry: XML-RPC client for the testbed node registry.
//!
//! The registry speaks XML-RPC over HTTPS. This crate covers the four calls
//! the reconciler needs — `AuthCheck`, `GetNodes`, `GetSliceTags`,
//! `AddSliceToNodes` — and decodes their responses into typed snapshot
//! records.

pub mod client;
pub mod types;
pub mod xmlrpc;

pub use client::{RegistryClient, RegistryConfig, RegistryError};
pub use types::{RemoteNode, SliceTag};
