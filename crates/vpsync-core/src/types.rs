//! Core domain types for the vantage point reconciler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A measurement vantage point as stored in the controller database.
///
/// One row of the `vantage_point` table. The packed IPv4 address is the
/// primary key; `hostname` is the natural key the reconciler matches
/// registry nodes against, so the address of an existing row may be
/// corrected when a host re-resolves somewhere new.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VantagePoint {
    /// Packed IPv4 address (primary key).
    pub ip: u32,
    /// Packed address of the controller this VP is connected to, if any.
    pub controller: Option<u32>,
    pub hostname: String,
    pub site: String,
    /// Supports the IP timestamp option.
    pub timestamp: bool,
    /// Supports record route probes.
    pub record_route: bool,
    /// Can send spoofed probes.
    pub can_spoof: bool,
    /// Can receive probes spoofed by other VPs.
    pub receive_spoof: bool,
    /// Measurement service port on the node itself.
    pub port: u16,
    pub last_health_check: String,
    pub last_updated: DateTime<Utc>,
    pub spoof_checked: Option<DateTime<Utc>>,
}

impl VantagePoint {
    /// A fresh vantage point for a newly sighted host, every field beyond
    /// the identity triple at its declared default.
    pub fn new(ip: u32, hostname: impl Into<String>, port: u16, now: DateTime<Utc>) -> Self {
        Self {
            ip,
            controller: None,
            hostname: hostname.into(),
            site: String::new(),
            timestamp: false,
            record_route: false,
            can_spoof: false,
            receive_spoof: false,
            port,
            last_health_check: String::new(),
            last_updated: now,
            spoof_checked: None,
        }
    }
}

/// A database action computed by the merger for one registry node.
///
/// Matching a node against the store yields exactly one of: a new row, an
/// address correction to an existing row, or nothing. Nodes without a usable
/// address produce no action at all and are reconsidered on the next run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VpAction {
    /// No row matched the hostname: create one.
    Insert(VantagePoint),
    /// A row matched the hostname: refresh only its address.
    Update { hostname: String, ip: u32 },
}
