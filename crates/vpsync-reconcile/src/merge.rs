//! Identity merge: match registry nodes against stored vantage points and
//! compute the store actions for this pass.
//!
//! Matching is by exact hostname equality, never by address — a host that
//! re-resolved somewhere new keeps its row and gets its address corrected.
//! Nodes without a usable address produce no action at all.

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use vpsync_core::{addr, VantagePoint, VpAction};
use vpsync_store::StoreClient;

use crate::error::Result;
use crate::fetch::ResolvedNode;

/// Measurement service port for a newly created vantage point. M-Lab hosts
/// run the measurement service on 806; everything else is reached over ssh.
/// Applied at creation only, never on update.
pub fn default_port(hostname: &str) -> u16 {
    if hostname.contains("mlab") {
        806
    } else {
        22
    }
}

/// The store changes one pass intends to make.
pub struct MergePlan {
    pub actions: Vec<VpAction>,
    pub summary: MergeSummary,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub total: usize,
    pub inserts: usize,
    pub updates: usize,
    /// Nodes skipped for lack of a usable address.
    pub skipped: usize,
}

/// Decide the store action for one node.
pub fn decide_action(
    existing: Option<&VantagePoint>,
    hostname: &str,
    address: Option<Ipv4Addr>,
    now: DateTime<Utc>,
) -> Option<VpAction> {
    let ip = addr::pack(address?);
    match existing {
        Some(_) => Some(VpAction::Update {
            hostname: hostname.to_string(),
            ip,
        }),
        None => Some(VpAction::Insert(VantagePoint::new(
            ip,
            hostname,
            default_port(hostname),
            now,
        ))),
    }
}

/// Compute the merge plan for a snapshot.
///
/// Each hostname is looked up in the store; a hostname matching more than
/// one row aborts the whole run (`StoreError::DuplicateHostname`) before
/// anything is written.
pub async fn compute_actions(store: &StoreClient, nodes: &[ResolvedNode]) -> Result<MergePlan> {
    let now = Utc::now();
    let mut actions = Vec::new();
    let mut summary = MergeSummary {
        total: nodes.len(),
        ..Default::default()
    };

    for resolved in nodes {
        let hostname = &resolved.node.hostname;
        let existing = store.find_by_hostname(hostname).await?;
        match decide_action(existing.as_ref(), hostname, resolved.addr, now) {
            Some(action) => {
                match action {
                    VpAction::Insert(_) => summary.inserts += 1,
                    VpAction::Update { .. } => summary.updates += 1,
                }
                actions.push(action);
            }
            None => {
                summary.skipped += 1;
                tracing::debug!(hostname = %hostname, "No usable address; row left untouched");
            }
        }
    }

    Ok(MergePlan { actions, summary })
}
