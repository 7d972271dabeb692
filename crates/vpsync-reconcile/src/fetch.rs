//! Registry snapshot acquisition.
//!
//! Fetches the full node listing, attaches a best-effort address to every
//! node (forward DNS, then the registry's address tag on top), and hands
//! the merged snapshot to the merger. The address tag always wins over
//! DNS — it exists precisely for hosts whose public name resolves to the
//! wrong interface.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use vpsync_registry::{RegistryClient, RemoteNode, SliceTag};

use crate::error::Result;
use crate::resolver;

/// Registry tag carrying the authoritative per-node address list.
pub const ADDRESS_TAG: &str = "ip_addresses";

/// A registry node with its merged best-effort address.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub node: RemoteNode,
    /// Tag override if present, else the DNS answer, else `None`.
    pub addr: Option<Ipv4Addr>,
}

/// Outcome of the snapshot fetch.
pub enum FetchOutcome {
    /// The registry rejected the configured credentials. Not an error:
    /// the pass ends cleanly without touching anything.
    Unauthorized,
    Snapshot(Vec<ResolvedNode>),
}

/// Fetch the registry snapshot: auth check, node listing, per-node DNS,
/// one batch tag call, override merge.
pub async fn fetch_snapshot(registry: &RegistryClient) -> Result<FetchOutcome> {
    if !registry.auth_check().await? {
        return Ok(FetchOutcome::Unauthorized);
    }

    let nodes = registry.get_nodes().await?;
    tracing::info!(nodes = nodes.len(), "Fetched registry node listing");

    let node_ids: Vec<i64> = nodes.iter().map(|n| n.node_id).collect();

    // Keyed by registry id so the tag merge can find any node in O(1).
    let mut by_id: HashMap<i64, ResolvedNode> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        let addr = resolver::resolve_ipv4(&node.hostname).await;
        by_id.insert(node.node_id, ResolvedNode { node, addr });
    }

    let tags = registry.get_slice_tags(&node_ids, ADDRESS_TAG).await?;
    apply_tag_overrides(&mut by_id, &tags);

    Ok(FetchOutcome::Snapshot(by_id.into_values().collect()))
}

/// Overlay address tags onto the resolved nodes.
///
/// The first comma-separated entry of each tag replaces whatever DNS
/// produced, including a successful answer. A value that does not parse as
/// IPv4 leaves the node unresolved for this pass: the tag is authoritative,
/// so falling back to DNS would contradict its precedence.
pub fn apply_tag_overrides(nodes: &mut HashMap<i64, ResolvedNode>, tags: &[SliceTag]) {
    for tag in tags {
        let Some(entry) = nodes.get_mut(&tag.node_id) else {
            tracing::warn!(node_id = tag.node_id, "Address tag for unknown node id");
            continue;
        };
        let first = tag.value.split(',').next().unwrap_or("").trim();
        match first.parse::<Ipv4Addr>() {
            Ok(addr) => entry.addr = Some(addr),
            Err(_) => {
                tracing::warn!(
                    node_id = tag.node_id,
                    hostname = %entry.node.hostname,
                    value = %tag.value,
                    "Malformed address tag; node unresolved this pass"
                );
                entry.addr = None;
            }
        }
    }
}
