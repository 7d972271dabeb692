//! Slice membership partition.
//!
//! Independent of address resolution: a node that could not be resolved is
//! still enrolled, it just gets no store row this pass.

use crate::fetch::ResolvedNode;

/// Hostnames split by current slice membership. Every node of the snapshot
/// lands in exactly one side.
#[derive(Debug, Default)]
pub struct MembershipPartition {
    /// Already members of the target slice.
    pub members: Vec<String>,
    /// Missing from the slice; these form the enrollment request.
    pub pending: Vec<String>,
}

pub fn partition(nodes: &[ResolvedNode], slice_id: i64) -> MembershipPartition {
    let mut out = MembershipPartition::default();
    for resolved in nodes {
        if resolved.node.slice_ids.contains(&slice_id) {
            out.members.push(resolved.node.hostname.clone());
        } else {
            out.pending.push(resolved.node.hostname.clone());
        }
    }
    out
}
