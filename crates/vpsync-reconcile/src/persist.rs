//! Persistence: apply the merge plan to the store, then enroll missing
//! nodes in the slice.
//!
//! The store write is one transaction; the enrollment call is a follow-up
//! outside that boundary and must never run if the commit failed, so nodes
//! cannot end up enrolled without a corresponding local record.

use vpsync_registry::RegistryClient;
use vpsync_store::StoreClient;

use crate::error::Result;
use crate::membership::MembershipPartition;
use crate::merge::MergePlan;

pub async fn apply(
    store: &StoreClient,
    registry: &RegistryClient,
    slice_id: i64,
    plan: &MergePlan,
    partition: &MembershipPartition,
) -> Result<()> {
    store.apply_actions(&plan.actions).await?;

    if partition.pending.is_empty() {
        tracing::debug!(slice_id, "All nodes already in the slice");
        return Ok(());
    }

    registry
        .add_slice_to_nodes(slice_id, &partition.pending)
        .await?;
    tracing::info!(
        slice_id,
        hosts = partition.pending.len(),
        "Requested slice enrollment"
    );
    Ok(())
}
