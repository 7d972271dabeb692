//! One reconciliation pass end to end: fetch → merge → persist → enroll.

use vpsync_registry::RegistryClient;
use vpsync_store::{StoreClient, StoreConfig};

use crate::error::Result;
use crate::fetch::{self, FetchOutcome};
use crate::merge::{self, MergeSummary};
use crate::{membership, persist};

/// How a pass ended.
pub enum SyncOutcome {
    /// Credentials rejected; nothing was read from or written to the store.
    Unauthorized,
    Completed {
        summary: MergeSummary,
        /// Hosts handed to the enrollment call.
        enrolled: usize,
    },
}

/// Run a full reconciliation pass.
///
/// The store connection is opened only after the registry accepts the
/// credentials, so an unauthorized run provably touches nothing. A rerun
/// after any failure is safe: with unchanged remote data the merge
/// re-derives the same actions and the pass is idempotent per hostname.
pub async fn run_sync(
    registry: &RegistryClient,
    store_config: &StoreConfig,
    slice_id: i64,
) -> Result<SyncOutcome> {
    let snapshot = match fetch::fetch_snapshot(registry).await? {
        FetchOutcome::Unauthorized => {
            tracing::info!("Registry rejected credentials; nothing to reconcile");
            return Ok(SyncOutcome::Unauthorized);
        }
        FetchOutcome::Snapshot(nodes) => nodes,
    };

    let store = StoreClient::connect(store_config).await?;
    let plan = merge::compute_actions(&store, &snapshot).await?;
    let split = membership::partition(&snapshot, slice_id);

    persist::apply(&store, registry, slice_id, &plan, &split).await?;

    tracing::info!(
        nodes = plan.summary.total,
        inserts = plan.summary.inserts,
        updates = plan.summary.updates,
        skipped = plan.summary.skipped,
        enrolled = split.pending.len(),
        "Reconciliation pass complete"
    );

    Ok(SyncOutcome::Completed {
        summary: plan.summary,
        enrolled: split.pending.len(),
    })
}
