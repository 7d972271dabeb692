//! Write operations for the vantage point store.
//!
//! All writes from a reconciliation pass go through one transaction:
//! either every computed insert/update lands or none do. A dropped
//! transaction rolls back, so any error on the way out leaves the table
//! as it was.

use vpsync_core::{VantagePoint, VpAction};

use crate::client::{StoreClient, StoreError};

const INSERT_VP: &str = "\
INSERT INTO vantage_point
    (ip, hostname, site, `timestamp`, record_route, can_spoof,
     receive_spoof, port, last_health_check, last_updated)
VALUES
    (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_VP_IP: &str = "\
UPDATE
    vantage_point
SET
    ip = ?
WHERE
    hostname = ?";

impl StoreClient {
    /// Apply a batch of merge actions as a single unit of work.
    pub async fn apply_actions(&self, actions: &[VpAction]) -> Result<(), StoreError> {
        if actions.is_empty() {
            tracing::debug!("No store actions to apply");
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for action in actions {
            match action {
                VpAction::Insert(vp) => {
                    insert_vp(&mut tx, vp).await?;
                }
                VpAction::Update { hostname, ip } => {
                    sqlx::query(UPDATE_VP_IP)
                        .bind(ip)
                        .bind(hostname)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;

        tracing::info!(actions = actions.len(), "Committed vantage point batch");
        Ok(())
    }
}

async fn insert_vp(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    vp: &VantagePoint,
) -> Result<(), StoreError> {
    sqlx::query(INSERT_VP)
        .bind(vp.ip)
        .bind(&vp.hostname)
        .bind(&vp.site)
        .bind(vp.timestamp)
        .bind(vp.record_route)
        .bind(vp.can_spoof)
        .bind(vp.receive_spoof)
        .bind(vp.port)
        .bind(&vp.last_health_check)
        .bind(vp.last_updated)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
