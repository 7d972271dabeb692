//! Read operations for the vantage point store.

use sqlx::mysql::MySqlRow;
use sqlx::Row;
use vpsync_core::VantagePoint;

use crate::client::{StoreClient, StoreError};

const SELECT_BY_HOSTNAME: &str = "\
SELECT
    ip, controller, hostname, site, `timestamp`,
    record_route, can_spoof, receive_spoof,
    port, last_health_check, last_updated, spoof_checked
FROM
    vantage_point
WHERE
    hostname = ?";

impl StoreClient {
    /// Look up the vantage point with the given hostname.
    ///
    /// Hostname is assumed unique (the schema enforces it); if the store
    /// disagrees this fails with [`StoreError::DuplicateHostname`] instead
    /// of silently picking a row, since an update against the wrong row
    /// would repoint a different vantage point.
    pub async fn find_by_hostname(
        &self,
        hostname: &str,
    ) -> Result<Option<VantagePoint>, StoreError> {
        let rows = sqlx::query(SELECT_BY_HOSTNAME)
            .bind(hostname)
            .fetch_all(&self.pool)
            .await?;

        match rows.as_slice() {
            [] => Ok(None),
            [row] => Ok(Some(vp_from_row(row)?)),
            rows => Err(StoreError::DuplicateHostname {
                hostname: hostname.to_string(),
                count: rows.len(),
            }),
        }
    }
}

fn vp_from_row(row: &MySqlRow) -> Result<VantagePoint, StoreError> {
    Ok(VantagePoint {
        ip: row.try_get("ip")?,
        controller: row.try_get("controller")?,
        hostname: row.try_get("hostname")?,
        site: row.try_get("site")?,
        timestamp: row.try_get("timestamp")?,
        record_route: row.try_get("record_route")?,
        can_spoof: row.try_get("can_spoof")?,
        receive_spoof: row.try_get("receive_spoof")?,
        port: row.try_get("port")?,
        last_health_check: row.try_get("last_health_check")?,
        last_updated: row.try_get("last_updated")?,
        spoof_checked: row.try_get("spoof_checked")?,
    })
}
