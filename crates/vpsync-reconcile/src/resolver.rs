//! Forward DNS resolution through the system resolver.

use std::net::{IpAddr, Ipv4Addr};

/// Resolve a hostname to its first IPv4 address.
///
/// Single attempt per call; every failure mode (unknown host, transport
/// error, v6-only answer) maps to `None`, which callers treat as "skip
/// persistence for this node" — the node is reconsidered on the next run.
pub async fn resolve_ipv4(hostname: &str) -> Option<Ipv4Addr> {
    // lookup_host wants a port; 0 is fine for a pure name lookup.
    let query = format!("{hostname}:0");
    let result = match tokio::net::lookup_host(&query).await {
        Ok(addrs) => {
            let found = addrs
                .filter_map(|sockaddr| match sockaddr.ip() {
                    IpAddr::V4(v4) => Some(v4),
                    IpAddr::V6(_) => None,
                })
                .next();
            if found.is_none() {
                tracing::debug!(hostname, "No IPv4 answer for host");
            }
            found
        }
        Err(e) => {
            tracing::debug!(hostname, error = %e, "DNS resolution failed");
            None
        }
    };
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_localhost() {
        let addr = resolve_ipv4("localhost").await;
        assert_eq!(addr, Some(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_none() {
        // Reserved TLD, never resolves.
        assert_eq!(resolve_ipv4("unreachable.host.invalid").await, None);
    }
}
