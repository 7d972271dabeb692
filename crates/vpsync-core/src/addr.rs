//! IPv4 address packing.
//!
//! The controller database keys vantage points by their IPv4 address packed
//! into an unsigned 32-bit integer, big-endian: "10.0.0.1" ↔ 0x0A000001.
//! Both directions are deterministic, so the same dotted quad always lands
//! on the same row.

use std::net::Ipv4Addr;

/// Pack a dotted-quad address into its big-endian integer form.
pub fn pack(addr: Ipv4Addr) -> u32 {
    u32::from(addr)
}

/// Unpack an integer back into the dotted-quad address it was packed from.
pub fn unpack(packed: u32) -> Ipv4Addr {
    Ipv4Addr::from(packed)
}
