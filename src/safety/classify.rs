// src/safety/classify.rs
// =============================================================================
// This module sorts IP addresses into named ranges.
//
// The security rule built on top of it is allow-list-by-default: an address
// is only fetchable when it classifies as Global. Every special-purpose
// range we know about gets its own name, and anything that matches none of
// the explicit rules but is still special falls into Reserved - so a range
// we forgot to name stays blocked instead of slipping through.
//
// One classic bypass is handled up front: IPv4-mapped IPv6 addresses like
// ::ffff:10.0.0.1 are unwrapped to their embedded IPv4 form before
// classification, so the IPv4 rules apply to them too.
//
// Rust concepts:
// - Enums: One type, many named variants (the address ranges)
// - Pattern matching: Dispatch on IPv4 vs IPv6
// - Bit masking: Checking IPv6 prefixes like fe80::/10
// =============================================================================

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

// The range an IP address falls into
//
// Only Global is fetchable. Everything else either points back into the
// host or its local network (loopback, link-local, unique-local), is
// special-purpose address space (carrier-grade NAT, broadcast,
// unspecified), or is reserved/unassigned space we refuse on principle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRange {
    /// Globally routable unicast - the only fetchable range
    Global,
    /// 127.0.0.0/8 or ::1
    Loopback,
    /// 169.254.0.0/16 or fe80::/10
    LinkLocal,
    /// RFC 1918 private space or fc00::/7
    UniqueLocal,
    /// Shared address space for carrier-grade NAT (100.64.0.0/10)
    CarrierGradeNat,
    /// 255.255.255.255
    Broadcast,
    /// 0.0.0.0 or ::
    Unspecified,
    /// Everything else that is not globally routable (multicast,
    /// documentation ranges, future-use space, unparsable input, ...)
    Reserved,
}

impl AddressRange {
    /// Whether an address in this range may be fetched from the server
    pub fn is_fetchable(self) -> bool {
        matches!(self, AddressRange::Global)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AddressRange::Global => "global",
            AddressRange::Loopback => "loopback",
            AddressRange::LinkLocal => "link-local",
            AddressRange::UniqueLocal => "unique-local",
            AddressRange::CarrierGradeNat => "carrier-grade NAT",
            AddressRange::Broadcast => "broadcast",
            AddressRange::Unspecified => "unspecified",
            AddressRange::Reserved => "reserved",
        };
        f.write_str(label)
    }
}

// Classifies a textual IP address
//
// This is a total function: it never fails. Input that doesn't parse as an
// IP address classifies as Reserved, which is never fetchable.
pub fn classify(address: &str) -> AddressRange {
    match address.trim().parse::<IpAddr>() {
        Ok(ip) => classify_ip(ip),
        Err(_) => AddressRange::Reserved,
    }
}

// Classifies an already-parsed IP address
pub fn classify_ip(ip: IpAddr) -> AddressRange {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => classify_v6(v6),
    }
}

fn classify_v4(ip: Ipv4Addr) -> AddressRange {
    let [a, b, c, _] = ip.octets();

    if ip.is_unspecified() {
        return AddressRange::Unspecified;
    }
    if ip.is_broadcast() {
        return AddressRange::Broadcast;
    }
    if ip.is_loopback() {
        return AddressRange::Loopback;
    }
    if ip.is_link_local() {
        return AddressRange::LinkLocal;
    }
    // 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
    if ip.is_private() {
        return AddressRange::UniqueLocal;
    }
    // Shared address space for carrier-grade NAT (RFC 6598)
    if a == 100 && (64..=127).contains(&b) {
        return AddressRange::CarrierGradeNat;
    }

    let special = a == 0                         // "this network" (0.0.0.0/8)
        || ip.is_multicast()                     // 224.0.0.0/4
        || a >= 240                              // future use (240.0.0.0/4)
        || ip.is_documentation()                 // TEST-NET-1/2/3
        || (a == 192 && b == 0 && c == 0)        // IETF protocol assignments (192.0.0.0/24)
        || (a == 198 && (18..=19).contains(&b)); // benchmarking (198.18.0.0/15)
    if special {
        return AddressRange::Reserved;
    }

    AddressRange::Global
}

fn classify_v6(ip: Ipv6Addr) -> AddressRange {
    // Unwrap IPv4-mapped IPv6 (::ffff:a.b.c.d) first so the embedded IPv4
    // address goes through the IPv4 rules above
    if let Some(v4) = ip.to_ipv4_mapped() {
        return classify_v4(v4);
    }

    if ip.is_unspecified() {
        return AddressRange::Unspecified;
    }
    if ip.is_loopback() {
        return AddressRange::Loopback;
    }

    let seg = ip.segments();

    // fe80::/10
    if (seg[0] & 0xffc0) == 0xfe80 {
        return AddressRange::LinkLocal;
    }
    // fc00::/7
    if (seg[0] & 0xfe00) == 0xfc00 {
        return AddressRange::UniqueLocal;
    }

    let special = ip.is_multicast()                      // ff00::/8
        || (seg[0] == 0x2001 && seg[1] == 0x0db8)        // documentation (2001:db8::/32)
        || seg[..6] == [0, 0, 0, 0, 0, 0];               // deprecated IPv4-compatible space (::/96)
    if special {
        return AddressRange::Reserved;
    }

    AddressRange::Global
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is Global the fall-through instead of a rule of its own?
//    - If we listed "bad" ranges and allowed the rest, a range we forgot
//      would be allowed by accident
//    - This way a forgotten range lands in Reserved and stays blocked
//
// 2. What do the bit masks mean?
//    - IPv6 prefixes don't align to 16-bit segment boundaries
//    - fe80::/10 means "the first 10 bits are 1111111010"
//    - (seg[0] & 0xffc0) == 0xfe80 keeps the first 10 bits and compares
//
// 3. What is to_ipv4_mapped()?
//    - IPv6 reserves ::ffff:0:0/96 for carrying IPv4 addresses
//    - to_ipv4_mapped() returns Some(ipv4) only for that exact prefix
//    - Without unwrapping, ::ffff:10.0.0.1 would not look private
// -----------------------------------------------------------------------------
