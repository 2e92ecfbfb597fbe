use std::net::{Ipv4Addr, Ipv6Addr};

/// Network address of `addr` under an IPv4 prefix. Prefix 0 yields 0.0.0.0;
/// prefixes above 32 leave the address untouched.
pub fn ip4_network(addr: Ipv4Addr, prefix: u8) -> Ipv4Addr {
    if prefix == 0 {
        return Ipv4Addr::UNSPECIFIED;
    }
    if prefix >= 32 {
        return addr;
    }
    let mask = !0u32 << (32 - prefix);
    Ipv4Addr::from(u32::from(addr) & mask)
}

/// Network address of `addr` under an IPv6 prefix.
pub fn ip6_network(addr: Ipv6Addr, prefix: u8) -> Ipv6Addr {
    if prefix == 0 {
        return Ipv6Addr::UNSPECIFIED;
    }
    if prefix >= 128 {
        return addr;
    }
    let mask = !0u128 << (128 - prefix);
    Ipv6Addr::from(u128::from(addr) & mask)
}
