//! Destination host policy for the relay.
//!
//! Restricted mode admits only globally routable unicast addresses. Host
//! names are screened against a small deny list and then every address they
//! resolve to must pass the same address check as an IP literal.

use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::Ipv6Addr;

use url::Host;

use crate::Error;
use crate::HostPolicyMode;
use crate::Result;

/// Cloud instance metadata endpoints.
pub const METADATA_ADDRS: &[IpAddr] = &[
    IpAddr::V4(Ipv4Addr::new(169, 254, 169, 254)),
    IpAddr::V4(Ipv4Addr::new(169, 254, 170, 2)),
    IpAddr::V4(Ipv4Addr::new(100, 100, 100, 200)),
    IpAddr::V4(Ipv4Addr::new(168, 63, 129, 16)),
    IpAddr::V6(Ipv6Addr::new(0xfd00, 0x0ec2, 0, 0, 0, 0, 0, 0x0254)),
];

/// Host names that always point at the local machine or a metadata service.
pub const BLOCKED_HOST_NAMES: &[&str] = &[
    "localhost",
    "metadata",
    "metadata.google.internal",
    "metadata.goog",
    "instance-data",
    "instance-data.ec2.internal",
];

/// Returns `true` if `ip` is a globally routable unicast address.
///
/// IPv6 addresses that embed an IPv4 address (IPv4-mapped, NAT64
/// `64:ff9b::/96`, 6to4 `2002::/16`) are judged by the embedded address.
///
/// # Examples
///
/// ```
/// use protolane_core::security::is_global_unicast;
///
/// assert!(is_global_unicast("93.184.216.34".parse().unwrap()));
/// assert!(!is_global_unicast("192.168.1.10".parse().unwrap()));
/// assert!(!is_global_unicast("::ffff:127.0.0.1".parse().unwrap()));
/// ```
#[must_use]
pub fn is_global_unicast(ip: IpAddr) -> bool {
    non_global_reason(ip).is_none()
}

/// Reason `ip` may not be contacted in restricted mode, if any.
#[must_use]
pub fn forbidden_reason(ip: IpAddr) -> Option<&'static str> {
    if is_metadata_addr(ip) {
        return Some("cloud metadata address");
    }
    non_global_reason(ip)
}

fn is_metadata_addr(ip: IpAddr) -> bool {
    let ip = embedded_ipv4(ip).map_or(ip, IpAddr::V4);
    METADATA_ADDRS.contains(&ip)
}

fn embedded_ipv4(ip: IpAddr) -> Option<Ipv4Addr> {
    let IpAddr::V6(v6) = ip else {
        return None;
    };
    if let Some(v4) = v6.to_ipv4_mapped() {
        return Some(v4);
    }
    let s = v6.segments();
    let o = v6.octets();
    if s[0] == 0x0064 && s[1] == 0xff9b && s[2..6] == [0, 0, 0, 0] {
        return Some(Ipv4Addr::new(o[12], o[13], o[14], o[15]));
    }
    if s[0] == 0x2002 {
        let [hi_a, hi_b] = s[1].to_be_bytes();
        let [lo_a, lo_b] = s[2].to_be_bytes();
        return Some(Ipv4Addr::new(hi_a, hi_b, lo_a, lo_b));
    }
    None
}

fn non_global_reason(ip: IpAddr) -> Option<&'static str> {
    if let Some(v4) = embedded_ipv4(ip) {
        return ipv4_reason(v4);
    }
    match ip {
        IpAddr::V4(v4) => ipv4_reason(v4),
        IpAddr::V6(v6) => ipv6_reason(v6),
    }
}

fn ipv4_reason(ip: Ipv4Addr) -> Option<&'static str> {
    let [a, b, c, _] = ip.octets();
    if ip.is_loopback() {
        Some("loopback address")
    } else if ip.is_private() {
        Some("private address")
    } else if ip.is_link_local() {
        Some("link-local address")
    } else if a == 0 {
        Some("unspecified address")
    } else if a == 100 && (b & 0xc0) == 64 {
        Some("shared address space")
    } else if a == 192 && b == 0 && c == 0 {
        Some("protocol assignment address")
    } else if ip.is_documentation() {
        Some("documentation address")
    } else if a == 198 && (b & 0xfe) == 18 {
        Some("benchmarking address")
    } else if ip.is_multicast() {
        Some("multicast address")
    } else if a >= 240 {
        Some("reserved address")
    } else {
        None
    }
}

fn ipv6_reason(ip: Ipv6Addr) -> Option<&'static str> {
    let s = ip.segments();
    if ip.is_unspecified() {
        Some("unspecified address")
    } else if ip.is_loopback() {
        Some("loopback address")
    } else if ip.is_multicast() {
        Some("multicast address")
    } else if (s[0] & 0xfe00) == 0xfc00 {
        Some("unique local address")
    } else if (s[0] & 0xffc0) == 0xfe80 {
        Some("link-local address")
    } else if (s[0] & 0xffc0) == 0xfec0 {
        Some("site-local address")
    } else if s[0] == 0x2001 && s[1] == 0x0db8 {
        Some("documentation address")
    } else if s[0] == 0x0100 && s[1..4] == [0, 0, 0] {
        Some("discard-only address")
    } else if s[0] == 0x2001 && s[1] < 0x0200 {
        Some("IETF protocol assignment address")
    } else if (s[0] & 0xe000) != 0x2000 {
        Some("non-global address")
    } else {
        None
    }
}

/// Reason a host name is blocked outright, if any.
#[must_use]
pub fn blocked_name_reason(name: &str) -> Option<&'static str> {
    let name = name.trim_end_matches('.').to_ascii_lowercase();
    if name == "localhost" || name.ends_with(".localhost") {
        Some("loopback host name")
    } else if BLOCKED_HOST_NAMES.contains(&name.as_str()) {
        Some("cloud metadata host name")
    } else {
        None
    }
}

/// Outcome of screening a URL host before any network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screening {
    /// The host may be contacted as is.
    Allowed,
    /// The host is a name whose addresses must be checked with
    /// [`HostPolicy::check_resolved`].
    Resolve,
}

/// Applies a [`HostPolicyMode`] to destination hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPolicy {
    mode: HostPolicyMode,
}

impl HostPolicy {
    /// Creates a policy for `mode`.
    #[must_use]
    pub const fn new(mode: HostPolicyMode) -> Self {
        Self { mode }
    }

    /// Configured mode.
    #[must_use]
    pub const fn mode(&self) -> HostPolicyMode {
        self.mode
    }

    /// Screens a URL host. IP literals are decided here; names that pass the
    /// deny list need resolution in restricted mode.
    pub fn screen(&self, host: &Host<&str>) -> Result<Screening> {
        if self.mode == HostPolicyMode::Open {
            return Ok(Screening::Allowed);
        }
        let reason = match host {
            Host::Ipv4(ip) => forbidden_reason(IpAddr::V4(*ip)),
            Host::Ipv6(ip) => forbidden_reason(IpAddr::V6(*ip)),
            Host::Domain(name) => match blocked_name_reason(name) {
                Some(reason) => Some(reason),
                None => return Ok(Screening::Resolve),
            },
        };
        match reason {
            Some(reason) => Err(forbidden(host, reason)),
            None => Ok(Screening::Allowed),
        }
    }

    /// Checks every address a host name resolved to. An empty resolution is
    /// rejected.
    pub fn check_resolved(&self, host: &str, addrs: &[IpAddr]) -> Result<()> {
        if self.mode == HostPolicyMode::Open {
            return Ok(());
        }
        if addrs.is_empty() {
            return Err(Error::ForbiddenHost {
                host: host.to_string(),
                reason: "host name resolved to no addresses".to_string(),
            });
        }
        for addr in addrs {
            if let Some(reason) = forbidden_reason(*addr) {
                return Err(Error::ForbiddenHost {
                    host: host.to_string(),
                    reason: format!("resolves to {addr}: {reason}"),
                });
            }
        }
        Ok(())
    }
}

fn forbidden(host: &Host<&str>, reason: &str) -> Error {
    Error::ForbiddenHost {
        host: host.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_ipv4_non_global() {
        for addr in [
            "0.0.0.0",
            "0.1.2.3",
            "10.0.0.1",
            "100.64.0.1",
            "100.127.255.255",
            "127.0.0.1",
            "169.254.1.1",
            "172.16.0.1",
            "172.31.255.255",
            "192.0.0.8",
            "192.0.2.1",
            "192.168.1.10",
            "198.18.0.1",
            "198.19.255.255",
            "198.51.100.7",
            "203.0.113.9",
            "224.0.0.1",
            "240.0.0.1",
            "255.255.255.255",
        ] {
            assert!(!is_global_unicast(ip(addr)), "{addr} should be non-global");
        }
    }

    #[test]
    fn test_ipv4_global() {
        for addr in ["1.1.1.1", "8.8.8.8", "93.184.216.34", "100.128.0.1", "172.32.0.1"] {
            assert!(is_global_unicast(ip(addr)), "{addr} should be global");
        }
    }

    #[test]
    fn test_ipv6_non_global() {
        for addr in [
            "::",
            "::1",
            "fc00::1",
            "fd12:3456::1",
            "fe80::1",
            "fec0::1",
            "ff02::1",
            "2001:db8::1",
            "100::1",
            "2001::1",
            "::ffff:10.0.0.1",
            "::ffff:127.0.0.1",
            "64:ff9b::7f00:1",
            "2002:c0a8:0101::1",
            "4000::1",
        ] {
            assert!(!is_global_unicast(ip(addr)), "{addr} should be non-global");
        }
    }

    #[test]
    fn test_ipv6_global() {
        for addr in [
            "2606:4700:4700::1111",
            "2001:4860:4860::8888",
            "::ffff:8.8.8.8",
            "64:ff9b::808:808",
            "2002:0808:0808::1",
        ] {
            assert!(is_global_unicast(ip(addr)), "{addr} should be global");
        }
    }

    #[test]
    fn test_metadata_addresses_forbidden() {
        for addr in METADATA_ADDRS {
            assert!(forbidden_reason(*addr).is_some(), "{addr}");
        }
        assert_eq!(
            forbidden_reason(ip("168.63.129.16")),
            Some("cloud metadata address")
        );
        assert_eq!(
            forbidden_reason(ip("::ffff:169.254.169.254")),
            Some("cloud metadata address")
        );
    }

    #[test]
    fn test_blocked_names() {
        assert!(blocked_name_reason("localhost").is_some());
        assert!(blocked_name_reason("LOCALHOST.").is_some());
        assert!(blocked_name_reason("api.localhost").is_some());
        assert!(blocked_name_reason("metadata.google.internal").is_some());
        assert!(blocked_name_reason("instance-data").is_some());
        assert!(blocked_name_reason("example.com").is_none());
        assert!(blocked_name_reason("localhost.example.com").is_none());
    }

    #[test]
    fn test_screen_restricted() {
        let policy = HostPolicy::new(HostPolicyMode::Restricted);

        let err = policy.screen(&Host::Domain("localhost")).unwrap_err();
        assert!(matches!(err, Error::ForbiddenHost { .. }));

        let err = policy
            .screen(&Host::Ipv4(Ipv4Addr::new(192, 168, 1, 10)))
            .unwrap_err();
        assert!(matches!(err, Error::ForbiddenHost { .. }));

        let err = policy.screen(&Host::Ipv6(Ipv6Addr::LOCALHOST)).unwrap_err();
        assert!(matches!(err, Error::ForbiddenHost { .. }));

        assert_eq!(
            policy.screen(&Host::Ipv4(Ipv4Addr::new(8, 8, 8, 8))).unwrap(),
            Screening::Allowed
        );
        assert_eq!(
            policy.screen(&Host::Domain("example.com")).unwrap(),
            Screening::Resolve
        );
    }

    #[test]
    fn test_screen_open_allows_everything() {
        let policy = HostPolicy::new(HostPolicyMode::Open);
        assert_eq!(
            policy.screen(&Host::Domain("localhost")).unwrap(),
            Screening::Allowed
        );
        assert_eq!(
            policy
                .screen(&Host::Ipv4(Ipv4Addr::new(169, 254, 169, 254)))
                .unwrap(),
            Screening::Allowed
        );
        policy.check_resolved("x", &[ip("127.0.0.1")]).unwrap();
    }

    #[test]
    fn test_check_resolved_requires_every_address_global() {
        let policy = HostPolicy::new(HostPolicyMode::Restricted);
        policy
            .check_resolved("example.com", &[ip("93.184.216.34")])
            .unwrap();

        let err = policy
            .check_resolved("rebind.test", &[ip("93.184.216.34"), ip("10.0.0.5")])
            .unwrap_err();
        assert!(err.to_string().contains("10.0.0.5"));

        assert!(policy.check_resolved("empty.test", &[]).is_err());
    }
}
