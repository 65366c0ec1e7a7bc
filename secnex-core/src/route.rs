use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;

/// A single registered route, immutable once published into a [`crate::RouteTable`]
/// snapshot (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    /// Single non-empty path segment, no slashes — the route key.
    pub path: String,

    /// Absolute upstream base URL (scheme + host + optional path).
    pub url: String,

    /// Allowed HTTP method tokens; empty means any method is accepted.
    #[serde(default)]
    pub allowed_methods: HashSet<String>,

    /// Client IPs allowed to reach this route.
    #[serde(default)]
    pub allowed_ips: HashSet<String>,

    /// Client IPs always denied, regardless of `allowed_ips`.
    #[serde(default)]
    pub blocked_ips: HashSet<String>,

    /// Exact-match user agents allowed; empty means any user agent is accepted.
    #[serde(default)]
    pub allowed_user_agents: HashSet<String>,

    /// Exact-match user agents always denied.
    #[serde(default)]
    pub rejected_user_agents: HashSet<String>,

    /// Governs the IP-allow decision when `allowed_ips` is empty (§4.4).
    pub default_allowed: bool,

    /// When true, requests must carry a bearer `Authorization` header.
    pub required_auth: bool,

    /// When true, any path suffix after the route key is appended to the
    /// upstream URL (§4.5).
    pub forward_sub_path: bool,
}

impl Route {
    /// Method decision: empty `allowed_methods` accepts anything (§4.4).
    pub fn method_allowed(&self, method: &str) -> bool {
        self.allowed_methods.is_empty() || self.allowed_methods.contains(method)
    }
}

/// Extract the bare host from a `RemoteAddr` in `host:port` or `[host]:port`
/// form (§4.4). Returns `None` if the address cannot be parsed at all — the
/// caller treats that as "no IP matched".
pub fn normalize_remote_addr(remote_addr: &str) -> Option<IpAddr> {
    if let Some(start) = remote_addr.find('[') {
        let end = remote_addr.find(']')?;
        return remote_addr[start + 1..end].parse().ok();
    }
    // A bare address (no port) — covers unbracketed IPv6 like "::1".
    if let Ok(ip) = remote_addr.parse::<IpAddr>() {
        return Some(ip);
    }
    remote_addr
        .split(':')
        .next()
        .unwrap_or(remote_addr)
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_allowed_is_permissive_when_empty() {
        let route = sample_route();
        assert!(route.method_allowed("GET"));
        assert!(route.method_allowed("DELETE"));
    }

    #[test]
    fn method_allowed_restricts_to_the_configured_set() {
        let mut route = sample_route();
        route.allowed_methods.insert("GET".to_string());
        assert!(route.method_allowed("GET"));
        assert!(!route.method_allowed("POST"));
    }

    #[test]
    fn normalize_handles_ipv4_with_port() {
        assert_eq!(
            normalize_remote_addr("127.0.0.1:5555"),
            Some("127.0.0.1".parse().unwrap())
        );
    }

    #[test]
    fn normalize_handles_ipv6_with_brackets_and_port() {
        assert_eq!(
            normalize_remote_addr("[::1]:1234"),
            Some("::1".parse().unwrap())
        );
    }

    #[test]
    fn normalize_handles_bare_ipv6() {
        assert_eq!(normalize_remote_addr("::1"), Some("::1".parse().unwrap()));
    }

    #[test]
    fn ipv6_forms_are_structurally_equal() {
        // 0:0:0:0:0:0:0:1 is the expanded form of ::1 — same parsed value.
        let a = normalize_remote_addr("[::1]:1234").unwrap();
        let b = normalize_remote_addr("[0:0:0:0:0:0:0:1]:9").unwrap();
        assert_eq!(a, b);
    }

    fn sample_route() -> Route {
        Route {
            path: "webhook".to_string(),
            url: "http://upstream:3000".to_string(),
            allowed_methods: HashSet::new(),
            allowed_ips: HashSet::new(),
            blocked_ips: HashSet::new(),
            allowed_user_agents: HashSet::new(),
            rejected_user_agents: HashSet::new(),
            default_allowed: true,
            required_auth: false,
            forward_sub_path: true,
        }
    }
}
