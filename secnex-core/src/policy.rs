//! Pure policy predicates (§4.4), run as a fixed ordered pipeline so the
//! evaluation order stays data, not a chain of nested `if`/`return`.

use crate::error::GatewayError;
use crate::route::{normalize_remote_addr, Route};

/// Request metadata the policy engine needs. Carries only what the
/// predicates read — never the request body.
pub struct RequestMeta<'a> {
    pub method: &'a str,
    pub remote_addr: &'a str,
    pub user_agent: &'a str,
    pub authorization: Option<&'a str>,
}

type Predicate = fn(&Route, &RequestMeta) -> Result<(), GatewayError>;

/// Order matters: this is the §4.4 evaluation order, verbatim.
const PIPELINE: &[Predicate] = &[
    check_ip_allowed,
    check_ip_blocked,
    check_user_agent,
    check_method,
    check_auth_presence,
];

/// Run every predicate in order, stopping at (and returning) the first denial.
pub fn evaluate(route: &Route, meta: &RequestMeta) -> Result<(), GatewayError> {
    for predicate in PIPELINE {
        predicate(route, meta)?;
    }
    Ok(())
}

fn check_ip_allowed(route: &Route, meta: &RequestMeta) -> Result<(), GatewayError> {
    if route.allowed_ips.is_empty() {
        return if route.default_allowed {
            Ok(())
        } else {
            Err(GatewayError::IpNotAllowed)
        };
    }
    let Some(client_ip) = normalize_remote_addr(meta.remote_addr) else {
        return Err(GatewayError::IpNotAllowed);
    };
    let allowed = route
        .allowed_ips
        .iter()
        .filter_map(|ip| ip.parse().ok())
        .any(|allowed: std::net::IpAddr| allowed == client_ip);
    if allowed {
        Ok(())
    } else {
        Err(GatewayError::IpNotAllowed)
    }
}

fn check_ip_blocked(route: &Route, meta: &RequestMeta) -> Result<(), GatewayError> {
    if route.blocked_ips.is_empty() {
        return Ok(());
    }
    let Some(client_ip) = normalize_remote_addr(meta.remote_addr) else {
        return Ok(());
    };
    let blocked = route
        .blocked_ips
        .iter()
        .filter_map(|ip| ip.parse().ok())
        .any(|blocked: std::net::IpAddr| blocked == client_ip);
    if blocked {
        Err(GatewayError::IpBlocked)
    } else {
        Ok(())
    }
}

fn check_user_agent(route: &Route, meta: &RequestMeta) -> Result<(), GatewayError> {
    if !route.allowed_user_agents.is_empty() && !route.allowed_user_agents.contains(meta.user_agent)
    {
        return Err(GatewayError::UserAgentNotAllowed);
    }
    if route.rejected_user_agents.contains(meta.user_agent) {
        return Err(GatewayError::UserAgentNotAllowed);
    }
    Ok(())
}

fn check_method(route: &Route, meta: &RequestMeta) -> Result<(), GatewayError> {
    if route.method_allowed(meta.method) {
        Ok(())
    } else {
        Err(GatewayError::MethodNotAllowed)
    }
}

fn check_auth_presence(route: &Route, meta: &RequestMeta) -> Result<(), GatewayError> {
    if !route.required_auth {
        return Ok(());
    }
    let Some(header) = meta.authorization else {
        return Err(GatewayError::Unauthorized(
            "authorization header missing".to_string(),
        ));
    };
    let parts: Vec<&str> = header.splitn(2, ' ').collect();
    if parts.len() != 2 {
        return Err(GatewayError::Unauthorized(
            "invalid Authorization header format".to_string(),
        ));
    }
    if parts[0] != "Bearer" {
        return Err(GatewayError::Unauthorized(
            "invalid Authorization header type".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn route() -> Route {
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

    fn meta<'a>(remote_addr: &'a str, authorization: Option<&'a str>) -> RequestMeta<'a> {
        RequestMeta {
            method: "GET",
            remote_addr,
            user_agent: "curl/8.0",
            authorization,
        }
    }

    #[test]
    fn default_allowed_governs_empty_allow_list() {
        let mut r = route();
        r.default_allowed = false;
        assert!(matches!(
            evaluate(&r, &meta("127.0.0.1:1", None)),
            Err(GatewayError::IpNotAllowed)
        ));
    }

    #[test]
    fn allowed_ips_accepts_v6_equivalent_forms() {
        let mut r = route();
        r.allowed_ips.insert("::1".to_string());
        assert!(evaluate(&r, &meta("[::1]:1234", None)).is_ok());
    }

    #[test]
    fn block_overrides_allow() {
        let mut r = route();
        r.allowed_ips.insert("127.0.0.1".to_string());
        r.blocked_ips.insert("127.0.0.1".to_string());
        assert!(matches!(
            evaluate(&r, &meta("127.0.0.1:1", None)),
            Err(GatewayError::IpBlocked)
        ));
    }

    #[test]
    fn method_check_runs_after_ip_and_ua_checks() {
        let mut r = route();
        r.allowed_methods.insert("GET".to_string());
        let mut m = meta("127.0.0.1:1", None);
        m.method = "POST";
        assert!(matches!(
            evaluate(&r, &m),
            Err(GatewayError::MethodNotAllowed)
        ));
    }

    #[test]
    fn auth_presence_is_the_last_check() {
        let mut r = route();
        r.required_auth = true;
        assert!(matches!(
            evaluate(&r, &meta("127.0.0.1:1", None)),
            Err(GatewayError::Unauthorized(_))
        ));
        assert!(evaluate(&r, &meta("127.0.0.1:1", Some("Bearer t"))).is_ok());
    }

    #[test]
    fn auth_header_must_be_exactly_two_parts_with_bearer_scheme() {
        let mut r = route();
        r.required_auth = true;
        assert!(matches!(
            evaluate(&r, &meta("127.0.0.1:1", Some("Bearer"))),
            Err(GatewayError::Unauthorized(_))
        ));
        assert!(matches!(
            evaluate(&r, &meta("127.0.0.1:1", Some("Basic t"))),
            Err(GatewayError::Unauthorized(_))
        ));
    }

    #[test]
    fn rejected_user_agent_short_circuits() {
        let mut r = route();
        r.rejected_user_agents.insert("bad-bot".to_string());
        let mut m = meta("127.0.0.1:1", None);
        m.user_agent = "bad-bot";
        assert!(matches!(
            evaluate(&r, &m),
            Err(GatewayError::UserAgentNotAllowed)
        ));
    }
}
