//! Purely lexical path resolution (§4.3). Never consults the route table.

use crate::error::GatewayError;

/// Result of resolving an inbound path against the gateway's base path.
pub struct Resolved {
    pub route_key: String,
    pub remaining: String,
}

/// Strip `base_path` from `url_path` and split the remainder into a route
/// key (first segment) and everything after it.
pub fn resolve(url_path: &str, base_path: &str) -> Result<Resolved, GatewayError> {
    let stripped = url_path.strip_prefix(base_path).unwrap_or(url_path);
    if stripped.is_empty() || stripped == "/" {
        return Err(GatewayError::InvalidPath);
    }

    let trimmed = stripped.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(GatewayError::InvalidPath);
    }

    let (route_key, remaining) = match trimmed.split_once('/') {
        Some((key, rest)) => (key, rest),
        None => (trimmed, ""),
    };

    Ok(Resolved {
        route_key: route_key.to_string(),
        remaining: remaining.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_route_key_and_sub_path() {
        let r = resolve("/api/v1/webhook/events", "/api/v1").unwrap();
        assert_eq!(r.route_key, "webhook");
        assert_eq!(r.remaining, "events");
    }

    #[test]
    fn resolves_route_key_with_no_sub_path() {
        let r = resolve("/api/v1/webhook", "/api/v1").unwrap();
        assert_eq!(r.route_key, "webhook");
        assert_eq!(r.remaining, "");
    }

    #[test]
    fn empty_remainder_is_invalid() {
        assert!(resolve("/api/v1", "/api/v1").is_err());
    }

    #[test]
    fn bare_slash_remainder_is_invalid() {
        assert!(resolve("/api/v1/", "/api/v1").is_err());
    }

    #[test]
    fn nested_sub_path_is_preserved_in_full() {
        let r = resolve("/api/v1/webhook/a/b/c", "/api/v1").unwrap();
        assert_eq!(r.route_key, "webhook");
        assert_eq!(r.remaining, "a/b/c");
    }
}
