use thiserror::Error;

/// Unified error type for the gateway's request path and its background jobs.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("invalid path")]
    InvalidPath,

    #[error("Route not found")]
    RouteNotFound,

    #[error("IP not allowed")]
    IpNotAllowed,

    #[error("IP blocked")]
    IpBlocked,

    #[error("User agent not allowed")]
    UserAgentNotAllowed,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Unauthorized(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Map to the HTTP status code returned to the client (§4.4 / §7).
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::InvalidPath => 400,
            GatewayError::RouteNotFound => 404,
            GatewayError::IpNotAllowed | GatewayError::IpBlocked | GatewayError::UserAgentNotAllowed => 403,
            GatewayError::MethodNotAllowed => 405,
            GatewayError::Unauthorized(_) => 401,
            GatewayError::Upstream(_) => 502,
            GatewayError::Store(_) | GatewayError::Internal(_) => 500,
        }
    }

    /// Short machine-oriented message, distinct from the detail in `error`.
    pub fn message(&self) -> &'static str {
        match self {
            GatewayError::InvalidPath => "Bad request",
            GatewayError::RouteNotFound => "Route not found",
            GatewayError::IpNotAllowed | GatewayError::IpBlocked | GatewayError::UserAgentNotAllowed => "Forbidden",
            GatewayError::MethodNotAllowed => "Method not allowed",
            GatewayError::Unauthorized(_) => "Unauthorized",
            GatewayError::Upstream(_) => "Bad gateway",
            GatewayError::Store(_) | GatewayError::Internal(_) => "Internal error",
        }
    }

    /// Render the `{"code","message","error"}` JSON body mandated by §6.
    pub fn to_json_body(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.status_code(),
            "message": self.message(),
            "error": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_policy_table() {
        assert_eq!(GatewayError::InvalidPath.status_code(), 400);
        assert_eq!(GatewayError::RouteNotFound.status_code(), 404);
        assert_eq!(GatewayError::IpNotAllowed.status_code(), 403);
        assert_eq!(GatewayError::IpBlocked.status_code(), 403);
        assert_eq!(GatewayError::UserAgentNotAllowed.status_code(), 403);
        assert_eq!(GatewayError::MethodNotAllowed.status_code(), 405);
        assert_eq!(GatewayError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(GatewayError::Upstream("x".into()).status_code(), 502);
        assert_eq!(GatewayError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn json_body_carries_code_message_and_detail() {
        let err = GatewayError::Unauthorized("authorization header missing".into());
        let body = err.to_json_body();
        assert_eq!(body["code"], 401);
        assert_eq!(body["message"], "Unauthorized");
        assert_eq!(body["error"], "authorization header missing");
    }
}
