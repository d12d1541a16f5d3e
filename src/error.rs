use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Startup configuration failures. Fatal: `main` refuses to serve with a broken policy.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read route policy file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid route policy document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid route pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Reasons an identity could not be resolved. Never surfaced to callers of the gate;
/// every variant is treated as "no principal".
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("identity service unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("identity service answered {0}")]
    Rejected(StatusCode),

    #[error("identity service returned no principal")]
    Missing,

    #[error("identity lookup timed out")]
    TimedOut,
}

/// Errors raised by the proxy layer before or instead of an upstream answer.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Upstream API unreachable: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream API returned an unreadable body")]
    InvalidBody,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Your role cannot perform this action")]
    Forbidden,

    #[error("Malformed resource id")]
    InvalidSegment,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            ProxyError::Upstream(_) | ProxyError::InvalidBody => StatusCode::BAD_GATEWAY,
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::Forbidden => StatusCode::FORBIDDEN,
            ProxyError::InvalidSegment => StatusCode::BAD_REQUEST,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "proxy call failed");
        }

        (
            status,
            Json(serde_json::json!({ "success": false, "message": self.to_string() })),
        )
            .into_response()
    }
}
