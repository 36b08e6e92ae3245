// ── Core error types ──
//
// Domain errors from wpfleet-core. Consumers never see HTTP status codes
// or JSON parse failures directly. The `From<wpfleet_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Site not found: {id}")]
    SiteNotFound { id: String },

    // ── Site access errors ───────────────────────────────────────────
    #[error("Credential error: {message}")]
    Credential { message: String },

    #[error("Site unreachable: {message}")]
    Unreachable { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Remote operation errors ──────────────────────────────────────
    #[error("Remote error: {message}")]
    Remote {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Reconciliation failed: {message}")]
    Reconciliation { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Errors after which no further call to the same site can succeed in
    /// this run. A whole site-group is failed on these.
    pub fn is_site_unreachable(&self) -> bool {
        matches!(
            self,
            Self::Credential { .. } | Self::Unreachable { .. } | Self::AuthenticationFailed { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<wpfleet_api::Error> for CoreError {
    fn from(err: wpfleet_api::Error) -> Self {
        if err.is_unreachable() {
            return CoreError::Unreachable {
                message: err.to_string(),
            };
        }
        match err {
            wpfleet_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            wpfleet_api::Error::Remote {
                status, message, ..
            } => CoreError::Remote {
                message,
                status: Some(status),
            },
            wpfleet_api::Error::Transport(ref e) => CoreError::Remote {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            wpfleet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            wpfleet_api::Error::Tls(msg) => CoreError::Unreachable {
                message: format!("TLS error: {msg}"),
            },
            wpfleet_api::Error::Deserialization { message, body: _ } => CoreError::Remote {
                message: format!("unexpected response: {message}"),
                status: None,
            },
        }
    }
}
