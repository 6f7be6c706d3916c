use crate::tls::TlsError;
use thiserror::Error;

/// Failure of a backend call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No HTTP response at all: refused, reset, timed out.
    #[error("network error on {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// 2xx reply whose envelope says `success: false`.
    #[error("{message}")]
    Application { message: String },

    #[error("invalid response from {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error(transparent)]
    Tls(#[from] TlsError),
}

impl ClientError {
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Operator-facing wording of a failure.
pub fn format_error(error: &ClientError) -> String {
    match error {
        ClientError::Network { .. } => {
            "Connection error: unable to reach the server".to_string()
        }
        ClientError::Http { status: 404, .. } => "Resource not found".to_string(),
        ClientError::Http { status: 500, .. } => "Internal server error".to_string(),
        other => format!("Error: {other}"),
    }
}
