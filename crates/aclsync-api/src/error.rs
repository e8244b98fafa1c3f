use thiserror::Error;

/// Top-level error type for the `aclsync-api` crate.
///
/// Covers every failure mode across both API surfaces: the endpoint
/// publication service and the switch command API. `aclsync-core` maps
/// these into pass-level errors depending on which collaborator failed.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The switch rejected the supplied credentials (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Endpoint service ────────────────────────────────────────────
    /// Non-success HTTP status from the endpoint publication service.
    #[error("Endpoint service error (HTTP {status}): {message}")]
    EndpointService { status: u16, message: String },

    // ── Command API ─────────────────────────────────────────────────
    /// JSON-RPC error object returned by the switch.
    ///
    /// `data` carries the per-command outputs the switch returned before
    /// the failing command, which usually hold the CLI error text.
    #[error("Command API error {code}: {message}")]
    CommandApi {
        code: i64,
        message: String,
        data: Vec<serde_json::Value>,
    },

    /// Non-success HTTP status from the command API endpoint.
    #[error("Command API HTTP error {status}: {message}")]
    CommandHttp { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the switch rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::EndpointService { status, .. } | Self::CommandHttp { status, .. } => {
                *status >= 500
            }
            _ => false,
        }
    }

    /// Returns `true` if the request timed out at the transport layer.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Extract the error messages the switch attached to a failed command batch.
    ///
    /// The command API reports per-command failures as `{"errors": [...]}`
    /// objects inside `data`.
    pub fn command_errors(&self) -> Vec<String> {
        let Self::CommandApi { data, .. } = self else {
            return Vec::new();
        };
        data.iter()
            .filter_map(|entry| entry.get("errors"))
            .filter_map(serde_json::Value::as_array)
            .flatten()
            .filter_map(|e| e.as_str().map(String::from))
            .collect()
    }
}
