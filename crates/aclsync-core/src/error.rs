// ── Core error types ──
//
// Pass-level errors from aclsync-core. The same `aclsync_api::Error` means
// different things depending on which collaborator produced it, so there is
// no blanket `From` impl: callers pick `from_source` or `from_device`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Endpoint source ──────────────────────────────────────────────
    #[error("Endpoint source unavailable: {message}")]
    SourceUnavailable { message: String, transient: bool },

    // ── Device state ─────────────────────────────────────────────────
    #[error("Invalid subnet mask {mask}: not a contiguous prefix")]
    InvalidMask { mask: u32 },

    #[error("Invalid prefix length /{length}")]
    InvalidPrefixLength { length: u8 },

    #[error("Unsupported protocol {protocol} in access list entry {sequence}")]
    UnsupportedProtocol { protocol: u32, sequence: u32 },

    #[error("Malformed device state: {message}")]
    MalformedDeviceState { message: String },

    // ── Device session ───────────────────────────────────────────────
    #[error("Device authentication failed: {message}")]
    DeviceAuthentication { message: String },

    #[error("Device session failed: {message}")]
    DeviceSession { message: String, transient: bool },

    #[error("{peer} request timed out: {message}")]
    Timeout { peer: &'static str, message: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Version state at {path} unusable: {reason}")]
    VersionState { path: String, reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Wrap an error from the endpoint publication service.
    pub fn from_source(err: aclsync_api::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                peer: "endpoint source",
                message: err.to_string(),
            };
        }
        Self::SourceUnavailable {
            transient: err.is_transient(),
            message: err.to_string(),
        }
    }

    /// Wrap an error from the switch command API.
    pub fn from_device(err: aclsync_api::Error) -> Self {
        if err.is_auth_failure() {
            return Self::DeviceAuthentication {
                message: err.to_string(),
            };
        }
        if err.is_timeout() {
            return Self::Timeout {
                peer: "device",
                message: err.to_string(),
            };
        }
        let details = err.command_errors();
        let message = if details.is_empty() {
            err.to_string()
        } else {
            format!("{err} ({})", details.join("; "))
        };
        Self::DeviceSession {
            transient: err.is_transient(),
            message,
        }
    }

    /// Returns `true` if the device state could not be turned into rules.
    ///
    /// These abort a pass before any mutating command is sent.
    pub fn is_device_state(&self) -> bool {
        matches!(
            self,
            Self::InvalidMask { .. }
                | Self::UnsupportedProtocol { .. }
                | Self::MalformedDeviceState { .. }
        )
    }

    /// Returns `true` if an external retry policy could reasonably retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::SourceUnavailable { transient, .. } | Self::DeviceSession { transient, .. } => {
                *transient
            }
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn device_errors_include_command_output() {
        let api = aclsync_api::Error::CommandApi {
            code: 1002,
            message: "CLI command 4 of 4 failed".into(),
            data: vec![json!({}), json!({ "errors": ["Duplicate sequence number"] })],
        };
        let err = CoreError::from_device(api);
        assert!(err.to_string().contains("Duplicate sequence number"));
        assert!(!err.is_transient());
    }

    #[test]
    fn device_auth_failure_is_distinct() {
        let api = aclsync_api::Error::Authentication {
            message: "bad password".into(),
        };
        assert!(matches!(
            CoreError::from_device(api),
            CoreError::DeviceAuthentication { .. }
        ));
    }

    #[test]
    fn source_errors_keep_transience() {
        let api = aclsync_api::Error::EndpointService {
            status: 502,
            message: "bad gateway".into(),
        };
        let err = CoreError::from_source(api);
        assert!(matches!(err, CoreError::SourceUnavailable { .. }));
        assert!(err.is_transient());
    }
}
