//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use aclsync_config::ConfigError;
use aclsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const DEVICE_STATE: i32 = 9;
    pub const APPLY: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Endpoint list unavailable: {message}")]
    #[diagnostic(
        code(aclsync::source_unavailable),
        help("Check network access to the endpoint service, or override it with --endpoints-url.")
    )]
    SourceUnavailable { message: String },

    #[error("Could not reach the switch: {message}")]
    #[diagnostic(
        code(aclsync::connection_failed),
        help(
            "Check that the command API is enabled and reachable (management api http-commands).\n\
             If the switch uses a self-signed certificate, pass --insecure (-k)."
        )
    )]
    ConnectionFailed { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(aclsync::timeout),
        help("Increase timeout with --timeout or check the peer's responsiveness.")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Switch authentication failed")]
    #[diagnostic(
        code(aclsync::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             Run: aclsync config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(aclsync::no_credentials),
        help(
            "Configure credentials with: aclsync config init\n\
             Or set ACLSYNC_USERNAME and ACLSYNC_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Device state ─────────────────────────────────────────────────
    #[error("Unexpected access list state on the switch: {message}")]
    #[diagnostic(
        code(aclsync::device_state),
        help(
            "The access list contains entries aclsync cannot represent.\n\
             Nothing was changed. Inspect it with: show ip access-lists <name>"
        )
    )]
    DeviceState { message: String },

    #[error("Applying changes failed: {message}")]
    #[diagnostic(
        code(aclsync::apply_failed),
        help(
            "The pending configuration session was discarded.\n\
             Changes committed by an earlier session in this pass are not rolled back."
        )
    )]
    ApplyFailed { message: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Version state at {path} is unusable: {reason}")]
    #[diagnostic(
        code(aclsync::version_state),
        help("Fix or delete the file; a fresh one is created on the next run.")
    )]
    VersionState { path: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aclsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(aclsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: aclsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No switch configured")]
    #[diagnostic(
        code(aclsync::no_config),
        help(
            "Create a profile with: aclsync config init\n\
             Or pass --device and --acl. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(aclsync::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(aclsync::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceUnavailable { .. } | Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::DeviceState { .. } => exit_code::DEVICE_STATE,
            Self::ApplyFailed { .. } => exit_code::APPLY,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            Self::VersionState { .. } | Self::Config(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SourceUnavailable { message, .. } => Self::SourceUnavailable { message },

            CoreError::DeviceAuthentication { .. } => Self::AuthFailed {
                profile: "current".into(),
            },

            CoreError::Timeout { .. } => Self::Timeout {
                message: err.to_string(),
            },

            CoreError::InvalidMask { .. }
            | CoreError::InvalidPrefixLength { .. }
            | CoreError::UnsupportedProtocol { .. }
            | CoreError::MalformedDeviceState { .. } => Self::DeviceState {
                message: err.to_string(),
            },

            // Connect errors and 5xx replies: the command never ran.
            CoreError::DeviceSession {
                message,
                transient: true,
            } => Self::ConnectionFailed { message },

            CoreError::DeviceSession { message, .. } => Self::ApplyFailed { message },

            CoreError::VersionState { path, reason } => Self::VersionState { path, reason },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}

impl CliError {
    /// Attach the active profile name to authentication errors.
    #[must_use]
    pub fn for_profile(self, name: &str) -> Self {
        match self {
            Self::AuthFailed { .. } => Self::AuthFailed {
                profile: name.into(),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_state_errors_exit_nine() {
        let err: CliError = CoreError::UnsupportedProtocol {
            protocol: 1,
            sequence: 40,
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::DEVICE_STATE);
    }

    #[test]
    fn command_failures_exit_ten() {
        let err: CliError = CoreError::DeviceSession {
            message: "invalid command".into(),
            transient: false,
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::APPLY);
    }

    #[test]
    fn unreachable_switch_is_a_connection_error() {
        let err: CliError = CoreError::DeviceSession {
            message: "connection refused".into(),
            transient: true,
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn auth_errors_name_the_profile() {
        let err: CliError = CoreError::DeviceAuthentication {
            message: "401".into(),
        }
        .into();
        let err = err.for_profile("core");
        assert!(matches!(err, CliError::AuthFailed { ref profile } if profile == "core"));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
