// ── Runtime configuration ──
//
// These types describe which switch and access list to reconcile and where
// the endpoint list comes from. They carry credential data and connection
// tuning, but never touch disk. The CLI builds them and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use aclsync_api::transport::{TlsMode, TransportConfig};
use aclsync_api::{EapiClient, EndpointsClient};

use crate::error::CoreError;

pub use aclsync_api::endpoints::{
    DEFAULT_BASE_URL as DEFAULT_ENDPOINTS_URL, DEFAULT_INSTANCE as DEFAULT_ENDPOINTS_INSTANCE,
};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

fn build_transport(tls: &TlsVerification, timeout: Duration) -> TransportConfig {
    TransportConfig {
        tls: tls.into(),
        timeout,
    }
}

// ── Device ───────────────────────────────────────────────────────────

/// Connection settings for the switch command API.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Host, `host:port`, or full `/command-api` URL.
    pub address: String,
    pub username: String,
    pub password: SecretString,
    /// Switches ship self-signed certificates; the CLI defaults to accepting them.
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl DeviceConfig {
    /// Build the command API client.
    pub fn connect(&self) -> Result<EapiClient, CoreError> {
        let transport = build_transport(&self.tls, self.timeout);
        EapiClient::new(
            &self.address,
            self.username.clone(),
            self.password.clone(),
            &transport,
        )
        .map_err(|e| CoreError::Config {
            message: format!("device {}: {e}", self.address),
        })
    }
}

// ── Endpoint source ──────────────────────────────────────────────────

/// Where to fetch the endpoint list from.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: Url,
    /// Service instance, e.g. `Worldwide`.
    pub instance: String,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_ENDPOINTS_URL).expect("default endpoint URL is valid"),
            instance: DEFAULT_ENDPOINTS_INSTANCE.into(),
            tls: TlsVerification::SystemDefaults,
            timeout: Duration::from_secs(30),
        }
    }
}

impl SourceConfig {
    /// Build the endpoint service client.
    pub fn connect(&self) -> Result<EndpointsClient, CoreError> {
        let transport = build_transport(&self.tls, self.timeout);
        EndpointsClient::new(self.base_url.as_str(), &transport).map_err(|e| CoreError::Config {
            message: format!("endpoint source {}: {e}", self.base_url),
        })
    }
}

// ── Reconciliation ───────────────────────────────────────────────────

/// When the observed remote version is written to the version store.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VersionCommit {
    /// As soon as a newer version is observed, before the endpoint list is
    /// fetched.
    ///
    /// A failed fetch or apply is not retried until the next upstream version.
    #[default]
    BeforeApply,
    /// Only after the delta has been applied and persisted.
    ///
    /// A failed apply is retried on the next pass.
    AfterApply,
}

/// What to reconcile and how.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Name of the access list on the switch.
    pub acl_name: String,
    pub version_commit: VersionCommit,
    /// Location of the version state file.
    pub state_path: PathBuf,
}

impl ReconcileConfig {
    pub fn new(acl_name: impl Into<String>) -> Self {
        Self {
            acl_name: acl_name.into(),
            version_commit: VersionCommit::default(),
            state_path: default_state_path(),
        }
    }

    /// Reject access list names that would break the rendered CLI commands.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.acl_name.is_empty() {
            return Err(CoreError::Config {
                message: "access list name is empty".into(),
            });
        }
        if self.acl_name.chars().any(char::is_whitespace) {
            return Err(CoreError::Config {
                message: format!("access list name '{}' contains whitespace", self.acl_name),
            });
        }
        Ok(())
    }
}

/// Default version state location: the system temp directory.
pub fn default_state_path() -> PathBuf {
    std::env::temp_dir().join("endpoints_clientid_latestversion.txt")
}
