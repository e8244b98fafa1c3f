//! Profile configuration for aclsync.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to the `aclsync_core` runtime config types. The CLI
//! layers its flag overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aclsync_core::config::default_state_path;
use aclsync_core::{DeviceConfig, ReconcileConfig, SourceConfig, TlsVerification, VersionCommit};

/// Keyring service name; entries are keyed `{profile}/password`.
pub const KEYRING_SERVICE: &str = "aclsync";

/// Environment variable consulted for the device password.
pub const PASSWORD_ENV: &str = "ACLSYNC_PASSWORD";

/// Environment variable consulted for the device username.
pub const USERNAME_ENV: &str = "ACLSYNC_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named switch profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Endpoint service base URL.
    #[serde(default = "default_endpoints_url")]
    pub endpoints_url: String,

    /// Endpoint service instance.
    #[serde(default = "default_instance")]
    pub instance: String,

    #[serde(default)]
    pub version_commit: VersionCommit,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            endpoints_url: default_endpoints_url(),
            instance: default_instance(),
            version_commit: VersionCommit::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_endpoints_url() -> String {
    aclsync_core::config::DEFAULT_ENDPOINTS_URL.into()
}
fn default_instance() -> String {
    aclsync_core::config::DEFAULT_ENDPOINTS_INSTANCE.into()
}

/// A named switch profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Switch address: host, `host:port`, or full command API URL.
    pub device: String,

    /// Access list to reconcile.
    pub acl: String,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or `password_env`).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override the endpoint service instance.
    pub instance: Option<String>,

    /// Override the endpoint service base URL.
    pub endpoints_url: Option<String>,

    /// Version state file; defaults to the system temp dir.
    pub state_file: Option<PathBuf>,

    /// Accept the switch's certificate without verification.
    pub insecure: Option<bool>,

    /// Path to custom CA certificate for the switch.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    pub version_commit: Option<VersionCommit>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "aclsync", "aclsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("aclsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment.
///
/// Nested keys come from `ACLSYNC_` variables split on `__`, e.g.
/// `ACLSYNC_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ACLSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the switch username: profile, then `ACLSYNC_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the switch password from the credential chain.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env
    if let Some(pw) = profile
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok(SecretString::from(pw));
    }

    // 2. Well-known env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = keyring_password(profile_name) {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .ok()?
        .get_password()
        .ok()
}

/// Store a password in the system keyring for `profile_name`.
///
/// Fails unless the password reads back through a fresh entry, the way
/// [`resolve_password`] will look it up.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let keyring_error = |reason: String| ConfigError::Validation {
        field: "keyring".into(),
        reason,
    };
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| keyring_error(e.to_string()))?;

    match keyring_password(profile_name) {
        Some(stored) if stored == password => Ok(()),
        _ => Err(keyring_error(format!(
            "password for '{profile_name}' did not persist in the system keyring; \
             use password_env or {PASSWORD_ENV} instead"
        ))),
    }
}

// ── Translation to core config ──────────────────────────────────────

/// Switch TLS policy: explicit `insecure`, then `ca_cert`, else accept
/// self-signed certificates. The endpoint source always verifies.
pub fn device_tls(profile: &Profile) -> TlsVerification {
    match (profile.insecure, &profile.ca_cert) {
        (Some(true), _) | (None, None) => TlsVerification::DangerAcceptInvalid,
        (_, Some(ca_path)) => TlsVerification::CustomCa(ca_path.clone()),
        (Some(false), None) => TlsVerification::SystemDefaults,
    }
}

/// Build a `DeviceConfig` from a profile; no CLI flag overrides.
pub fn profile_to_device_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    if profile.device.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "device".into(),
            reason: format!("profile '{profile_name}' has no device address"),
        });
    }

    Ok(DeviceConfig {
        address: profile.device.clone(),
        username: resolve_username(profile, profile_name)?,
        password: resolve_password(profile, profile_name)?,
        tls: device_tls(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

/// Build a `SourceConfig` from a profile and global defaults.
pub fn profile_to_source_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<SourceConfig, ConfigError> {
    let url_str = profile
        .endpoints_url
        .as_deref()
        .unwrap_or(&defaults.endpoints_url);
    let base_url: url::Url = url_str.parse().map_err(|_| ConfigError::Validation {
        field: "endpoints_url".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    Ok(SourceConfig {
        base_url,
        instance: profile
            .instance
            .clone()
            .unwrap_or_else(|| defaults.instance.clone()),
        tls: TlsVerification::SystemDefaults,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

/// Build a `ReconcileConfig` from a profile and global defaults.
pub fn profile_to_reconcile_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ReconcileConfig, ConfigError> {
    let config = ReconcileConfig {
        acl_name: profile.acl.clone(),
        version_commit: profile.version_commit.unwrap_or(defaults.version_commit),
        state_path: profile.state_file.clone().unwrap_or_else(default_state_path),
    };
    config.validate().map_err(|e| ConfigError::Validation {
        field: "acl".into(),
        reason: e.to_string(),
    })?;
    Ok(config)
}
