//! CLI configuration: thin wrapper around `aclsync_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--device, --acl, --timeout, ...).

use aclsync_core::{DeviceConfig, ReconcileConfig, SourceConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use aclsync_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
};

/// Everything a command needs to talk to the endpoint service and the switch.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub profile: Profile,
    pub source: SourceConfig,
    pub reconcile: ReconcileConfig,
}

impl Resolved {
    /// Resolve switch credentials and connection settings.
    ///
    /// Kept separate so commands that never contact the switch do not
    /// require credentials.
    pub fn device(&self, cfg: &Config) -> Result<DeviceConfig, CliError> {
        aclsync_config::profile_to_device_config(&self.profile, &self.profile_name, &cfg.defaults)
            .map_err(CliError::from)
    }
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Merge the active profile with flag overrides.
///
/// Without a stored profile, `--device` and `--acl` alone are enough;
/// credentials then come from the environment or the keyring.
pub fn effective_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    let profile_name = active_profile_name(global, cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(p) => p.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None if global.device.is_none() => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        None => Profile::default(),
    };

    // Flag > env > profile
    if let Some(ref device) = global.device {
        profile.device.clone_from(device);
    }
    if let Some(ref acl) = global.acl {
        profile.acl.clone_from(acl);
    }
    if global.username.is_some() {
        profile.username.clone_from(&global.username);
    }
    if global.instance.is_some() {
        profile.instance.clone_from(&global.instance);
    }
    if global.endpoints_url.is_some() {
        profile.endpoints_url.clone_from(&global.endpoints_url);
    }
    if global.state_file.is_some() {
        profile.state_file.clone_from(&global.state_file);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }

    if profile.acl.is_empty() {
        return Err(CliError::Validation {
            field: "acl".into(),
            reason: format!("no access list set for profile '{profile_name}'; pass --acl"),
        });
    }

    Ok((profile_name, profile))
}

/// Resolve the endpoint source and reconcile settings for the active profile.
pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<Resolved, CliError> {
    let (profile_name, profile) = effective_profile(global, cfg)?;
    let source = aclsync_config::profile_to_source_config(&profile, &cfg.defaults)?;
    let reconcile = aclsync_config::profile_to_reconcile_config(&profile, &cfg.defaults)?;
    Ok(Resolved {
        profile_name,
        profile,
        source,
        reconcile,
    })
}
