//! Command dispatch: bridges CLI args -> reconciler passes -> output formatting.

pub mod config_cmd;
pub mod plan;
pub mod status;
pub mod sync;
pub mod util;

use aclsync_core::{EapiClient, EndpointsClient, FileVersionStore, Reconciler, VersionGate};

use crate::cli::{Command, GlobalOpts};
use crate::config::{Config, Resolved};
use crate::error::CliError;

/// Loaded config plus the resolved profile for this invocation.
#[derive(Debug)]
pub struct Context {
    pub cfg: Config,
    pub resolved: Resolved,
}

/// A reconciler wired to the live endpoint service, switch, and state file.
pub type LiveReconciler = Reconciler<EndpointsClient, EapiClient, FileVersionStore>;

impl Context {
    /// Open the version gate for the configured state file.
    pub fn gate(&self) -> Result<VersionGate<FileVersionStore>, CliError> {
        let store = FileVersionStore::new(&self.resolved.reconcile.state_path);
        Ok(VersionGate::open(store)?)
    }

    /// Build a reconciler, resolving switch credentials.
    pub fn reconciler(&self) -> Result<LiveReconciler, CliError> {
        let device = self
            .resolved
            .device(&self.cfg)
            .map_err(|e| e.for_profile(&self.resolved.profile_name))?
            .connect()?;
        let source = self.resolved.source.connect()?;
        Ok(Reconciler::new(
            source,
            device,
            self.gate()?,
            self.resolved.reconcile.clone(),
        )
        .with_instance(self.resolved.source.instance.clone()))
    }
}

/// Dispatch a switch-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let result = match cmd {
        Command::Sync(args) => sync::handle(args, ctx, global).await,
        Command::Plan(args) => plan::handle(args, ctx, global).await,
        Command::Status => status::handle(ctx, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    };
    result.map_err(|e| e.for_profile(&ctx.resolved.profile_name))
}
