// ── Reconciliation pass ──
//
// version gate -> endpoint fetch -> device listing -> diff -> apply.
// `plan` never touches the switch configuration; under `BeforeApply` it
// records a newer version as soon as it is observed. `apply` is the only
// step that mutates the switch.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use aclsync_api::endpoints::DEFAULT_INSTANCE;

use crate::apply::{AppliedBatch, ConfigApplier};
use crate::config::{ReconcileConfig, VersionCommit};
use crate::device::fetch_active;
use crate::diff::diff;
use crate::error::CoreError;
use crate::model::Delta;
use crate::normalize::normalize;
use crate::session::DeviceSession;
use crate::source::EndpointSource;
use crate::version::{VersionGate, VersionStore};

/// Per-pass switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassOptions {
    /// Compute the delta but change nothing.
    pub dry_run: bool,
    /// Reconcile even if the remote version is not newer.
    pub force: bool,
}

/// A computed delta awaiting application.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub previous_version: String,
    pub version: String,
    /// `true` if `version` is newer than `previous_version`.
    pub newer: bool,
    /// `version` was already written to the version store while planning.
    pub version_committed: bool,
    pub delta: Delta,
}

/// Result of applying a [`Plan`].
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub previous_version: String,
    pub version: String,
    pub delta: Delta,
    pub additions: Option<AppliedBatch>,
    pub removals: Option<AppliedBatch>,
    pub persisted: bool,
    pub version_committed: bool,
}

impl PassReport {
    /// Both an additions and a removals session ran and the config was saved.
    pub fn fully_updated(&self) -> bool {
        self.additions.is_some() && self.removals.is_some() && self.persisted
    }
}

/// A failed pass, with whatever the switch had already committed.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct PassError {
    /// Sessions committed before the failure. `None` if the switch was left
    /// unchanged.
    pub partial: Option<Box<PassReport>>,
    #[source]
    pub source: CoreError,
}

impl From<CoreError> for PassError {
    fn from(source: CoreError) -> Self {
        Self {
            partial: None,
            source,
        }
    }
}

/// What a pass ended with.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassOutcome {
    /// Remote version not newer; nothing fetched from the endpoint list or switch.
    UpToDate { version: String },
    Planned(Plan),
    Applied(PassReport),
}

/// Drives passes for one switch and access list.
#[derive(Debug)]
pub struct Reconciler<E, D, S> {
    source: E,
    device: D,
    gate: VersionGate<S>,
    config: ReconcileConfig,
    instance: String,
}

impl<E, D, S> Reconciler<E, D, S>
where
    E: EndpointSource,
    D: DeviceSession,
    S: VersionStore,
{
    pub fn new(source: E, device: D, gate: VersionGate<S>, config: ReconcileConfig) -> Self {
        Self {
            source,
            device,
            gate,
            config,
            instance: DEFAULT_INSTANCE.to_owned(),
        }
    }

    /// Service instance to query, e.g. `USGovDoD`.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn gate(&self) -> &VersionGate<S> {
        &self.gate
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn source(&self) -> &E {
        &self.source
    }

    /// Latest published version, without consulting the gate.
    pub async fn remote_version(&self) -> Result<String, CoreError> {
        self.source
            .version(&self.instance, self.gate.client_request_id())
            .await
    }

    /// Run one full pass.
    pub async fn run(&mut self, opts: PassOptions) -> Result<PassOutcome, PassError> {
        let Some(plan) = self.plan(opts).await? else {
            return Ok(PassOutcome::UpToDate {
                version: self.gate.last_version().to_owned(),
            });
        };
        if opts.dry_run {
            return Ok(PassOutcome::Planned(plan));
        }
        self.apply(plan).await.map(PassOutcome::Applied)
    }

    /// Compute the delta. `None` if the gate is closed and `force` is not set.
    ///
    /// Under [`VersionCommit::BeforeApply`] a newer version is committed
    /// here, before the endpoint list is fetched, unless `dry_run` is set.
    #[instrument(skip(self), fields(acl = %self.config.acl_name))]
    pub async fn plan(&mut self, opts: PassOptions) -> Result<Option<Plan>, CoreError> {
        self.config.validate()?;

        let version = self.remote_version().await?;
        let previous_version = self.gate.last_version().to_owned();
        let newer = self.gate.should_reconcile(&version);
        if !newer && !opts.force {
            info!(%version, last = %previous_version, "endpoint list unchanged");
            return Ok(None);
        }
        info!(%version, last = %previous_version, forced = !newer, "reconciling");

        let version_committed = newer
            && !opts.dry_run
            && self.config.version_commit == VersionCommit::BeforeApply;
        if version_committed {
            self.gate.commit(&version)?;
            debug!(%version, "version committed before fetching endpoints");
        }

        let sets = self
            .source
            .endpoints(&self.instance, self.gate.client_request_id())
            .await?;
        let desired = normalize(&sets);
        let actual = fetch_active(&self.device, &self.config.acl_name).await?;
        let delta = diff(&desired, &actual);

        for rule in &delta.unchanged {
            debug!(%rule, "ACE exists, skipping entry");
        }

        Ok(Some(Plan {
            previous_version,
            version,
            newer,
            version_committed,
            delta,
        }))
    }

    /// Apply `plan`: additions, then removals, then persist if either ran.
    ///
    /// Additions and removals are separate sessions. A removals failure does
    /// not roll back committed additions; they are returned in
    /// [`PassError::partial`].
    #[instrument(skip_all, fields(acl = %self.config.acl_name, version = %plan.version))]
    pub async fn apply(&mut self, plan: Plan) -> Result<PassReport, PassError> {
        let mut report = PassReport {
            previous_version: plan.previous_version,
            version: plan.version,
            delta: plan.delta,
            additions: None,
            removals: None,
            persisted: false,
            version_committed: plan.version_committed,
        };

        let applier = ConfigApplier::new(&self.device, &self.config.acl_name);
        report.additions = applier.apply_additions(&report.delta.to_add).await?;
        if report.additions.is_none() {
            info!("no new ACL entries needed");
        }

        match applier.apply_removals(&report.delta.to_remove).await {
            Ok(removals) => report.removals = removals,
            Err(source) => return Err(partial_failure(report, source)),
        }
        if report.removals.is_none() {
            info!("no ACL entries require removal");
        }

        if report.additions.is_some() || report.removals.is_some() {
            if let Err(source) = applier.persist().await {
                return Err(partial_failure(report, source));
            }
            report.persisted = true;
        }

        if plan.newer && self.config.version_commit == VersionCommit::AfterApply {
            self.gate.commit(&report.version)?;
            report.version_committed = true;
        }

        Ok(report)
    }
}

/// Wrap `source`, keeping `report` only if a session was committed.
fn partial_failure(report: PassReport, source: CoreError) -> PassError {
    let committed = report.additions.is_some() || report.removals.is_some();
    if committed {
        warn!(
            additions = report.additions.as_ref().map_or(0, |b| b.commands.len()),
            removals = report.removals.as_ref().map_or(0, |b| b.commands.len()),
            "pass failed after committing changes; they are not rolled back"
        );
    }
    PassError {
        partial: committed.then(|| Box::new(report)),
        source,
    }
}
