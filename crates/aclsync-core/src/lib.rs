// aclsync-core: Reconciliation engine between a published endpoint list and
// a switch access list.
//
// One pass runs strictly in sequence: version gate -> endpoint fetch ->
// device listing -> diff -> apply additions -> apply removals -> persist.
// Callers must not run two passes against the same switch and access list
// at the same time; nothing in this crate locks.

pub mod apply;
pub mod config;
pub mod device;
pub mod diff;
pub mod error;
pub mod mask;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod session;
pub mod source;
pub mod version;

// ── Primary re-exports ──────────────────────────────────────────────
pub use apply::{AceAction, AppliedBatch, ConfigApplier, render_ace, session_name};
pub use config::{DeviceConfig, ReconcileConfig, SourceConfig, TlsVerification, VersionCommit};
pub use device::{fetch_active, parse_active};
pub use diff::diff;
pub use error::CoreError;
pub use mask::{mask_for, prefix_length};
pub use model::{CanonicalRule, Delta, Protocol};
pub use normalize::normalize;
pub use reconcile::{PassError, PassOptions, PassOutcome, PassReport, Plan, Reconciler};
pub use session::{BatchResponse, CommandBatch, DeviceSession};
pub use source::EndpointSource;
pub use version::{
    FileVersionStore, MemoryVersionStore, SENTINEL_VERSION, VersionGate, VersionState,
    VersionStore,
};

pub use aclsync_api::endpoints::EndpointSet;
pub use aclsync_api::{EapiClient, EndpointsClient};
