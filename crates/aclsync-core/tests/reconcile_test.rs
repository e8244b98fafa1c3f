#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use aclsync_core::{
    BatchResponse, CanonicalRule, CommandBatch, CoreError, DeviceSession, EndpointSet,
    EndpointSource, MemoryVersionStore, PassOptions, PassOutcome, Protocol, ReconcileConfig,
    Reconciler, VersionCommit, VersionGate, VersionState,
};

const CLIENT_ID: &str = "b10c5ed1-bad1-445f-b386-b919946339a7";

// ── Fakes ───────────────────────────────────────────────────────────

struct FakeSource {
    version: String,
    sets: Vec<EndpointSet>,
    endpoints_down: bool,
    version_calls: AtomicUsize,
    endpoint_calls: AtomicUsize,
}

impl FakeSource {
    fn new(version: &str, sets: Vec<EndpointSet>) -> Self {
        Self {
            version: version.into(),
            sets,
            endpoints_down: false,
            version_calls: AtomicUsize::new(0),
            endpoint_calls: AtomicUsize::new(0),
        }
    }

    /// Publishes a version but fails to serve the endpoint list.
    fn endpoints_unavailable(mut self) -> Self {
        self.endpoints_down = true;
        self
    }
}

impl EndpointSource for FakeSource {
    async fn version(&self, instance: &str, client_request_id: &str) -> Result<String, CoreError> {
        assert_eq!(instance, "Worldwide");
        assert_eq!(client_request_id, CLIENT_ID);
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.version.clone())
    }

    async fn endpoints(
        &self,
        _instance: &str,
        _client_request_id: &str,
    ) -> Result<Vec<EndpointSet>, CoreError> {
        self.endpoint_calls.fetch_add(1, Ordering::SeqCst);
        if self.endpoints_down {
            return Err(CoreError::SourceUnavailable {
                message: "503 Service Unavailable".into(),
                transient: true,
            });
        }
        Ok(self.sets.clone())
    }
}

/// Answers `show ip access-lists` from a canned listing and records everything.
struct FakeSwitch {
    listing: Value,
    batches: Mutex<Vec<Vec<String>>>,
    fail_on_prefix: Option<&'static str>,
}

impl FakeSwitch {
    fn new(entries: Value) -> Self {
        Self {
            listing: json!({ "aclList": [{ "name": "REDIRECT", "sequence": entries }] }),
            batches: Mutex::new(Vec::new()),
            fail_on_prefix: None,
        }
    }

    fn failing_on(mut self, prefix: &'static str) -> Self {
        self.fail_on_prefix = Some(prefix);
        self
    }

    fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    fn mutating_batches(&self) -> Vec<Vec<String>> {
        self.batches()
            .into_iter()
            .filter(|b| !b[1].starts_with("show "))
            .collect()
    }
}

impl DeviceSession for FakeSwitch {
    async fn run_commands(&self, batch: &CommandBatch) -> Result<BatchResponse, CoreError> {
        self.batches.lock().unwrap().push(batch.commands().to_vec());
        if let Some(prefix) = self.fail_on_prefix {
            if batch.commands().iter().any(|c| c.starts_with(prefix)) {
                return Err(CoreError::DeviceSession {
                    message: "CLI command failed".into(),
                    transient: false,
                });
            }
        }
        let results = batch
            .commands()
            .iter()
            .map(|c| {
                if c.starts_with("show ip access-lists") {
                    self.listing.clone()
                } else {
                    json!({})
                }
            })
            .collect();
        BatchResponse::new(batch, results)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn allow(ips: &[&str], tcp_ports: Option<&str>) -> EndpointSet {
    EndpointSet {
        id: Some(1),
        category: "Allow".into(),
        ips: Some(ips.iter().map(|s| (*s).to_owned()).collect()),
        tcp_ports: tcp_ports.map(str::to_owned),
        ..EndpointSet::default()
    }
}

fn tcp_entry(seq: u32, ip: &str, mask: u64, ports: &[u32]) -> Value {
    json!({
        "sequenceNumber": seq,
        "text": format!("permit tcp any {ip} eq ..."),
        "ruleFilter": {
            "protocol": 6,
            "destination": { "ip": ip, "mask": mask },
            "dstPort": { "oper": "eq", "ports": ports }
        }
    })
}

fn store_at(version: &str) -> MemoryVersionStore {
    MemoryVersionStore::with_state(VersionState {
        client_request_id: CLIENT_ID.into(),
        last_version: version.into(),
    })
}

fn reconciler(
    source: FakeSource,
    switch: FakeSwitch,
    store: &MemoryVersionStore,
    commit: VersionCommit,
) -> Reconciler<FakeSource, FakeSwitch, MemoryVersionStore> {
    let mut config = ReconcileConfig::new("REDIRECT");
    config.version_commit = commit;
    Reconciler::new(
        source,
        switch,
        VersionGate::open(store.clone()).unwrap(),
        config,
    )
}

// ── Passes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn new_version_adds_missing_rule_and_persists() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152"], Some("443"))]);
    let mut rec = reconciler(source, FakeSwitch::new(json!([])), &store, VersionCommit::BeforeApply);

    let outcome = rec.run(PassOptions::default()).await.unwrap();

    let PassOutcome::Applied(report) = outcome else {
        panic!("expected an applied pass");
    };
    assert_eq!(
        report.delta.to_add,
        vec![CanonicalRule::new("13.107.6.152", Protocol::Tcp, "443")]
    );
    assert!(report.removals.is_none());
    assert!(report.persisted);
    assert!(!report.fully_updated());

    let session = report.additions.unwrap().session;
    let configure = format!("configure session {session}");
    assert_eq!(
        rec.device().mutating_batches(),
        vec![
            vec![
                "enable".to_owned(),
                configure.clone(),
                "ip access-list REDIRECT".to_owned(),
                "permit tcp any 13.107.6.152 eq 443".to_owned(),
            ],
            vec![
                "enable".to_owned(),
                configure.clone(),
                "ip access-list REDIRECT".to_owned(),
                "resequence".to_owned(),
            ],
            vec!["enable".to_owned(), format!("{configure} commit")],
            vec![
                "enable".to_owned(),
                "copy running-config startup-config".to_owned()
            ],
        ]
    );
    assert_eq!(store.snapshot().unwrap().last_version, "0000000002");
}

#[tokio::test]
async fn unchanged_version_touches_nothing() {
    let store = store_at("0000000002");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152"], Some("443"))]);
    let mut rec = reconciler(source, FakeSwitch::new(json!([])), &store, VersionCommit::BeforeApply);

    let outcome = rec.run(PassOptions::default()).await.unwrap();

    assert!(matches!(outcome, PassOutcome::UpToDate { ref version } if version == "0000000002"));
    assert_eq!(rec.source().version_calls.load(Ordering::SeqCst), 1);
    assert_eq!(rec.source().endpoint_calls.load(Ordering::SeqCst), 0);
    assert!(rec.device().batches().is_empty());
}

#[tokio::test]
async fn additions_and_removals_both_run() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152/31"], Some("443"))]);
    let switch = FakeSwitch::new(json!([tcp_entry(10, "52.112.0.0", 4_294_705_152, &[443])]));
    let mut rec = reconciler(source, switch, &store, VersionCommit::BeforeApply);

    let PassOutcome::Applied(report) = rec.run(PassOptions::default()).await.unwrap() else {
        panic!("expected an applied pass");
    };

    assert!(report.fully_updated());
    assert_eq!(
        report.removals.unwrap().commands,
        ["no permit tcp any 52.112.0.0/14 eq 443"]
    );
    let persists = rec
        .device()
        .batches()
        .iter()
        .filter(|b| b[1] == "copy running-config startup-config")
        .count();
    assert_eq!(persists, 1);
}

#[tokio::test]
async fn matching_device_needs_no_session() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152/31"], Some("443"))]);
    let switch = FakeSwitch::new(json!([tcp_entry(10, "13.107.6.152", 4_294_967_294, &[443])]));
    let mut rec = reconciler(source, switch, &store, VersionCommit::BeforeApply);

    let PassOutcome::Applied(report) = rec.run(PassOptions::default()).await.unwrap() else {
        panic!("expected an applied pass");
    };

    assert!(report.delta.is_empty());
    assert_eq!(report.delta.unchanged.len(), 1);
    assert!(!report.persisted);
    assert!(rec.device().mutating_batches().is_empty());
    assert_eq!(store.snapshot().unwrap().last_version, "0000000002");
}

#[tokio::test]
async fn dry_run_changes_nothing() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152"], Some("443"))]);
    let mut rec = reconciler(source, FakeSwitch::new(json!([])), &store, VersionCommit::BeforeApply);

    let outcome = rec
        .run(PassOptions {
            dry_run: true,
            force: false,
        })
        .await
        .unwrap();

    let PassOutcome::Planned(plan) = outcome else {
        panic!("expected a plan");
    };
    assert!(plan.newer);
    assert_eq!(plan.delta.to_add.len(), 1);
    assert!(rec.device().mutating_batches().is_empty());
    assert_eq!(store.snapshot().unwrap().last_version, "0000000001");
}

#[tokio::test]
async fn force_reconciles_without_moving_version_back() {
    let store = store_at("0000000005");
    let source = FakeSource::new("0000000003", vec![allow(&["13.107.6.152"], Some("443"))]);
    let mut rec = reconciler(source, FakeSwitch::new(json!([])), &store, VersionCommit::BeforeApply);

    let outcome = rec
        .run(PassOptions {
            dry_run: false,
            force: true,
        })
        .await
        .unwrap();

    let PassOutcome::Applied(report) = outcome else {
        panic!("expected an applied pass");
    };
    assert!(report.additions.is_some());
    assert!(!report.version_committed);
    assert_eq!(store.snapshot().unwrap().last_version, "0000000005");
}

#[tokio::test]
async fn failed_apply_keeps_version_with_after_apply() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152"], Some("443"))]);
    let switch = FakeSwitch::new(json!([])).failing_on("permit tcp");
    let mut rec = reconciler(source, switch, &store, VersionCommit::AfterApply);

    let err = rec.run(PassOptions::default()).await.unwrap_err();

    assert!(matches!(err.source, CoreError::DeviceSession { .. }));
    assert!(err.partial.is_none());
    assert_eq!(store.snapshot().unwrap().last_version, "0000000001");
    let batches = rec.device().batches();
    assert!(
        batches
            .iter()
            .all(|b| b[1] != "copy running-config startup-config")
    );
    assert!(batches.last().unwrap()[1].starts_with("no configure session"));
}

#[tokio::test]
async fn failed_apply_burns_version_with_before_apply() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152"], Some("443"))]);
    let switch = FakeSwitch::new(json!([])).failing_on("permit tcp");
    let mut rec = reconciler(source, switch, &store, VersionCommit::BeforeApply);

    assert!(rec.run(PassOptions::default()).await.is_err());
    assert_eq!(store.snapshot().unwrap().last_version, "0000000002");
}

#[tokio::test]
async fn unparseable_device_state_aborts_before_mutation() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152"], Some("443"))]);
    let switch = FakeSwitch::new(json!([tcp_entry(10, "10.0.0.0", 7, &[443])]));
    let mut rec = reconciler(source, switch, &store, VersionCommit::BeforeApply);

    let err = rec.run(PassOptions::default()).await.unwrap_err();

    assert!(err.source.is_device_state());
    assert!(rec.device().mutating_batches().is_empty());
    assert_eq!(store.snapshot().unwrap().last_version, "0000000002");
}

#[tokio::test]
async fn unparseable_device_state_keeps_version_with_after_apply() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152"], Some("443"))]);
    let switch = FakeSwitch::new(json!([tcp_entry(10, "10.0.0.0", 7, &[443])]));
    let mut rec = reconciler(source, switch, &store, VersionCommit::AfterApply);

    assert!(rec.run(PassOptions::default()).await.is_err());
    assert_eq!(store.snapshot().unwrap().last_version, "0000000001");
}

#[tokio::test]
async fn new_version_is_recorded_before_endpoint_fetch() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", Vec::new()).endpoints_unavailable();
    let mut rec = reconciler(source, FakeSwitch::new(json!([])), &store, VersionCommit::default());

    let err = rec.run(PassOptions::default()).await.unwrap_err();

    assert!(matches!(err.source, CoreError::SourceUnavailable { .. }));
    assert!(err.partial.is_none());
    assert!(rec.device().batches().is_empty());
    assert_eq!(store.snapshot().unwrap().last_version, "0000000002");
}

#[tokio::test]
async fn removals_failure_reports_committed_additions() {
    let store = store_at("0000000001");
    let source = FakeSource::new("0000000002", vec![allow(&["13.107.6.152/31"], Some("443"))]);
    let switch = FakeSwitch::new(json!([tcp_entry(10, "52.112.0.0", 4_294_705_152, &[443])]))
        .failing_on("no permit");
    let mut rec = reconciler(source, switch, &store, VersionCommit::BeforeApply);

    let err = rec.run(PassOptions::default()).await.unwrap_err();

    assert!(matches!(err.source, CoreError::DeviceSession { .. }));
    let partial = err.partial.unwrap();
    assert_eq!(
        partial.additions.unwrap().commands,
        ["permit tcp any 13.107.6.152/31 eq 443"]
    );
    assert!(partial.removals.is_none());
    assert!(!partial.persisted);

    // Additions stay committed; the removals session is discarded; no save.
    let batches = rec.device().batches();
    let commits = batches
        .iter()
        .filter(|b| b.len() == 2 && b[1].ends_with(" commit"))
        .count();
    assert_eq!(commits, 1);
    assert!(batches.last().unwrap()[1].starts_with("no configure session"));
    assert!(
        batches
            .iter()
            .all(|b| b[1] != "copy running-config startup-config")
    );
}
