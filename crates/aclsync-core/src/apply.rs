// ── Transactional access list changes ──
//
// Each non-empty batch of rules is staged in a named configuration session:
// one request per rule, then resequence, then commit. A failure anywhere in
// that sequence discards the session so nothing half-applied is left pending.

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{CanonicalRule, Protocol};
use crate::session::{CommandBatch, DeviceSession};

const SESSION_PREFIX: &str = "ACL-UPDATE-";
const PERSIST: &str = "copy running-config startup-config";

/// Whether an ACE is being added or taken away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AceAction {
    Permit,
    Remove,
}

/// Render the access list line for `rule`.
///
/// ```
/// use aclsync_core::{AceAction, CanonicalRule, Protocol, render_ace};
///
/// let rule = CanonicalRule::new("13.107.64.0/18", Protocol::Udp, "3478,3479");
/// assert_eq!(render_ace(&rule, AceAction::Permit), "permit udp any 13.107.64.0/18 eq 3478 3479");
/// assert_eq!(render_ace(&rule, AceAction::Remove), "no permit udp any 13.107.64.0/18 eq 3478 3479");
/// ```
pub fn render_ace(rule: &CanonicalRule, action: AceAction) -> String {
    let line = match rule.protocol {
        Protocol::Ip => format!("permit ip any {}", rule.prefix),
        Protocol::Tcp | Protocol::Udp => format!(
            "permit {} any {} eq {}",
            rule.protocol,
            rule.prefix,
            rule.ports.replace(',', " ")
        ),
    };
    match action {
        AceAction::Permit => line,
        AceAction::Remove => format!("no {line}"),
    }
}

/// Session name derived from the wall clock, second resolution.
pub fn session_name(now: DateTime<Local>) -> String {
    format!("{SESSION_PREFIX}{}", now.format("%Y%m%d%H%M%S"))
}

/// A committed configuration session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedBatch {
    pub session: String,
    /// Access list lines issued, in order.
    pub commands: Vec<String>,
}

/// Stages rule changes against one access list.
#[derive(Debug)]
pub struct ConfigApplier<'a, D> {
    session: &'a D,
    acl_name: &'a str,
}

impl<'a, D: DeviceSession> ConfigApplier<'a, D> {
    pub fn new(session: &'a D, acl_name: &'a str) -> Self {
        Self { session, acl_name }
    }

    /// Add `rules`. Returns `None` without touching the switch if empty.
    pub async fn apply_additions(
        &self,
        rules: &[CanonicalRule],
    ) -> Result<Option<AppliedBatch>, CoreError> {
        self.apply(rules, AceAction::Permit).await
    }

    /// Remove `rules`. Returns `None` without touching the switch if empty.
    pub async fn apply_removals(
        &self,
        rules: &[CanonicalRule],
    ) -> Result<Option<AppliedBatch>, CoreError> {
        self.apply(rules, AceAction::Remove).await
    }

    /// Save the running configuration to startup.
    pub async fn persist(&self) -> Result<(), CoreError> {
        self.session
            .run_commands(&CommandBatch::privileged().command(PERSIST))
            .await?;
        info!("running configuration saved");
        Ok(())
    }

    async fn apply(
        &self,
        rules: &[CanonicalRule],
        action: AceAction,
    ) -> Result<Option<AppliedBatch>, CoreError> {
        if rules.is_empty() {
            debug!(acl = self.acl_name, ?action, "nothing to apply");
            return Ok(None);
        }

        let session = session_name(Local::now());
        let lines: Vec<String> = rules.iter().map(|r| render_ace(r, action)).collect();
        info!(acl = self.acl_name, %session, count = lines.len(), ?action, "opening configuration session");

        if let Err(err) = self.stage(&session, &lines).await {
            self.discard(&session).await;
            return Err(err);
        }

        info!(acl = self.acl_name, %session, "configuration session committed");
        Ok(Some(AppliedBatch {
            session,
            commands: lines,
        }))
    }

    async fn stage(&self, session: &str, lines: &[String]) -> Result<(), CoreError> {
        let configure = format!("configure session {session}");
        let acl = format!("ip access-list {}", self.acl_name);

        for line in lines {
            let batch = CommandBatch::privileged()
                .command(configure.as_str())
                .command(acl.as_str())
                .command(line.as_str());
            self.session.run_commands(&batch).await?;
            debug!(%session, command = %line, "ACE staged");
        }

        let resequence = CommandBatch::privileged()
            .command(configure.as_str())
            .command(acl)
            .command("resequence");
        self.session.run_commands(&resequence).await?;

        let commit = CommandBatch::privileged().command(format!("{configure} commit"));
        self.session.run_commands(&commit).await?;
        Ok(())
    }

    async fn discard(&self, session: &str) {
        let abort = CommandBatch::privileged().command(format!("no configure session {session}"));
        match self.session.run_commands(&abort).await {
            Ok(_) => warn!(%session, "configuration session discarded"),
            Err(e) => warn!(%session, error = %e, "failed to discard configuration session"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::session::BatchResponse;

    #[derive(Default)]
    struct Recorder {
        batches: Mutex<Vec<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn failing_on(command: &'static str) -> Self {
            Self {
                fail_on: Some(command),
                ..Self::default()
            }
        }

        fn batches(&self) -> Vec<Vec<String>> {
            self.batches.lock().unwrap().clone()
        }
    }

    impl DeviceSession for Recorder {
        async fn run_commands(&self, batch: &CommandBatch) -> Result<BatchResponse, CoreError> {
            self.batches.lock().unwrap().push(batch.commands().to_vec());
            if let Some(bad) = self.fail_on.filter(|bad| batch.commands().iter().any(|c| c == bad)) {
                return Err(CoreError::DeviceSession {
                    message: format!("'{bad}' rejected"),
                    transient: false,
                });
            }
            BatchResponse::new(batch, vec![json!({}); batch.commands().len()])
        }
    }

    fn rules() -> Vec<CanonicalRule> {
        vec![
            CanonicalRule::new("13.107.6.152/31", Protocol::Tcp, "80,443"),
            CanonicalRule::ip("52.112.0.0/14"),
        ]
    }

    #[test]
    fn renders_port_lists_space_separated() {
        let rule = CanonicalRule::new("13.107.6.152", Protocol::Tcp, "443");
        assert_eq!(
            render_ace(&rule, AceAction::Permit),
            "permit tcp any 13.107.6.152 eq 443"
        );
        assert_eq!(
            render_ace(&CanonicalRule::ip("10.0.0.0/8"), AceAction::Remove),
            "no permit ip any 10.0.0.0/8"
        );
    }

    #[test]
    fn session_names_use_second_resolution() {
        use chrono::TimeZone;
        let at = Local.with_ymd_and_hms(2024, 11, 30, 8, 5, 9).unwrap();
        assert_eq!(session_name(at), "ACL-UPDATE-20241130080509");
    }

    #[tokio::test]
    async fn additions_issue_resequence_commit() {
        let device = Recorder::default();
        let applier = ConfigApplier::new(&device, "REDIRECT");

        let applied = applier.apply_additions(&rules()).await.unwrap().unwrap();

        let batches = device.batches();
        assert_eq!(batches.len(), rules().len() + 2);

        let configure = format!("configure session {}", applied.session);
        assert_eq!(
            batches[0],
            [
                "enable",
                configure.as_str(),
                "ip access-list REDIRECT",
                "permit tcp any 13.107.6.152/31 eq 80 443"
            ]
        );
        assert_eq!(batches[1][3], "permit ip any 52.112.0.0/14");
        assert_eq!(
            batches[2],
            ["enable", configure.as_str(), "ip access-list REDIRECT", "resequence"]
        );
        assert_eq!(batches[3], ["enable".to_owned(), format!("{configure} commit")]);
        assert!(applied.session.starts_with("ACL-UPDATE-"));
        assert_eq!(applied.commands.len(), 2);
    }

    #[tokio::test]
    async fn removals_are_prefixed_with_no() {
        let device = Recorder::default();
        let applier = ConfigApplier::new(&device, "REDIRECT");

        let applied = applier.apply_removals(&rules()[1..]).await.unwrap().unwrap();

        assert_eq!(applied.commands, ["no permit ip any 52.112.0.0/14"]);
        assert_eq!(device.batches()[0][3], "no permit ip any 52.112.0.0/14");
    }

    #[tokio::test]
    async fn empty_batch_opens_no_session() {
        let device = Recorder::default();
        let applier = ConfigApplier::new(&device, "REDIRECT");

        assert!(applier.apply_additions(&[]).await.unwrap().is_none());
        assert!(applier.apply_removals(&[]).await.unwrap().is_none());
        assert!(device.batches().is_empty());
    }

    #[tokio::test]
    async fn failure_stops_and_discards_session() {
        let device = Recorder::failing_on("permit tcp any 13.107.6.152/31 eq 80 443");
        let applier = ConfigApplier::new(&device, "REDIRECT");

        let err = applier.apply_additions(&rules()).await.unwrap_err();
        assert!(matches!(err, CoreError::DeviceSession { .. }));

        let batches = device.batches();
        assert_eq!(batches.len(), 2);
        assert!(batches[1][1].starts_with("no configure session ACL-UPDATE-"));
    }

    #[tokio::test]
    async fn resequence_failure_discards_session() {
        let device = Recorder::failing_on("resequence");
        let applier = ConfigApplier::new(&device, "REDIRECT");

        assert!(applier.apply_additions(&rules()).await.is_err());

        let batches = device.batches();
        assert!(batches.iter().all(|b| !b[1].ends_with(" commit")));
        assert!(batches.last().unwrap()[1].starts_with("no configure session"));
    }

    #[tokio::test]
    async fn persist_copies_running_config() {
        let device = Recorder::default();
        ConfigApplier::new(&device, "REDIRECT").persist().await.unwrap();
        assert_eq!(
            device.batches(),
            vec![vec!["enable".to_owned(), PERSIST.to_owned()]]
        );
    }
}
