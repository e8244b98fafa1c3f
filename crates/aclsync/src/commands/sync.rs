//! `aclsync sync`: one reconciliation pass.

use tracing::debug;

use aclsync_core::{CanonicalRule, PassError, PassOptions, PassOutcome, PassReport};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::commands::plan::render_plan;
use crate::commands::{Context, util};
use crate::error::CliError;
use crate::output::{self, Painter};

pub async fn handle(args: SyncArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let mut reconciler = ctx.reconciler()?;
    let painter = Painter::new(&global.color);
    let structured = output::is_structured(&global.output);

    let opts = PassOptions {
        dry_run: args.dry_run,
        force: args.force,
    };
    let Some(plan) = reconciler.plan(opts).await? else {
        let outcome = PassOutcome::UpToDate {
            version: reconciler.gate().last_version().to_owned(),
        };
        let text =
            output::render_single(&global.output, &outcome, up_to_date_line, up_to_date_line);
        output::print_output(&text, global.quiet);
        return Ok(());
    };

    if !global.quiet && !structured {
        let line = if plan.newer {
            format!(
                "New endpoint list version {} detected (last applied {})",
                plan.version, plan.previous_version
            )
        } else {
            format!("Endpoint list version {} unchanged; forcing a pass", plan.version)
        };
        eprintln!("{line}");
    }

    if args.dry_run {
        let text = if structured {
            let outcome = PassOutcome::Planned(plan);
            output::render_single(&global.output, &outcome, |_| String::new(), |_| String::new())
        } else {
            render_plan(&plan, global.verbose > 0, global)
        };
        output::print_output(&text, global.quiet);
        return Ok(());
    }

    if !plan.delta.is_empty() {
        let prompt = format!(
            "Add {} and remove {} entries in access list {}?",
            plan.delta.to_add.len(),
            plan.delta.to_remove.len(),
            ctx.resolved.reconcile.acl_name
        );
        if !util::confirm(&prompt, "sync", global.yes)? {
            eprintln!("Aborted; the switch was not changed.");
            return Ok(());
        }
    }

    debug!(version = %plan.version, "applying plan");
    let report = match reconciler.apply(plan).await {
        Ok(report) => report,
        Err(err) => return Err(report_partial(err, painter, global)),
    };

    let outcome = PassOutcome::Applied(report);
    let text = output::render_single(
        &global.output,
        &outcome,
        |o| report_lines(o, painter, global.verbose > 0),
        |o| report_lines(o, Painter::plain(), global.verbose > 0),
    );
    output::print_output(&text, global.quiet);
    Ok(())
}

/// Print what the switch committed before `err`, then hand back the error.
fn report_partial(err: PassError, painter: Painter, global: &GlobalOpts) -> CliError {
    if let Some(partial) = &err.partial {
        let text = if output::is_structured(&global.output) {
            let empty = |_: &PassReport| String::new();
            output::render_single(&global.output, &**partial, empty, empty)
        } else {
            committed_lines(partial, painter)
        };
        output::print_output(&text, global.quiet);
    }
    err.source.into()
}

fn up_to_date_line(outcome: &PassOutcome) -> String {
    match outcome {
        PassOutcome::UpToDate { version } => {
            format!("Endpoint list is up-to-date (version {version})")
        }
        _ => String::new(),
    }
}

fn skip_line(rule: &CanonicalRule) -> String {
    format!(
        "ACE exists for {} {} ports {}...skipping entry",
        rule.prefix, rule.protocol, rule.ports
    )
}

/// Human-readable account of an applied pass.
fn report_lines(outcome: &PassOutcome, painter: Painter, show_unchanged: bool) -> String {
    let PassOutcome::Applied(report) = outcome else {
        return String::new();
    };
    let mut lines = Vec::new();

    if show_unchanged {
        lines.extend(
            report
                .delta
                .unchanged
                .iter()
                .map(|r| painter.muted(&skip_line(r))),
        );
    }

    push_batch(&mut lines, report, BatchKind::Additions, painter);
    push_batch(&mut lines, report, BatchKind::Removals, painter);

    if report.fully_updated() {
        lines.push(painter.success("ACL configuration updated and saved."));
    }
    lines.join("\n")
}

/// Only the entries a committed session changed.
fn committed_lines(report: &PassReport, painter: Painter) -> String {
    let added = report.additions.iter().flat_map(|b| &b.commands);
    let removed = report.removals.iter().flat_map(|b| &b.commands);
    added
        .map(|c| painter.added(&format!("New ACE created: {c}")))
        .chain(removed.map(|c| painter.removed(&format!("Old ACE removed: {c}"))))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone, Copy)]
enum BatchKind {
    Additions,
    Removals,
}

fn push_batch(lines: &mut Vec<String>, report: &PassReport, kind: BatchKind, painter: Painter) {
    let (batch, empty) = match kind {
        BatchKind::Additions => (&report.additions, "No new ACL entries needed."),
        BatchKind::Removals => (&report.removals, "No ACL entries require removal"),
    };
    let Some(batch) = batch else {
        lines.push(empty.to_owned());
        return;
    };
    for command in &batch.commands {
        lines.push(match kind {
            BatchKind::Additions => painter.added(&format!("New ACE created: {command}")),
            BatchKind::Removals => painter.removed(&format!("Old ACE removed: {command}")),
        });
    }
}

#[cfg(test)]
mod tests {
    use aclsync_core::{AppliedBatch, Delta, Protocol};

    use super::*;

    fn report(additions: bool, removals: bool) -> PassOutcome {
        let batch = |cmd: &str| AppliedBatch {
            session: "ACL-UPDATE-20241130080509".into(),
            commands: vec![cmd.to_owned()],
        };
        PassOutcome::Applied(PassReport {
            previous_version: "0000000001".into(),
            version: "0000000002".into(),
            delta: Delta {
                unchanged: vec![CanonicalRule::new("10.0.0.0/8", Protocol::Tcp, "443")],
                ..Delta::default()
            },
            additions: additions.then(|| batch("permit tcp any 13.107.6.152 eq 443")),
            removals: removals.then(|| batch("no permit ip any 52.112.0.0/14")),
            persisted: additions || removals,
            version_committed: true,
        })
    }

    #[test]
    fn additions_only_has_no_final_confirmation() {
        let text = report_lines(&report(true, false), Painter::plain(), false);
        assert_eq!(
            text,
            "New ACE created: permit tcp any 13.107.6.152 eq 443\nNo ACL entries require removal"
        );
    }

    #[test]
    fn both_batches_confirm_saved_config() {
        let text = report_lines(&report(true, true), Painter::plain(), false);
        assert!(text.contains("Old ACE removed: no permit ip any 52.112.0.0/14"));
        assert!(text.ends_with("ACL configuration updated and saved."));
    }

    #[test]
    fn nothing_applied() {
        let text = report_lines(&report(false, false), Painter::plain(), false);
        assert_eq!(text, "No new ACL entries needed.\nNo ACL entries require removal");
    }

    #[test]
    fn partial_failure_lists_only_committed_entries() {
        let PassOutcome::Applied(mut report) = report(true, false) else {
            unreachable!()
        };
        report.persisted = false;
        let text = committed_lines(&report, Painter::plain());
        assert_eq!(text, "New ACE created: permit tcp any 13.107.6.152 eq 443");
    }

    #[test]
    fn verbose_lists_skipped_entries() {
        let text = report_lines(&report(false, false), Painter::plain(), true);
        assert!(text.starts_with("ACE exists for 10.0.0.0/8 tcp ports 443...skipping entry"));
    }
}
