//! `aclsync plan`: fetch both sides and show the delta.

use serde::Serialize;
use tabled::Tabled;

use aclsync_core::{AceAction, CanonicalRule, PassOptions, Plan, render_ace};

use crate::cli::{GlobalOpts, PlanArgs};
use crate::commands::Context;
use crate::error::CliError;
use crate::output::{self, Painter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Add,
    Remove,
    Keep,
}

impl Change {
    fn marker(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Remove => "-",
            Self::Keep => "=",
        }
    }
}

/// One line of the delta as shown to the user.
#[derive(Debug, Serialize)]
pub struct RuleChange<'a> {
    pub change: Change,
    #[serde(flatten)]
    pub rule: &'a CanonicalRule,
}

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Prefix")]
    prefix: String,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "Command")]
    command: String,
}

fn to_row(change: &RuleChange<'_>) -> ChangeRow {
    ChangeRow {
        marker: change.change.marker(),
        prefix: change.rule.prefix.clone(),
        protocol: change.rule.protocol.to_string(),
        ports: change.rule.ports.clone(),
        command: match change.change {
            Change::Add => render_ace(change.rule, AceAction::Permit),
            Change::Remove => render_ace(change.rule, AceAction::Remove),
            Change::Keep => String::new(),
        },
    }
}

/// Flatten a plan's delta into display order: additions, removals, kept.
pub fn changes(plan: &Plan, include_unchanged: bool) -> Vec<RuleChange<'_>> {
    let delta = &plan.delta;
    let mut out = Vec::with_capacity(delta.to_add.len() + delta.to_remove.len());
    out.extend(delta.to_add.iter().map(|rule| RuleChange {
        change: Change::Add,
        rule,
    }));
    out.extend(delta.to_remove.iter().map(|rule| RuleChange {
        change: Change::Remove,
        rule,
    }));
    if include_unchanged {
        out.extend(delta.unchanged.iter().map(|rule| RuleChange {
            change: Change::Keep,
            rule,
        }));
    }
    out
}

/// Render a plan in the selected output format.
pub fn render_plan(plan: &Plan, include_unchanged: bool, global: &GlobalOpts) -> String {
    if output::is_structured(&global.output) {
        return output::render_single(&global.output, plan, |_| String::new(), |_| String::new());
    }

    let painter = Painter::new(&global.color);
    let changes = changes(plan, include_unchanged);
    if changes.is_empty() {
        return painter.muted(&format!(
            "No changes: access list matches endpoint list version {}",
            plan.version
        ));
    }

    output::render_list(&global.output, &changes, to_row, |c| {
        let line = format!("{} {}", c.change.marker(), c.rule);
        match c.change {
            Change::Add => painter.added(&line),
            Change::Remove => painter.removed(&line),
            Change::Keep => painter.muted(&line),
        }
    })
}

pub async fn handle(args: PlanArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let mut reconciler = ctx.reconciler()?;

    // Forced: a plan is always computed, whatever the stored version says.
    // Dry: the stored version is never touched.
    let opts = PassOptions {
        dry_run: true,
        force: true,
    };
    let Some(plan) = reconciler.plan(opts).await? else {
        return Ok(());
    };

    if !global.quiet && !output::is_structured(&global.output) {
        eprintln!(
            "Endpoint list version {} (last applied {}), access list {}",
            plan.version, plan.previous_version, ctx.resolved.reconcile.acl_name
        );
    }
    output::print_output(&render_plan(&plan, args.all, global), global.quiet);
    Ok(())
}
