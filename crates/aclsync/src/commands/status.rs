//! `aclsync status`: local version state against the published version.

use serde::Serialize;

use aclsync_core::EndpointSource;

use crate::cli::GlobalOpts;
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Status {
    profile: String,
    acl: String,
    state_file: String,
    client_request_id: String,
    last_version: String,
    remote_version: String,
    update_available: bool,
}

/// Needs no switch credentials; only the endpoint service is contacted.
pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let gate = ctx.gate()?;
    let source = ctx.resolved.source.connect()?;
    let remote_version =
        EndpointSource::version(&source, &ctx.resolved.source.instance, gate.client_request_id())
            .await?;

    let status = Status {
        profile: ctx.resolved.profile_name.clone(),
        acl: ctx.resolved.reconcile.acl_name.clone(),
        state_file: ctx.resolved.reconcile.state_path.display().to_string(),
        client_request_id: gate.client_request_id().to_owned(),
        last_version: gate.last_version().to_owned(),
        update_available: gate.should_reconcile(&remote_version),
        remote_version,
    };

    let out = output::render_single(&global.output, &status, detail, |s| {
        format!("{}\t{}", s.last_version, s.remote_version)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(s: &Status) -> String {
    let pending = if s.update_available {
        "yes"
    } else {
        "no"
    };
    [
        format!("Profile:         {}", s.profile),
        format!("Access list:     {}", s.acl),
        format!("State file:      {}", s.state_file),
        format!("Client id:       {}", s.client_request_id),
        format!("Last applied:    {}", s.last_version),
        format!("Published:       {}", s.remote_version),
        format!("Update pending:  {pending}"),
    ]
    .join("\n")
}
