// ── Switch access list -> CanonicalRules ──
//
// Mirrors `normalize` for the device side. Entries are read in the order
// the switch reports them; ports are joined in device order and not sorted.

use tracing::{debug, warn};

use aclsync_api::eapi::{AclEntry, AclListing};

use crate::error::CoreError;
use crate::mask::prefix_length;
use crate::model::{CanonicalRule, Protocol};
use crate::session::{CommandBatch, DeviceSession};

/// `show` command for a single access list.
pub fn show_command(acl_name: &str) -> String {
    format!("show ip access-lists {acl_name}")
}

/// Read the active rules of `acl_name` from the switch.
pub async fn fetch_active<D: DeviceSession>(
    session: &D,
    acl_name: &str,
) -> Result<Vec<CanonicalRule>, CoreError> {
    let show = show_command(acl_name);
    let batch = CommandBatch::privileged().command(show.clone());
    let response = session.run_commands(&batch).await?;
    let listing: AclListing = response.decode_output(&show)?;
    parse_active(&listing, acl_name)
}

/// Convert a listing into canonical rules.
///
/// Any entry that cannot be represented fails the whole listing, so a delta
/// is never computed from a partial view of the switch.
pub fn parse_active(
    listing: &AclListing,
    acl_name: &str,
) -> Result<Vec<CanonicalRule>, CoreError> {
    let Some(acl) = listing.find(acl_name) else {
        warn!(acl = acl_name, "access list not present on device; treating as empty");
        return Ok(Vec::new());
    };

    let mut rules = Vec::with_capacity(acl.sequence.len());
    for entry in &acl.sequence {
        if let Some(rule) = parse_entry(entry)? {
            rules.push(rule);
        }
    }

    debug!(
        acl = acl_name,
        entries = acl.sequence.len(),
        rules = rules.len(),
        "parsed device access list"
    );
    Ok(rules)
}

fn parse_entry(entry: &AclEntry) -> Result<Option<CanonicalRule>, CoreError> {
    let Some(filter) = &entry.rule_filter else {
        debug!(
            sequence = entry.sequence_number,
            text = %entry.text,
            "skipping entry without rule filter"
        );
        return Ok(None);
    };

    let length = prefix_length(filter.destination.mask)?;
    let prefix = format!("{}/{length}", filter.destination.ip);

    let protocol =
        Protocol::from_number(filter.protocol).ok_or(CoreError::UnsupportedProtocol {
            protocol: filter.protocol,
            sequence: entry.sequence_number,
        })?;

    let ports = match protocol {
        Protocol::Ip => String::new(),
        Protocol::Tcp | Protocol::Udp => filter
            .dst_port
            .as_ref()
            .map(|p| {
                p.ports
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default(),
    };

    Ok(Some(CanonicalRule {
        prefix,
        protocol,
        ports,
    }))
}
