// ── Endpoint list normalization ──
//
// Published endpoint sets -> desired CanonicalRules. Only `Optimize` and
// `Allow` sets are kept, only IPv4 addresses survive, and each set picks a
// single protocol: tcp ports win over udp ports, which win over plain ip.

use tracing::{debug, trace};

use aclsync_api::endpoints::EndpointSet;

use crate::model::{CanonicalRule, Protocol};

/// Categories whose addresses belong in the access list.
pub const ROUTED_CATEGORIES: [&str; 2] = ["Optimize", "Allow"];

/// Build the desired rule list, one rule per (set, IPv4 address) pair.
pub fn normalize(sets: &[EndpointSet]) -> Vec<CanonicalRule> {
    let mut rules = Vec::new();

    for set in sets {
        if !ROUTED_CATEGORIES.contains(&set.category.as_str()) {
            trace!(id = ?set.id, category = %set.category, "skipping endpoint set");
            continue;
        }

        let (protocol, ports) = select_protocol(set);
        let addresses = set.ips.as_deref().unwrap_or_default();

        rules.extend(
            addresses
                .iter()
                .filter(|ip| is_ipv4(ip))
                .map(|ip| CanonicalRule::new(ip.as_str(), protocol, ports)),
        );
    }

    debug!(sets = sets.len(), rules = rules.len(), "normalized endpoint sets");
    rules
}

fn select_protocol(set: &EndpointSet) -> (Protocol, &str) {
    if let Some(ports) = set.tcp_ports.as_deref() {
        (Protocol::Tcp, ports)
    } else if let Some(ports) = set.udp_ports.as_deref() {
        (Protocol::Udp, ports)
    } else {
        (Protocol::Ip, "")
    }
}

// IPv4 strings have dots, IPv6 strings have colons.
fn is_ipv4(address: &str) -> bool {
    address.contains('.') && !address.contains(':')
}
