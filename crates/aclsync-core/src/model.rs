// ── Canonical rule model ──
//
// Both the published endpoint list and the switch access list are reduced
// to `CanonicalRule` before comparison. Equality is plain field equality:
// `ports` is an opaque string, so "80,443" and "443,80" differ.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Protocol of a permit rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Ip,
    Tcp,
    Udp,
}

impl Protocol {
    /// Map an IANA protocol number as reported by the switch.
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            0 => Some(Self::Ip),
            6 => Some(Self::Tcp),
            17 => Some(Self::Udp),
            _ => None,
        }
    }

    /// IANA protocol number.
    pub fn number(self) -> u32 {
        match self {
            Self::Ip => 0,
            Self::Tcp => 6,
            Self::Udp => 17,
        }
    }
}

/// One permit rule in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalRule {
    /// Destination prefix, e.g. `"13.107.6.152/31"`.
    pub prefix: String,
    pub protocol: Protocol,
    /// Comma-joined destination ports; empty for [`Protocol::Ip`].
    pub ports: String,
}

impl CanonicalRule {
    pub fn new(prefix: impl Into<String>, protocol: Protocol, ports: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            protocol,
            ports: ports.into(),
        }
    }

    /// A protocol-wide rule with no port match.
    pub fn ip(prefix: impl Into<String>) -> Self {
        Self::new(prefix, Protocol::Ip, String::new())
    }
}

impl fmt::Display for CanonicalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ports.is_empty() {
            write!(f, "{} {}", self.prefix, self.protocol)
        } else {
            write!(f, "{} {} ports {}", self.prefix, self.protocol, self.ports)
        }
    }
}

/// Changes needed to move the switch from its actual rules to the desired ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub to_add: Vec<CanonicalRule>,
    pub to_remove: Vec<CanonicalRule>,
    /// Desired rules already present on the switch.
    #[serde(default)]
    pub unchanged: Vec<CanonicalRule>,
}

impl Delta {
    /// Nothing to add and nothing to remove.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
