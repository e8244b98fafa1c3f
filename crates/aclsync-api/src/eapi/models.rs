// Command API wire types
//
// JSON-RPC envelope plus the structured output of `show ip access-lists`.
// Fields use `#[serde(default)]` because remark entries and `any` matches
// leave parts of the rule filter out.

use serde::{Deserialize, Serialize};

// ── JSON-RPC envelope ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct RunCmdsRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: RunCmdsParams<'a>,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RunCmdsParams<'a> {
    pub version: u32,
    pub cmds: &'a [String],
    pub format: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunCmdsResponse {
    #[serde(default)]
    pub result: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

// ── show ip access-lists ─────────────────────────────────────────────

/// Output of `show ip access-lists [NAME]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclListing {
    #[serde(default)]
    pub acl_list: Vec<AccessList>,
}

impl AclListing {
    /// Look up an access list by name.
    pub fn find(&self, name: &str) -> Option<&AccessList> {
        self.acl_list.iter().find(|acl| acl.name == name)
    }
}

/// One named access list and its entries in sequence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessList {
    pub name: String,
    #[serde(default)]
    pub sequence: Vec<AclEntry>,
}

/// A single access control entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclEntry {
    #[serde(default)]
    pub sequence_number: u32,
    /// CLI rendering of the entry, e.g. `"permit tcp any 13.107.6.152/31 eq https"`.
    #[serde(default)]
    pub text: String,
    /// Absent for `remark` entries.
    #[serde(default)]
    pub rule_filter: Option<RuleFilter>,
}

/// Structured match criteria of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFilter {
    /// IANA protocol number (0 = ip).
    #[serde(default)]
    pub protocol: u32,
    #[serde(default)]
    pub source: Option<AddressFilter>,
    pub destination: AddressFilter,
    #[serde(default)]
    pub dst_port: Option<PortFilter>,
}

/// Address match: network address plus 32-bit mask (`4294967295` = host).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFilter {
    pub ip: String,
    #[serde(default)]
    pub mask: u32,
}

/// Port match, e.g. `{"oper": "eq", "ports": [80, 443]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortFilter {
    #[serde(default)]
    pub oper: String,
    #[serde(default)]
    pub ports: Vec<u32>,
}
