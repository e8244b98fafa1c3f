// Endpoint service response types
//
// Fields the service omits for some sets (`ips`, port lists, `urls`) are
// `Option` so a missing field is distinguishable from an empty one.

use serde::{Deserialize, Serialize};

/// Response of `GET /version/{instance}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub instance: Option<String>,
    /// Zero-padded decimal version token, e.g. `"2024113000"`.
    pub latest: String,
}

/// One endpoint set from `GET /endpoints/{instance}`.
///
/// ```json
/// { "id": 1, "serviceArea": "Exchange", "category": "Optimize",
///   "ips": ["13.107.6.152/31", "2603:1006::/40"], "tcpPorts": "80,443",
///   "expressRoute": true, "required": true }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSet {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub service_area: Option<String>,
    #[serde(default)]
    pub service_area_display_name: Option<String>,
    /// `Optimize`, `Allow` or `Default`.
    pub category: String,
    #[serde(default)]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub ips: Option<Vec<String>>,
    /// Comma-separated TCP port list, e.g. `"80,443"`.
    #[serde(default)]
    pub tcp_ports: Option<String>,
    /// Comma-separated UDP port list.
    #[serde(default)]
    pub udp_ports: Option<String>,
    #[serde(default)]
    pub express_route: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub notes: Option<String>,
}
