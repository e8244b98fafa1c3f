// Switch command API client
//
// JSON-RPC 2.0 over HTTPS (`POST /command-api`, method `runCmds`) with HTTP
// basic auth. A request carries an ordered command list and the switch
// answers with one JSON object per command, in the same order.

pub mod client;
pub mod models;

pub use client::EapiClient;
pub use models::{AccessList, AclEntry, AclListing, AddressFilter, PortFilter, RuleFilter};
