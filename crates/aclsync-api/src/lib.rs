// aclsync-api: Async clients for the endpoint publication service and the
// switch command API (JSON-RPC `runCmds`).

pub mod eapi;
pub mod endpoints;
pub mod error;
pub mod transport;

pub use eapi::EapiClient;
pub use endpoints::EndpointsClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
