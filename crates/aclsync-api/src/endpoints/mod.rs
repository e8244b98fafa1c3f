// Endpoint publication service client
//
// Read-only JSON service that publishes a versioned list of endpoint sets
// per cloud instance. Two calls matter: `version/{instance}` for the latest
// version token and `endpoints/{instance}` for the full list.

pub mod client;
pub mod models;

pub use client::{DEFAULT_BASE_URL, DEFAULT_INSTANCE, EndpointsClient};
pub use models::{EndpointSet, VersionInfo};
