// ── Endpoint source seam ──

use std::future::Future;

use aclsync_api::EndpointsClient;
use aclsync_api::endpoints::EndpointSet;

use crate::error::CoreError;

/// Versioned publisher of endpoint sets.
///
/// Version tokens are zero-padded decimal strings, so lexicographic order
/// matches publication order.
pub trait EndpointSource {
    /// Latest published version token.
    fn version(
        &self,
        instance: &str,
        client_request_id: &str,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    /// Full endpoint list at the latest version.
    fn endpoints(
        &self,
        instance: &str,
        client_request_id: &str,
    ) -> impl Future<Output = Result<Vec<EndpointSet>, CoreError>> + Send;
}

impl EndpointSource for EndpointsClient {
    async fn version(&self, instance: &str, client_request_id: &str) -> Result<String, CoreError> {
        let info = EndpointsClient::version(self, instance, client_request_id)
            .await
            .map_err(CoreError::from_source)?;
        Ok(info.latest)
    }

    async fn endpoints(
        &self,
        instance: &str,
        client_request_id: &str,
    ) -> Result<Vec<EndpointSet>, CoreError> {
        EndpointsClient::endpoints(self, instance, client_request_id)
            .await
            .map_err(CoreError::from_source)
    }
}
