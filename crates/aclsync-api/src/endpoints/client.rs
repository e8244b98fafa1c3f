// Async HTTP client for the endpoint publication service.
//
// Paths: /version/{instance}, /endpoints/{instance}
// Every call carries the caller's `clientRequestId` query parameter.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::models::{EndpointSet, VersionInfo};
use crate::Error;
use crate::transport::TransportConfig;

/// Public endpoint service root.
pub const DEFAULT_BASE_URL: &str = "https://endpoints.office.com";

/// Worldwide commercial service instance.
pub const DEFAULT_INSTANCE: &str = "Worldwide";

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

/// Async client for the endpoint publication service.
pub struct EndpointsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl EndpointsClient {
    /// Build a client from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(Self {
            http,
            base_url: url,
        })
    }

    /// The normalized service root (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Latest published version for `instance`.
    ///
    /// `GET /version/{instance}?clientRequestId={id}`
    pub async fn version(
        &self,
        instance: &str,
        client_request_id: &str,
    ) -> Result<VersionInfo, Error> {
        debug!(instance, "fetching endpoint version");
        self.get(&format!("version/{instance}"), client_request_id)
            .await
    }

    /// Full endpoint list for `instance`.
    ///
    /// `GET /endpoints/{instance}?clientRequestId={id}`
    pub async fn endpoints(
        &self,
        instance: &str,
        client_request_id: &str,
    ) -> Result<Vec<EndpointSet>, Error> {
        debug!(instance, "fetching endpoint sets");
        let sets: Vec<EndpointSet> = self
            .get(&format!("endpoints/{instance}"), client_request_id)
            .await?;
        debug!(count = sets.len(), "endpoint sets received");
        Ok(sets)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        client_request_id: &str,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .query(&[("clientRequestId", client_request_id)])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| preview(&body));
            return Err(Error::EndpointService {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
