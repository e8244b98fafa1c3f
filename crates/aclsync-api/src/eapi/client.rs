// Command API HTTP client
//
// Wraps `reqwest::Client` with basic auth, JSON-RPC envelope construction
// and error unwrapping. Callers hand in complete command lists; this module
// knows nothing about access lists or configuration sessions.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

use super::models::{RunCmdsParams, RunCmdsRequest, RunCmdsResponse};
use crate::endpoints::client::preview;
use crate::error::Error;
use crate::transport::TransportConfig;

/// JSON-RPC client for a switch's `/command-api` endpoint.
pub struct EapiClient {
    http: reqwest::Client,
    url: Url,
    username: String,
    password: SecretString,
}

impl EapiClient {
    /// Create a client for the switch at `address`.
    ///
    /// `address` may be a bare host (`10.100.100.1`, `switch:8443`), in which
    /// case `https://{address}/command-api` is used, or a full URL.
    pub fn new(
        address: &str,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(address, http, username, password)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        address: &str,
        http: reqwest::Client,
        username: impl Into<String>,
        password: SecretString,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            url: command_api_url(address)?,
            username: username.into(),
            password,
        })
    }

    /// The resolved `/command-api` URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Run an ordered command list and return one JSON object per command.
    ///
    /// The switch executes commands in order and stops at the first failure,
    /// which is reported as [`Error::CommandApi`].
    pub async fn run_cmds(&self, cmds: &[String]) -> Result<Vec<serde_json::Value>, Error> {
        let request = RunCmdsRequest {
            jsonrpc: "2.0",
            method: "runCmds",
            params: RunCmdsParams {
                version: 1,
                cmds,
                format: "json",
            },
            id: Uuid::new_v4().to_string(),
        };
        debug!(url = %self.url, count = cmds.len(), "runCmds");
        trace!(?cmds, "command batch");

        let resp = self
            .http
            .post(self.url.clone())
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("switch rejected credentials for user '{}'", self.username),
            });
        }

        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::CommandHttp {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let envelope: RunCmdsResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            })?;

        if let Some(err) = envelope.error {
            return Err(Error::CommandApi {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        envelope.result.ok_or_else(|| Error::Deserialization {
            message: "response carries neither `result` nor `error`".into(),
            body,
        })
    }
}

fn command_api_url(address: &str) -> Result<Url, Error> {
    if address.contains("://") {
        return Ok(Url::parse(address)?);
    }
    Ok(Url::parse(&format!("https://{address}/command-api"))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_command_api_path() {
        let url = command_api_url("10.100.100.1").unwrap();
        assert_eq!(url.as_str(), "https://10.100.100.1/command-api");
    }

    #[test]
    fn full_url_is_kept() {
        let url = command_api_url("http://127.0.0.1:8080/command-api").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/command-api");
    }
}
