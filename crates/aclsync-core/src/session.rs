// ── Device session seam ──
//
// The switch is driven through ordered command batches. Every batch starts
// with the privilege-escalation step, and results come back one per
// command. `BatchResponse` hands results out by command text so callers
// never index into the raw result list.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;

use aclsync_api::EapiClient;

use crate::error::CoreError;

/// Privilege-escalation step that leads every batch.
pub const ENABLE: &str = "enable";

/// An ordered list of commands sent to the switch in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBatch {
    commands: Vec<String>,
}

impl CommandBatch {
    /// A batch that starts with [`ENABLE`].
    pub fn privileged() -> Self {
        Self {
            commands: vec![ENABLE.to_owned()],
        }
    }

    /// Append a command.
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// The last command, i.e. the one the batch exists for.
    pub fn operation(&self) -> Option<&str> {
        self.commands.last().map(String::as_str)
    }
}

/// Results of a [`CommandBatch`], addressable by command text.
#[derive(Debug, Clone)]
pub struct BatchResponse {
    entries: Vec<(String, Value)>,
}

impl BatchResponse {
    /// Pair each command of `batch` with its result.
    pub fn new(batch: &CommandBatch, results: Vec<Value>) -> Result<Self, CoreError> {
        if results.len() != batch.commands.len() {
            return Err(CoreError::MalformedDeviceState {
                message: format!(
                    "sent {} commands, received {} results",
                    batch.commands.len(),
                    results.len()
                ),
            });
        }
        Ok(Self {
            entries: batch.commands.iter().cloned().zip(results).collect(),
        })
    }

    /// Raw result of `command`.
    pub fn output_of(&self, command: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(sent, _)| sent == command)
            .map(|(_, value)| value)
    }

    /// Decode the result of `command` into a typed value.
    pub fn decode_output<T: DeserializeOwned>(&self, command: &str) -> Result<T, CoreError> {
        let value = self
            .output_of(command)
            .ok_or_else(|| CoreError::MalformedDeviceState {
                message: format!("no result for '{command}'"),
            })?;
        T::deserialize(value).map_err(|e| CoreError::MalformedDeviceState {
            message: format!("unexpected output of '{command}': {e}"),
        })
    }
}

/// Command channel to a switch.
///
/// Implementations block the pass until the switch answers; no timeout is
/// layered on top here.
pub trait DeviceSession {
    fn run_commands(
        &self,
        batch: &CommandBatch,
    ) -> impl Future<Output = Result<BatchResponse, CoreError>> + Send;
}

impl DeviceSession for EapiClient {
    async fn run_commands(&self, batch: &CommandBatch) -> Result<BatchResponse, CoreError> {
        let results = self
            .run_cmds(batch.commands())
            .await
            .map_err(CoreError::from_device)?;
        BatchResponse::new(batch, results)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn batches_start_with_enable() {
        let batch = CommandBatch::privileged().command("show ip access-lists REDIRECT");
        assert_eq!(batch.commands(), ["enable", "show ip access-lists REDIRECT"]);
        assert_eq!(batch.operation(), Some("show ip access-lists REDIRECT"));
    }

    #[test]
    fn results_are_looked_up_by_command() {
        let batch = CommandBatch::privileged().command("show version");
        let resp = BatchResponse::new(&batch, vec![json!({}), json!({ "version": "4.30.1F" })])
            .unwrap();

        assert_eq!(resp.output_of("show version").unwrap()["version"], "4.30.1F");
        assert!(resp.output_of("show clock").is_none());
    }

    #[test]
    fn result_count_must_match() {
        let batch = CommandBatch::privileged().command("show version");
        let err = BatchResponse::new(&batch, vec![json!({})]).unwrap_err();
        assert!(err.is_device_state());
    }

    #[test]
    fn decode_reports_missing_and_malformed_output() {
        #[derive(serde::Deserialize)]
        struct Version {
            #[allow(dead_code)]
            version: String,
        }

        let batch = CommandBatch::privileged().command("show version");
        let resp = BatchResponse::new(&batch, vec![json!({}), json!({ "version": 4 })]).unwrap();

        assert!(resp.decode_output::<Version>("show version").is_err());
        assert!(resp.decode_output::<Version>("show clock").is_err());
    }
}
