// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::identity::resolve_identity;
use crate::log_resolver::LogResolver;
use crate::model::{FailureReport, LogEntry, NewLogEntry};
use crate::remote_log_client::{RemoteLogClient, RemoteLogError};

/// Result of a write that was allowed to run.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateEntryOutcome {
    /// The entry exactly as the logging service echoed it back.
    Created(LogEntry),
    /// The logging service could not be reached; the terminal still gets a 200.
    Degraded(FailureReport),
}

/// Forwards log reads and writes from terminal clients to the default log.
///
/// Telemetry is not allowed to block a learning activity, so every remote failure is absorbed
/// here: reads come back empty and writes come back with a failure report, both as successes.
/// No call is retried.
pub struct LogEntryGateway {
    client: Arc<dyn RemoteLogClient + Send + Sync>,
    resolver: LogResolver,
}

impl LogEntryGateway {
    pub fn new(client: Arc<dyn RemoteLogClient + Send + Sync>) -> Self {
        LogEntryGateway {
            resolver: LogResolver::new(Arc::clone(&client)),
            client,
        }
    }

    pub async fn list_entries(&self, session_active: bool) -> Result<Vec<LogEntry>, GatewayError> {
        if !session_active {
            return Err(GatewayError::Unauthorized);
        }

        match self.fetch_entries().await {
            Ok(entries) => {
                debug!("Fetched {} log entries", entries.len());
                Ok(entries)
            }
            Err(err) => {
                log_degraded("listing log entries", err);
                Ok(Vec::new())
            }
        }
    }

    pub async fn create_entry(
        &self,
        session_active: bool,
        payload: Map<String, Value>,
    ) -> Result<CreateEntryOutcome, GatewayError> {
        if !session_active {
            return Err(GatewayError::Unauthorized);
        }

        match self.send_entry(payload).await {
            Ok(entry) => Ok(CreateEntryOutcome::Created(entry)),
            Err(err) => Ok(CreateEntryOutcome::Degraded(FailureReport {
                msg: log_degraded("creating log entry", err).to_string(),
            })),
        }
    }

    async fn fetch_entries(&self) -> Result<Vec<LogEntry>, RemoteLogError> {
        let log = self.resolver.resolve_default_log().await?;
        self.client.list_entries(&log.id).await
    }

    async fn send_entry(&self, payload: Map<String, Value>) -> Result<LogEntry, RemoteLogError> {
        let identity = resolve_identity(&payload);
        let log = self.resolver.resolve_default_log().await?;
        debug!(log_id = %log.id, identity = %identity, "Forwarding log entry");
        self.client
            .create_entry(&log.id, &NewLogEntry { data: payload }, &identity)
            .await
    }
}

fn log_degraded(operation: &str, err: RemoteLogError) -> GatewayError {
    if err.is_timeout() {
        warn!("Timed out {operation}, responding without the logging service: {err}");
    } else {
        warn!("Failed {operation}, responding without the logging service: {err}");
    }
    GatewayError::RemoteUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_resolver::tests::{log_with, RecordingClient};
    use crate::model::DEFAULT_LOG_GENUS_TYPE;
    use serde_json::json;
    use tracing_test::traced_test;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn client_with_default_log() -> Arc<RecordingClient> {
        Arc::new(RecordingClient {
            logs: vec![log_with("foo", Some(DEFAULT_LOG_GENUS_TYPE))],
            entries: vec![serde_json::from_value(json!({"id": "e1"})).unwrap()],
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_read_without_session_makes_no_remote_calls() {
        let client = client_with_default_log();
        let gateway = LogEntryGateway::new(client.clone());

        let result = gateway.list_entries(false).await;
        assert!(matches!(result, Err(GatewayError::Unauthorized)));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_write_without_session_makes_no_remote_calls() {
        let client = client_with_default_log();
        let gateway = LogEntryGateway::new(client.clone());

        let result = gateway
            .create_entry(false, payload(json!({"session_id": "foo"})))
            .await;
        assert!(matches!(result, Err(GatewayError::Unauthorized)));
        assert!(client.calls().is_empty());
        assert!(client.created_entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_lists_entries_of_default_log() {
        let client = client_with_default_log();
        let gateway = LogEntryGateway::new(client.clone());

        let entries = gateway.list_entries(true).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id(), "e1");
        assert_eq!(client.calls(), vec!["list_logs", "list_entries:foo"]);
    }

    #[tokio::test]
    async fn test_write_attaches_resolved_identity() {
        let client = client_with_default_log();
        let gateway = LogEntryGateway::new(client.clone());
        let body = payload(json!({
            "action": "pause audio",
            "mediaTime": 9.142857,
            "session_id": "foo"
        }));

        let outcome = gateway.create_entry(true, body.clone()).await.unwrap();
        let CreateEntryOutcome::Created(entry) = outcome else {
            panic!("expected a created entry, got {outcome:?}");
        };
        assert_eq!(entry.payload().unwrap().unwrap(), Value::Object(body.clone()));
        assert_eq!(entry.agent_id(), Some("osid.agent.Agent%3Afoo%40MIT-ODL"));

        let created = client.created_entries.lock().unwrap();
        assert_eq!(created.len(), 1);
        let (log_id, sent, identity) = &created[0];
        assert_eq!(log_id, "foo");
        assert_eq!(sent.data, body);
        assert_eq!(identity.as_str(), "foo");
    }

    #[tokio::test]
    async fn test_write_without_identity_uses_sentinel() {
        let client = client_with_default_log();
        let gateway = LogEntryGateway::new(client.clone());

        gateway
            .create_entry(true, payload(json!({"action": "play"})))
            .await
            .unwrap();
        let created = client.created_entries.lock().unwrap();
        assert_eq!(created[0].2.as_str(), "none_provided");
    }

    #[tokio::test]
    async fn test_missing_default_log_is_created_once_and_used() {
        let client = Arc::new(RecordingClient {
            created_log: Some(log_with("foo2", None)),
            ..Default::default()
        });
        let gateway = LogEntryGateway::new(client.clone());

        gateway
            .create_entry(true, payload(json!({"userId": "bar"})))
            .await
            .unwrap();
        assert_eq!(
            client.calls(),
            vec!["list_logs", "create_log", "create_entry:foo2"]
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_read_degrades_to_empty_list() {
        let client = Arc::new(RecordingClient {
            unreachable: true,
            ..Default::default()
        });
        let gateway = LogEntryGateway::new(client.clone());

        let entries = gateway.list_entries(true).await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(client.calls(), vec!["list_logs"]);
        assert!(logs_contain("Failed listing log entries"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_write_degrades_to_failure_report() {
        let client = Arc::new(RecordingClient {
            unreachable: true,
            ..Default::default()
        });
        let gateway = LogEntryGateway::new(client.clone());

        let outcome = gateway
            .create_entry(true, payload(json!({"sessionId": "bar"})))
            .await
            .unwrap();
        let CreateEntryOutcome::Degraded(report) = outcome else {
            panic!("expected a degraded outcome, got {outcome:?}");
        };
        assert_eq!(
            report.msg,
            "Remote logging service unavailable: logging service returned status 503"
        );
        assert!(client.created_entries.lock().unwrap().is_empty());
        assert!(logs_contain("Failed creating log entry"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_read_degrades_when_default_log_cannot_be_created() {
        let client = Arc::new(RecordingClient {
            create_log_fails: true,
            ..Default::default()
        });
        let gateway = LogEntryGateway::new(client.clone());

        let entries = gateway.list_entries(true).await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(client.calls(), vec!["list_logs", "create_log"]);
        assert!(logs_contain("Failed listing log entries"));
    }

    #[tokio::test]
    async fn test_write_degrades_when_default_log_cannot_be_created() {
        let client = Arc::new(RecordingClient {
            create_log_fails: true,
            ..Default::default()
        });
        let gateway = LogEntryGateway::new(client.clone());

        let outcome = gateway
            .create_entry(true, payload(json!({"session_id": "foo"})))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CreateEntryOutcome::Degraded(FailureReport {
                msg: "Remote logging service unavailable: logging service returned status 500"
                    .to_string()
            })
        );
        assert_eq!(client.calls(), vec!["list_logs", "create_log"]);
        assert!(client.created_entries.lock().unwrap().is_empty());
    }
}
