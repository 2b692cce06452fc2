// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use tracing::{debug, info};

use crate::model::{Log, NewLog};
use crate::remote_log_client::{RemoteLogClient, RemoteLogError};

/// Finds the default log on the logging service, creating it the first time it is missing.
///
/// Nothing is cached: every call lists the logs again. Remote failures are returned to the
/// caller untouched.
pub struct LogResolver {
    client: Arc<dyn RemoteLogClient + Send + Sync>,
}

impl LogResolver {
    pub fn new(client: Arc<dyn RemoteLogClient + Send + Sync>) -> Self {
        LogResolver { client }
    }

    pub async fn resolve_default_log(&self) -> Result<Log, RemoteLogError> {
        let logs = self.client.list_logs().await?;
        if let Some(log) = logs.into_iter().find(Log::is_default) {
            debug!(log_id = %log.id, "Found default log");
            return Ok(log);
        }

        // The created log is trusted as returned, it is not looked up again.
        let log = self.client.create_log(&NewLog::default_log()).await?;
        info!(log_id = %log.id, "Created default log");
        Ok(log)
    }
}
