//! Server functions bridging the dashboard UI to the log API client.
//! These are callable from both web (WASM) and desktop clients.

use dioxus::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::{LogEntry, PageQuery, SchemaVersion};

/// What the UI needs to know about the configured log API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardInfo {
    pub endpoint: String,
    pub schema: SchemaVersion,
}

/// Fetch one page of log entries through the configured endpoint.
#[server]
pub async fn fetch_log_page(query: PageQuery) -> Result<Vec<LogEntry>, ServerFnError> {
    let cfg = crate::config::config().map_err(|e| ServerFnError::new(e))?;
    crate::query::fetch_page(cfg, &query)
        .await
        .map_err(|e| ServerFnError::new(e))
}

/// Endpoint and schema version, so the controls only offer valid filters.
#[server]
pub async fn fetch_dashboard_info() -> Result<DashboardInfo, ServerFnError> {
    let cfg = crate::config::config().map_err(|e| ServerFnError::new(e))?;
    Ok(DashboardInfo {
        endpoint: cfg.endpoint.clone(),
        schema: cfg.schema,
    })
}
