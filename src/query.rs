//! Log API client: fetch one page of entries with optional level/worker filters.

use crate::config::DashboardConfig;
use crate::error::QueryError;
use crate::log;
use crate::model::{parse_entries, LogEntry, PageQuery};

fn build_client(cfg: &DashboardConfig) -> Result<reqwest::Client, QueryError> {
    reqwest::Client::builder()
        .timeout(cfg.timeout())
        .build()
        .map_err(|e| QueryError::Config(format!("HTTP client: {}", e)))
}

/// GET request for `query`. Unset filters never reach the query string.
pub fn build_request(
    client: &reqwest::Client,
    cfg: &DashboardConfig,
    query: &PageQuery,
) -> Result<reqwest::Request, QueryError> {
    if let Some(level) = query.level {
        if !cfg.schema.supports_level(level) {
            return Err(QueryError::UnsupportedFilter {
                schema: format!("{:?}", cfg.schema),
                filter: format!("level={}", level.name()),
            });
        }
    }
    client
        .get(cfg.endpoint.trim())
        .query(&query.to_pairs(cfg.schema))
        .header("Accept", "application/json")
        .build()
        .map_err(|e| QueryError::Config(format!("Bad request for {}: {}", cfg.endpoint, e)))
}

async fn fetch_once(client: &reqwest::Client, cfg: &DashboardConfig, request: reqwest::Request) -> Result<Vec<LogEntry>, QueryError> {
    let response = client.execute(request).await.map_err(|e| {
        if e.is_timeout() {
            QueryError::Timeout(cfg.timeout())
        } else {
            QueryError::Transport(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(QueryError::Status { status, body });
    }

    let raw_body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            QueryError::Timeout(cfg.timeout())
        } else {
            QueryError::Transport(format!("Response read failed: {}", e))
        }
    })?;
    parse_entries(&raw_body).map_err(|e| {
        let preview = if raw_body.len() > 500 {
            format!("{}... (truncated)", raw_body.chars().take(500).collect::<String>())
        } else {
            raw_body.clone()
        };
        log::app_log("ERROR", format!("Log API parse: {}", preview));
        QueryError::Decode(e.to_string())
    })
}

/// Fetch one page. Transport errors, timeouts and 5xx are retried `cfg.retries` times with backoff.
pub async fn fetch_page(cfg: &DashboardConfig, query: &PageQuery) -> Result<Vec<LogEntry>, QueryError> {
    let client = build_client(cfg)?;
    let mut attempt = 0u32;
    loop {
        let request = build_request(&client, cfg, query)?;
        log::app_log("INFO", format!("Log API: GET {} (attempt {})", request.url(), attempt + 1));
        match fetch_once(&client, cfg, request).await {
            Ok(entries) => {
                log::app_log("INFO", format!("Log API: page {} got {} entries", query.page, entries.len()));
                return Ok(entries);
            }
            Err(e) if e.is_retryable() && attempt < cfg.retries => {
                let delay = cfg.backoff(attempt);
                log::app_log("WARN", format!("Log API: {} (retrying in {:?})", e, delay));
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                log::app_log("ERROR", format!("Log API: {}", e));
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Level, SchemaVersion, Worker};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn cfg_for(endpoint: String) -> DashboardConfig {
        DashboardConfig {
            endpoint,
            backoff_ms: 1,
            ..DashboardConfig::default()
        }
    }

    /// Serve canned responses in order, one per connection, recording request lines.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_srv = seen.clone();
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut sock, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 4096];
                let n = sock.read(&mut buf).await.unwrap();
                let req = String::from_utf8_lossy(&buf[..n]).to_string();
                let line = req.lines().next().unwrap_or_default().to_string();
                seen_srv.lock().unwrap().push(line);
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                sock.write_all(reply.as_bytes()).await.unwrap();
                let _ = sock.shutdown().await;
            }
        });
        (format!("http://{}/api", addr), seen)
    }

    #[test]
    fn request_carries_only_set_filters() {
        let client = reqwest::Client::new();
        let cfg = cfg_for("http://localhost:5000/api".into());
        let req = build_request(&client, &cfg, &PageQuery::new(2, Some(Level::Warn), None)).unwrap();
        assert_eq!(req.url().query(), Some("page=2&level=warn"));

        let req = build_request(&client, &cfg, &PageQuery::default()).unwrap();
        assert_eq!(req.url().query(), Some("page=1"));
    }

    #[test]
    fn tagged_schema_sends_worker_tag() {
        let client = reqwest::Client::new();
        let mut cfg = cfg_for("http://localhost:5000/api".into());
        cfg.schema = SchemaVersion::V2;
        let req = build_request(&client, &cfg, &PageQuery::new(1, None, Some(Worker::Communicator))).unwrap();
        assert_eq!(req.url().query(), Some("page=1&worker=communicator"));
    }

    #[test]
    fn level_outside_schema_is_rejected() {
        let client = reqwest::Client::new();
        let mut cfg = cfg_for("http://localhost:5000/api".into());
        cfg.schema = SchemaVersion::V2;
        let err = build_request(&client, &cfg, &PageQuery::new(1, Some(Level::Verbose), None)).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedFilter { .. }));
    }

    #[tokio::test]
    async fn fetches_and_decodes_page() {
        let (endpoint, seen) = serve(vec![(200, r#"[{"id":1,"l":"warn","w":0,"message":"hi","mhu":10}]"#)]).await;
        let entries = fetch_page(&cfg_for(endpoint), &PageQuery::new(2, Some(Level::Warn), None)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].heap_used, Some(10.0));
        assert_eq!(seen.lock().unwrap()[0], "GET /api?page=2&level=warn HTTP/1.1");
    }

    #[tokio::test]
    async fn empty_array_is_empty_collection() {
        let (endpoint, _) = serve(vec![(200, "[]")]).await;
        let entries = fetch_page(&cfg_for(endpoint), &PageQuery::default()).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let (endpoint, seen) = serve(vec![(503, "busy"), (200, "[{}]")]).await;
        let entries = fetch_page(&cfg_for(endpoint), &PageQuery::default()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (endpoint, seen) = serve(vec![(404, "missing")]).await;
        let err = fetch_page(&cfg_for(endpoint), &PageQuery::default()).await.unwrap_err();
        assert_eq!(err, QueryError::Status { status: 404, body: "missing".into() });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn envelope_body_is_decode_error() {
        let (endpoint, _) = serve(vec![(200, r#"{"entries":[]}"#)]).await;
        let err = fetch_page(&cfg_for(endpoint), &PageQuery::default()).await.unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let (endpoint, seen) = serve(vec![(500, "a"), (500, "b"), (500, "c")]).await;
        let err = fetch_page(&cfg_for(endpoint), &PageQuery::default()).await.unwrap_err();
        assert_eq!(err, QueryError::Status { status: 500, body: "c".into() });
        assert_eq!(seen.lock().unwrap().len(), 3);
    }
}
