//! In-app diagnostics buffer for the Logs panel, mirrored to the dioxus tracing logger.

use std::sync::Mutex;

use dioxus::logger::tracing;

const MAX_LOGS: usize = 2000;

static LOG_BUF: std::sync::OnceLock<Mutex<Vec<LogLine>>> = std::sync::OnceLock::new();

#[derive(Clone, Debug, PartialEq)]
pub struct LogLine {
    pub time: String,
    pub level: String,
    pub message: String,
}

impl LogLine {
    pub fn is_error(&self) -> bool {
        self.level == "ERROR"
    }
}

fn buf() -> &'static Mutex<Vec<LogLine>> {
    LOG_BUF.get_or_init(|| Mutex::new(Vec::new()))
}

/// Append a log line. Safe to call from any thread (e.g. from async fetch).
pub fn app_log(level: &str, message: impl Into<String>) {
    let entry = LogLine {
        time: chrono::Utc::now().format("%H:%M:%S%.3f").to_string(),
        level: level.to_uppercase(),
        message: message.into(),
    };
    match entry.level.as_str() {
        "ERROR" => tracing::error!("{}", entry.message),
        "WARN" => tracing::warn!("{}", entry.message),
        "DEBUG" => tracing::debug!("{}", entry.message),
        _ => tracing::info!("{}", entry.message),
    }
    if let Ok(mut v) = buf().lock() {
        v.push(entry);
        let n = v.len();
        if n > MAX_LOGS {
            v.drain(0..n - MAX_LOGS);
        }
    }
}

/// Take a snapshot of current logs for display. Call from UI.
pub fn app_logs_snapshot() -> Vec<LogLine> {
    buf().lock().map(|v| v.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_bounded_and_keeps_newest() {
        for i in 0..MAX_LOGS + 5 {
            app_log("info", format!("line {}", i));
        }
        app_log("error", "last");
        let snap = app_logs_snapshot();
        assert_eq!(snap.len(), MAX_LOGS);
        assert!(snap.iter().any(|l| l.message == "last" && l.is_error()));
        assert!(!snap.iter().any(|l| l.message == "line 0"));
    }
}
