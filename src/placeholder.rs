//! Bundled entries shown before the first live page arrives.

use crate::log;
use crate::model::{parse_entries, LogEntry};

const PLACEHOLDER_JSON: &str = include_str!("../assets/placeholder_entries.json");

pub fn placeholder_entries() -> Vec<LogEntry> {
    match parse_entries(PLACEHOLDER_JSON) {
        Ok(entries) => entries,
        Err(e) => {
            log::app_log("ERROR", format!("Placeholder data unreadable: {}", e));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SampleField, Worker};
    use crate::series::{chart_series, DEFAULT_CHART_WORKERS};

    #[test]
    fn placeholder_covers_every_worker() {
        let entries = placeholder_entries();
        assert_eq!(entries.len(), 10);
        for w in Worker::ALL {
            assert!(entries.iter().any(|e| e.worker() == Some(w)));
        }
        assert!(entries.iter().all(|e| e.level().is_some()));
    }

    #[test]
    fn placeholder_charts_default_series() {
        let series = chart_series(&placeholder_entries(), &DEFAULT_CHART_WORKERS, SampleField::HeapUsed);
        assert!(series.iter().all(|s| s.has_points() && s.points.len() == 10));
    }
}
