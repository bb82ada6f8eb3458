//! Shared domain types for log entries (used by UI, series extraction and the API client).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::log;

// ---------------------------------------------------------------------------
// Schema versions & mapping tables
// ---------------------------------------------------------------------------

/// Which draft of the wire enumerations the log API speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Workers as integer codes, five levels.
    #[default]
    V1,
    /// Workers as string tags, three levels.
    V2,
}

impl SchemaVersion {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "v1" | "1" | "numeric" => Some(SchemaVersion::V1),
            "v2" | "2" | "tagged" => Some(SchemaVersion::V2),
            _ => None,
        }
    }

    /// Levels this schema carries, in the order the controls list them.
    pub fn levels(self) -> Vec<Level> {
        LEVEL_TABLE
            .iter()
            .filter(|row| row.schemas.contains(&self))
            .map(|row| row.level)
            .collect()
    }

    pub fn supports_level(self, level: Level) -> bool {
        level_row(level).schemas.contains(&self)
    }

    /// Query-string value for a worker filter under this schema.
    #[cfg_attr(not(feature = "server"), allow(dead_code))]
    pub fn encode_worker(self, worker: Worker) -> String {
        let row = worker_row(worker);
        match self {
            SchemaVersion::V1 => row.code.to_string(),
            SchemaVersion::V2 => row.tag.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Verbose,
}

struct LevelRow {
    level: Level,
    name: &'static str,
    label: &'static str,
    schemas: &'static [SchemaVersion],
}

const LEVEL_TABLE: &[LevelRow] = &[
    LevelRow { level: Level::Debug, name: "debug", label: "Debug", schemas: &[SchemaVersion::V1, SchemaVersion::V2] },
    LevelRow { level: Level::Info, name: "info", label: "Info", schemas: &[SchemaVersion::V1, SchemaVersion::V2] },
    LevelRow { level: Level::Error, name: "error", label: "Error", schemas: &[SchemaVersion::V1] },
    LevelRow { level: Level::Verbose, name: "verbose", label: "Verbose", schemas: &[SchemaVersion::V1] },
    LevelRow { level: Level::Warn, name: "warn", label: "Warn", schemas: &[SchemaVersion::V1, SchemaVersion::V2] },
];

fn level_row(level: Level) -> &'static LevelRow {
    // Every variant has exactly one row.
    LEVEL_TABLE
        .iter()
        .find(|row| row.level == level)
        .unwrap_or(&LEVEL_TABLE[0])
}

impl Level {
    /// Resolve a raw wire value; `None` means unmapped.
    pub fn from_string(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        LEVEL_TABLE.iter().find(|row| row.name == lower).map(|row| row.level)
    }

    pub fn name(&self) -> &'static str {
        level_row(*self).name
    }

    pub fn display_name(&self) -> &'static str {
        level_row(*self).label
    }

    pub fn display_class(&self) -> &'static str {
        match self {
            Level::Debug => "col-level-debug",
            Level::Info => "col-level-info",
            Level::Warn => "col-level-warn",
            Level::Error => "col-level-error",
            Level::Verbose => "col-level-verbose",
        }
    }
}

/// The logical actor that produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Worker {
    Main,
    Strategy,
    Communicator,
    Api,
}

struct WorkerRow {
    worker: Worker,
    code: i64,
    tag: &'static str,
    label: &'static str,
    badge: &'static str,
}

const WORKER_TABLE: &[WorkerRow] = &[
    WorkerRow { worker: Worker::Main, code: 0, tag: "main", label: "Main", badge: "⛪ MAIN" },
    WorkerRow { worker: Worker::Strategy, code: 1, tag: "strategy", label: "Strategy", badge: "👽 STRA" },
    WorkerRow { worker: Worker::Communicator, code: 2, tag: "communicator", label: "Communicator", badge: "📞 COMM" },
    WorkerRow { worker: Worker::Api, code: 3, tag: "api", label: "Api", badge: "⌛ API" },
];

fn worker_row(worker: Worker) -> &'static WorkerRow {
    WORKER_TABLE
        .iter()
        .find(|row| row.worker == worker)
        .unwrap_or(&WORKER_TABLE[0])
}

impl Worker {
    pub const ALL: [Worker; 4] = [Worker::Main, Worker::Strategy, Worker::Communicator, Worker::Api];

    pub fn from_code(code: i64) -> Option<Self> {
        WORKER_TABLE.iter().find(|row| row.code == code).map(|row| row.worker)
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let lower = tag.trim().to_lowercase();
        WORKER_TABLE.iter().find(|row| row.tag == lower).map(|row| row.worker)
    }

    pub fn code(&self) -> i64 {
        worker_row(*self).code
    }

    pub fn tag(&self) -> &'static str {
        worker_row(*self).tag
    }

    pub fn display_name(&self) -> &'static str {
        worker_row(*self).label
    }

    pub fn badge(&self) -> &'static str {
        worker_row(*self).badge
    }

    pub fn display_class(&self) -> String {
        format!("col-thread-{}", self.code())
    }
}

/// A worker value exactly as the API sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerRef {
    Code(i64),
    Tag(String),
}

impl WorkerRef {
    pub fn resolve(&self) -> Option<Worker> {
        match self {
            WorkerRef::Code(code) => Worker::from_code(*code),
            // Older drafts sometimes sent the numeric code as a string.
            WorkerRef::Tag(tag) => Worker::from_tag(tag)
                .or_else(|| tag.trim().parse::<i64>().ok().and_then(Worker::from_code)),
        }
    }
}

impl From<Worker> for WorkerRef {
    fn from(worker: Worker) -> Self {
        WorkerRef::Code(worker.code())
    }
}

// ---------------------------------------------------------------------------
// Log entries
// ---------------------------------------------------------------------------

/// Numeric sample carried by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleField {
    HeapUsed,
    HeapTotal,
    Rss,
    External,
    CpuUser,
    CpuSystem,
}

impl SampleField {
    pub const ALL: [SampleField; 6] = [
        SampleField::HeapUsed,
        SampleField::HeapTotal,
        SampleField::Rss,
        SampleField::External,
        SampleField::CpuUser,
        SampleField::CpuSystem,
    ];

    /// Short wire key of the field.
    pub fn key(&self) -> &'static str {
        match self {
            SampleField::HeapUsed => "mhu",
            SampleField::HeapTotal => "mht",
            SampleField::Rss => "mrss",
            SampleField::External => "mext",
            SampleField::CpuUser => "ct",
            SampleField::CpuSystem => "cl",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        SampleField::ALL.into_iter().find(|f| f.key() == key.trim())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SampleField::HeapUsed => "heap used",
            SampleField::HeapTotal => "heap total",
            SampleField::Rss => "rss",
            SampleField::External => "external",
            SampleField::CpuUser => "cpu user",
            SampleField::CpuSystem => "cpu system",
        }
    }
}

/// One record returned by the log API. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    /// Raw level name; see [`LogEntry::level`].
    #[serde(rename = "l", alias = "level", default, deserialize_with = "lenient::text")]
    pub level_raw: String,
    #[serde(rename = "w", alias = "worker", alias = "thread", default, deserialize_with = "lenient::worker")]
    pub worker_raw: Option<WorkerRef>,
    #[serde(alias = "msg", default, deserialize_with = "lenient::text")]
    pub message: String,
    #[serde(rename = "t", alias = "timestamp", alias = "time", default, deserialize_with = "lenient::text")]
    pub timestamp: String,
    #[serde(rename = "mhu", alias = "memory_heap_used", default, deserialize_with = "lenient::number")]
    pub heap_used: Option<f64>,
    #[serde(rename = "mht", alias = "memory_heap_total", default, deserialize_with = "lenient::number")]
    pub heap_total: Option<f64>,
    #[serde(rename = "mrss", alias = "memory_rss", default, deserialize_with = "lenient::number")]
    pub rss: Option<f64>,
    #[serde(rename = "mext", alias = "memory_external", default, deserialize_with = "lenient::number")]
    pub external: Option<f64>,
    #[serde(rename = "ct", alias = "cpu_user", default, deserialize_with = "lenient::number")]
    pub cpu_user: Option<f64>,
    #[serde(rename = "cl", alias = "cpu_system", default, deserialize_with = "lenient::number")]
    pub cpu_system: Option<f64>,
    #[serde(rename = "cxt", alias = "context", default, deserialize_with = "lenient::opt_text")]
    pub context: Option<String>,
    #[serde(rename = "p", alias = "provenance", default, deserialize_with = "lenient::opt_text")]
    pub provenance: Option<String>,
}

impl LogEntry {
    pub fn level(&self) -> Option<Level> {
        Level::from_string(&self.level_raw)
    }

    pub fn worker(&self) -> Option<Worker> {
        self.worker_raw.as_ref().and_then(WorkerRef::resolve)
    }

    pub fn sample(&self, field: SampleField) -> Option<f64> {
        match field {
            SampleField::HeapUsed => self.heap_used,
            SampleField::HeapTotal => self.heap_total,
            SampleField::Rss => self.rss,
            SampleField::External => self.external,
            SampleField::CpuUser => self.cpu_user,
            SampleField::CpuSystem => self.cpu_system,
        }
    }

    pub fn level_class(&self) -> &'static str {
        self.level().map(|l| l.display_class()).unwrap_or("col-level-unknown")
    }

    pub fn worker_class(&self) -> String {
        self.worker()
            .map(|w| w.display_class())
            .unwrap_or_else(|| "col-thread-unknown".to_string())
    }

    pub fn worker_badge(&self) -> &'static str {
        self.worker().map(|w| w.badge()).unwrap_or("· ????")
    }
}

/// Wire name of each field and the older names it may arrive under.
const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("l", &["level"]),
    ("w", &["worker", "thread"]),
    ("message", &["msg"]),
    ("t", &["timestamp", "time"]),
    ("mhu", &["memory_heap_used"]),
    ("mht", &["memory_heap_total"]),
    ("mrss", &["memory_rss"]),
    ("mext", &["memory_external"]),
    ("ct", &["cpu_user"]),
    ("cl", &["cpu_system"]),
    ("cxt", &["context"]),
    ("p", &["provenance"]),
];

/// Keep one spelling per field: the wire name wins, else the first alias present.
fn dedupe_aliases(row: &mut Map<String, Value>) {
    for (wire, aliases) in FIELD_ALIASES {
        let mut kept = row.contains_key(*wire);
        for alias in aliases.iter() {
            if !row.contains_key(*alias) {
                continue;
            }
            if kept {
                row.remove(*alias);
            } else {
                kept = true;
            }
        }
    }
}

fn decode_row(index: usize, row: Map<String, Value>) -> LogEntry {
    let id = row.get("id").cloned();
    serde_json::from_value(Value::Object(row)).unwrap_or_else(|e| {
        log::app_log("WARN", format!("Log entry #{} undecodable, showing blanks: {}", index, e));
        LogEntry {
            id: id.and_then(|v| lenient::opt_text(v).ok().flatten()).unwrap_or_default(),
            ..Default::default()
        }
    })
}

/// Decode a JSON array of entries. Rows that are not objects are skipped; object
/// rows always yield an entry, in the order received.
pub fn parse_entries(body: &str) -> Result<Vec<LogEntry>, serde_json::Error> {
    let rows: Vec<Value> = serde_json::from_str(body)?;
    let mut entries = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        match row {
            Value::Object(mut map) => {
                dedupe_aliases(&mut map);
                entries.push(decode_row(index, map));
            }
            other => log::app_log("WARN", format!("Log entry #{} is not an object, skipped: {}", index, other)),
        }
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Page query
// ---------------------------------------------------------------------------

/// Parameters of one page request: `(page, level?, worker?)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub level: Option<Level>,
    pub worker: Option<Worker>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, level: None, worker: None }
    }
}

impl PageQuery {
    pub fn new(page: u32, level: Option<Level>, worker: Option<Worker>) -> Self {
        Self { page: page.max(1), level, worker }
    }

    /// Query-string pairs. Unset filters are left out entirely.
    #[cfg_attr(not(feature = "server"), allow(dead_code))]
    pub fn to_pairs(&self, schema: SchemaVersion) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.max(1).to_string())];
        if let Some(level) = self.level {
            pairs.push(("level", level.name().to_string()));
        }
        if let Some(worker) = self.worker {
            pairs.push(("worker", schema.encode_worker(worker)));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

mod lenient {
    use super::*;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_text(d)?.unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite()))
    }

    pub fn worker<'de, D: Deserializer<'de>>(d: D) -> Result<Option<WorkerRef>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64().map(WorkerRef::Code),
            Value::String(s) => Some(WorkerRef::Tag(s)),
            _ => None,
        })
    }
}
