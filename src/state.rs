//! View state owned by the root component: the entry collection, the current
//! query, and fetch bookkeeping.

use crate::model::{Level, LogEntry, PageQuery, SchemaVersion, Worker};

/// Identifies one fetch. Only the newest ticket's response is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied(usize),
    Failed,
    /// A newer fetch was started after this one; the response was dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub entries: Vec<LogEntry>,
    pub page: u32,
    pub level: Option<Level>,
    pub worker: Option<Worker>,
    pub schema: SchemaVersion,
    pub loading: bool,
    pub error: Option<String>,
    /// Set once the first live page has replaced the placeholder entries.
    pub live: bool,
    latest: u64,
}

impl ViewState {
    pub fn new(initial: Vec<LogEntry>) -> Self {
        Self {
            entries: initial,
            page: 1,
            level: None,
            worker: None,
            schema: SchemaVersion::default(),
            loading: false,
            error: None,
            live: false,
            latest: 0,
        }
    }

    pub fn query(&self) -> PageQuery {
        PageQuery::new(self.page, self.level, self.worker)
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    /// Switch schema, dropping a level filter the new schema does not carry.
    pub fn set_schema(&mut self, schema: SchemaVersion) {
        self.schema = schema;
        if self.level.is_some_and(|l| !schema.supports_level(l)) {
            self.level = None;
        }
    }

    /// Start a fetch; any earlier ticket becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest += 1;
        self.loading = true;
        FetchTicket(self.latest)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Apply a response. Success replaces the whole collection; failure keeps it.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<LogEntry>, String>) -> FetchOutcome {
        if !self.is_current(ticket) {
            return FetchOutcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(entries) => {
                let n = entries.len();
                self.entries = entries;
                self.error = None;
                self.live = true;
                FetchOutcome::Applied(n)
            }
            Err(e) => {
                self.error = Some(e);
                FetchOutcome::Failed
            }
        }
    }
}
