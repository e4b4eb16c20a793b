//! Report timestamps at a fixed UTC+9 offset
//!
//! The offset is applied to the UTC instant directly, so the host timezone
//! database is never consulted.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

/// Offset of report timestamps from UTC
pub const REPORT_OFFSET_SECS: i32 = 9 * 60 * 60;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S (UTC+09:00)";

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Produces the timestamp line at the top of each report
#[derive(Clone)]
pub struct ReportClock {
    source: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl ReportClock {
    pub fn new(source: Arc<dyn Clock>) -> Self {
        Self {
            source,
            offset: report_offset(),
        }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Current instant expressed at UTC+9
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.source.now_utc().with_timezone(&self.offset)
    }

    /// Formatted timestamp line
    pub fn stamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }
}

impl Default for ReportClock {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for ReportClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportClock")
            .field("offset", &self.offset)
            .finish()
    }
}

fn report_offset() -> FixedOffset {
    FixedOffset::east_opt(REPORT_OFFSET_SECS).expect("UTC+9 is a valid offset")
}
