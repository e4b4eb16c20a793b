//! Cron-style schedule for pushed reports
//!
//! Five fields: minute hour day-of-month month day-of-week, evaluated in UTC.
//! Each field accepts `*`, `N`, `A-B`, any of those with `/step`, and comma
//! lists. Day-of-week runs 0-6 from Sunday, 7 is also Sunday.

use std::time::Duration;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Timelike, Utc};
use tokio::sync::watch;

use crate::error::GasBotError;
use crate::notify::Notifier;
use crate::report::PriceReporter;

/// Upper bound on the search for the next fire time (about four years)
const MAX_SEARCH_MINUTES: i64 = 4 * 366 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    allowed: Vec<bool>,
    restricted: bool,
}

impl Field {
    fn parse(expr: &str, min: u32, max: u32, name: &str) -> Result<Self, GasBotError> {
        let mut allowed = vec![false; max as usize + 1];
        // `*/N` still counts as unrestricted for the day-field rule
        let restricted = !expr.starts_with('*');

        for part in expr.split(',') {
            let (range, step) = match part.split_once('/') {
                Some((range, step)) => {
                    let step: u32 = step.parse().map_err(|_| invalid(name, part))?;
                    if step == 0 || step > max {
                        return Err(invalid(name, part));
                    }
                    (range, step)
                }
                None => (part, 1),
            };

            let (start, end) = if range == "*" {
                (min, max)
            } else if let Some((a, b)) = range.split_once('-') {
                let a: u32 = a.parse().map_err(|_| invalid(name, part))?;
                let b: u32 = b.parse().map_err(|_| invalid(name, part))?;
                (a, b)
            } else {
                let v: u32 = range.parse().map_err(|_| invalid(name, part))?;
                // `N/step` runs from N to the end of the range
                if step > 1 {
                    (v, max)
                } else {
                    (v, v)
                }
            };

            if start < min || end > max || start > end {
                return Err(invalid(name, part));
            }

            let mut v = start;
            while v <= end {
                allowed[v as usize] = true;
                match v.checked_add(step) {
                    Some(n) => v = n,
                    None => break,
                }
            }
        }

        Ok(Self {
            allowed,
            restricted,
        })
    }

    fn matches(&self, value: u32) -> bool {
        self.allowed.get(value as usize).copied().unwrap_or(false)
    }
}

fn invalid(field: &str, part: &str) -> GasBotError {
    GasBotError::config(format!("invalid cron {} field '{}'", field, part))
}

/// Parsed five-field cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    expr: String,
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl Schedule {
    pub fn parse(expr: &str) -> Result<Self, GasBotError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(GasBotError::config(format!(
                "cron expression '{}' must have 5 fields, got {}",
                expr,
                fields.len()
            )));
        }

        let mut day_of_week = Field::parse(fields[4], 0, 7, "day-of-week")?;
        if day_of_week.allowed[7] {
            day_of_week.allowed[0] = true;
        }

        Ok(Self {
            expr: expr.to_string(),
            minute: Field::parse(fields[0], 0, 59, "minute")?,
            hour: Field::parse(fields[1], 0, 23, "hour")?,
            day_of_month: Field::parse(fields[2], 1, 31, "day-of-month")?,
            month: Field::parse(fields[3], 1, 12, "month")?,
            day_of_week,
        })
    }

    /// Whether the minute containing `t` is a fire time
    pub fn matches(&self, t: &DateTime<Utc>) -> bool {
        if !self.minute.matches(t.minute())
            || !self.hour.matches(t.hour())
            || !self.month.matches(t.month())
        {
            return false;
        }

        let dom = self.day_of_month.matches(t.day());
        let dow = self.day_of_week.matches(t.weekday().num_days_from_sunday());
        // cron: when both day fields are restricted either may match
        if self.day_of_month.restricted && self.day_of_week.restricted {
            dom || dow
        } else {
            dom && dow
        }
    }

    /// First fire time strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let floored = after
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))?;
        let mut candidate = floored + ChronoDuration::minutes(1);
        for _ in 0..MAX_SEARCH_MINUTES {
            if self.matches(&candidate) {
                return Some(candidate);
            }
            candidate += ChronoDuration::minutes(1);
        }
        None
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expr)
    }
}

/// Fire time following `fired`, never earlier than `now` and never `fired` again
fn following_fire(schedule: &Schedule, fired: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.next_after(fired.max(now))
}

/// Push a report to `chat_id` at every fire time until `shutdown` flips
pub async fn run_scheduler(
    schedule: Schedule,
    reporter: PriceReporter,
    notifier: std::sync::Arc<dyn Notifier>,
    chat_id: i64,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(schedule = %schedule, chat_id = chat_id, "Scheduler started");

    let Some(mut next) = schedule.next_after(Utc::now()) else {
        tracing::error!(schedule = %schedule, "Schedule never fires, scheduler stopping");
        return;
    };

    loop {
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!(next = %next, wait_secs = wait.as_secs(), "Next scheduled report");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => {
                tracing::info!("Scheduler stopping");
                return;
            }
        }

        let text = match reporter.report("schedule").await {
            Ok(report) => report,
            Err(e) => PriceReporter::failure_message(&e),
        };
        if let Err(e) = notifier.send(chat_id, &text).await {
            tracing::error!(chat_id = chat_id, error = %e, "Failed to deliver scheduled report");
        }

        next = match following_fire(&schedule, next, Utc::now()) {
            Some(t) => t,
            None => {
                tracing::error!(schedule = %schedule, "No further fire time, scheduler stopping");
                return;
            }
        };
    }
}
