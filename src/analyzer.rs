//! Stream Driver
//!
//! Orchestrates the per-record pipeline: ordering guard, identifier
//! extraction, window registration, and day-boundary report emission. Owns
//! all mutable run state - the aggregator, the guard, the diagnostic
//! counters - for exactly one pass over one log.

use crate::extractor;
use crate::models::{Classification, DayReport, LogRecord, RunStats};
use crate::ordering::OrderingGuard;
use crate::parser::{self, LogReader};
use crate::report::ReportEmitter;
use crate::window::WindowAggregator;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub days_before: u32,
    pub days_after: u32,
    pub tolerance_ms: i64,
    pub json_output: bool,
    pub color: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            days_before: 6,
            days_after: 6,
            tolerance_ms: 60_000,
            json_output: false,
            color: true,
        }
    }
}

pub struct LogAnalyzer {
    aggregator: WindowAggregator,
    guard: OrderingGuard,
    emitter: ReportEmitter,
    stats: RunStats,
    last_day: Option<NaiveDate>,
    reports: Vec<DayReport>,
    json_output: bool,
}

impl LogAnalyzer {
    pub fn new(options: RunOptions) -> Self {
        Self {
            aggregator: WindowAggregator::new(options.days_before, options.days_after),
            guard: OrderingGuard::new(options.tolerance_ms),
            emitter: ReportEmitter::new(options.color && !options.json_output),
            stats: RunStats::default(),
            last_day: None,
            reports: Vec::new(),
            json_output: options.json_output,
        }
    }

    /// Single pass over the log: process every record, then flush the
    /// remaining open days. A fatal error (unreadable file, malformed
    /// record, out-of-order input) aborts with whatever was already emitted.
    pub fn analyze_file(&mut self, path: &Path) -> Result<()> {
        tracing::info!(log_file = %path.display(), "starting analysis");
        let reader = LogReader::open(path)?;
        for record in reader {
            let record = record?;
            self.process_record(&record)?;
        }
        self.finish();
        Ok(())
    }

    pub fn process_record(&mut self, record: &LogRecord) -> Result<()> {
        self.stats.records += 1;

        let timestamp = parser::parse_timestamp(&record.time)
            .with_context(|| format!("record {} has an unparseable time", self.stats.records))?;
        self.guard.check(timestamp)?;
        let day = timestamp.date_naive();

        if let Classification::ApiCall(call) = extractor::classify(record, &mut self.stats) {
            self.aggregator.register(day, call.site_key.as_deref(), &call.ip);
        }

        // Day boundary: report every day the new reference closes.
        if let Some(last_day) = self.last_day {
            if day != last_day {
                let closed = self.aggregator.closed_days_as_of(day);
                self.emit_days(&closed);
            }
        }
        self.last_day = Some(day);

        Ok(())
    }

    /// End of stream: every still-open day through the last observed one is
    /// now final. Prints the run summary (or the JSON document).
    pub fn finish(&mut self) {
        if let Some(last_day) = self.last_day {
            let remaining = self.aggregator.remaining_days(last_day);
            self.emit_days(&remaining);
        }

        tracing::info!(
            records = self.stats.records,
            api_records = self.stats.api_records,
            failed_records = self.stats.failed_records,
            reported_days = self.reports.len(),
            "analysis complete"
        );

        if self.json_output {
            self.emitter.print_json(&self.reports, &self.stats);
        } else {
            self.emitter.print_summary(&self.stats);
        }
    }

    fn emit_days(&mut self, days: &[NaiveDate]) {
        if days.is_empty() {
            return;
        }
        if !self.json_output {
            self.emitter.print_separator();
        }
        for &day in days {
            let estimate = self.aggregator.estimate(day);
            tracing::debug!(day = %day, sites_with_id = estimate.sites_with_id, "day closed");
            if !self.json_output {
                self.emitter.print_day(day, &estimate);
            }
            self.reports
                .push(DayReport::new(day.format("%Y-%m-%d").to_string(), &estimate));
        }
        if let Some(last) = days.last() {
            self.aggregator.evict_through(*last);
        }
    }

    /// All report rows emitted so far, in emission (ascending date) order.
    pub fn reports(&self) -> &[DayReport] {
        &self.reports
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}
