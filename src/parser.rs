use crate::models::LogRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Streaming reader over an access log: one JSON record per line.
///
/// Unlike a collect-then-process parser this yields records one at a time, so
/// a multi-gigabyte log never has to fit in memory. Blank lines are skipped;
/// a line that does not decode into a [`LogRecord`] fails the run with its
/// line number.
#[derive(Debug)]
pub struct LogReader {
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl LogReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("invalid log filename: {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }
}

impl Iterator for LogReader {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let line_number = self.line_number;
            return Some(
                serde_json::from_str::<LogRecord>(trimmed)
                    .with_context(|| format!("malformed log record at line {}", line_number)),
            );
        }
    }
}

/// Parse a record timestamp into a UTC instant.
/// Handles both Z suffix and explicit timezone offsets.
pub fn parse_timestamp(timestamp_str: &str) -> Result<DateTime<Utc>> {
    let timestamp = if timestamp_str.ends_with('Z') {
        timestamp_str.replace('Z', "+00:00")
    } else {
        timestamp_str.to_string()
    };

    // Try parsing as ISO 8601
    if let Ok(dt) = DateTime::parse_from_rfc3339(&timestamp) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try parsing as naive datetime and assume UTC
    if let Ok(naive) = NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    anyhow::bail!("Failed to parse timestamp: {}", timestamp_str)
}
