//! Report Formatting
//!
//! Turns a closed day's estimate into output. Pure formatting - the emitter
//! holds no state, so re-rendering the same snapshot always produces the
//! same line.

use crate::models::{DayEstimate, DayReport, RunStats};
use chrono::NaiveDate;
use colored::Colorize;

pub struct ReportEmitter {
    color: bool,
}

impl ReportEmitter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// One closed day as a plain report line:
    /// `2024-01-04: ~2 sites (1 with ID, ~1 without); 2 IPs (1 with ID, 1 without)`.
    pub fn format_line(date: NaiveDate, estimate: &DayEstimate) -> String {
        format!(
            "{}: ~{} sites ({} with ID, ~{} without); {} IPs ({} with ID, {} without)",
            date.format("%Y-%m-%d"),
            estimate.total_sites(),
            estimate.sites_with_id,
            estimate.sites_without_id_estimate,
            estimate.total_ips(),
            estimate.ips_with_id,
            estimate.ips_without_id,
        )
    }

    pub fn print_day(&self, date: NaiveDate, estimate: &DayEstimate) {
        if !self.color {
            println!("{}", Self::format_line(date, estimate));
            return;
        }
        println!(
            "{}: ~{} sites ({} with ID, ~{} without); {} IPs ({} with ID, {} without)",
            date.format("%Y-%m-%d").to_string().bright_white().bold(),
            estimate.total_sites().to_string().bright_green().bold(),
            estimate.sites_with_id,
            estimate.sites_without_id_estimate,
            estimate.total_ips().to_string().bright_cyan().bold(),
            estimate.ips_with_id,
            estimate.ips_without_id,
        );
    }

    /// Rule printed before each batch of newly closed days.
    pub fn print_separator(&self) {
        if self.color {
            println!("{}", "---".bright_cyan());
        } else {
            println!("---");
        }
    }

    pub fn print_summary(&self, stats: &RunStats) {
        let line = format!(
            "📊 Processed {} records ({} update checks, {} unparseable identifiers)",
            stats.records, stats.api_records, stats.failed_records
        );
        if self.color {
            println!("{}", line.bright_white());
        } else {
            println!("{}", line);
        }
    }

    /// The whole run as one JSON document.
    pub fn print_json(&self, days: &[DayReport], stats: &RunStats) {
        let output = serde_json::json!({ "days": days, "summary": stats });
        match serde_json::to_string_pretty(&output) {
            Ok(json_str) => println!("{}", json_str),
            Err(e) => eprintln!("Error serializing report to JSON: {}", e),
        }
    }
}
