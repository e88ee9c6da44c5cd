//! Core Data Models
//!
//! Types flowing through the analysis pipeline:
//!
//! 1. **Raw input**: [`LogRecord`] - one access-log line, decoded from JSON
//! 2. **Classification**: [`Classification`] / [`ApiCall`] - what the
//!    identifier extractor derived from a record
//! 3. **Estimation**: [`DayEstimate`] - set sizes and the extrapolated
//!    unidentified-site count for one closed day
//! 4. **Output**: [`DayReport`] - serializable report row for JSON output
//!
//! [`RunStats`] carries the per-run diagnostic counters. It is owned by the
//! driver and passed by reference where needed; there is no process-global
//! counter state.

use serde::{Deserialize, Serialize};

/// One line of the update-check API access log.
///
/// `time` is an ISO-8601-like timestamp, `remote_host` is used verbatim as
/// the client IP. A line missing any of these fields fails the run.
#[derive(Debug, Clone, Deserialize)]
pub struct LogRecord {
    pub time: String,
    pub url: String,
    pub user_agent: String,
    pub remote_host: String,
}

/// Result of classifying one log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The record is not an update-check call and contributes nothing.
    NotApiCall,
    /// The record is an update-check call.
    ApiCall(ApiCall),
}

/// An update-check call: the client IP plus the stable per-installation key,
/// when the protocol version carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub ip: String,
    pub site_key: Option<String>,
}

/// Set sizes for one day, with the ratio-extrapolated estimate of sites that
/// sent no identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayEstimate {
    pub sites_with_id: u64,
    pub sites_without_id_estimate: u64,
    pub ips_with_id: u64,
    pub ips_without_id: u64,
}

impl DayEstimate {
    pub fn total_sites(&self) -> u64 {
        self.sites_with_id + self.sites_without_id_estimate
    }

    pub fn total_ips(&self) -> u64 {
        self.ips_with_id + self.ips_without_id
    }
}

/// Serializable report row for one closed day.
#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub date: String,
    #[serde(rename = "totalSites")]
    pub total_sites: u64,
    #[serde(rename = "sitesWithId")]
    pub sites_with_id: u64,
    #[serde(rename = "sitesWithoutIdEstimate")]
    pub sites_without_id_estimate: u64,
    #[serde(rename = "totalIps")]
    pub total_ips: u64,
    #[serde(rename = "ipsWithId")]
    pub ips_with_id: u64,
    #[serde(rename = "ipsWithoutId")]
    pub ips_without_id: u64,
}

impl DayReport {
    pub fn new(date: String, estimate: &DayEstimate) -> Self {
        Self {
            date,
            total_sites: estimate.total_sites(),
            sites_with_id: estimate.sites_with_id,
            sites_without_id_estimate: estimate.sites_without_id_estimate,
            total_ips: estimate.total_ips(),
            ips_with_id: estimate.ips_with_id,
            ips_without_id: estimate.ips_without_id,
        }
    }
}

/// Per-run diagnostic counters, read once at end of run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunStats {
    /// Every input line, API call or not.
    pub records: u64,
    /// Lines classified as update-check calls.
    #[serde(rename = "apiRecords")]
    pub api_records: u64,
    /// Update-check calls whose embedded identifier URL did not parse.
    #[serde(rename = "failedRecords")]
    pub failed_records: u64,
}
