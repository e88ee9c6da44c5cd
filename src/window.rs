//! Window Aggregator
//!
//! Day-indexed observation sets behind the sliding-window activity model: a
//! single update check is counted as evidence of activity for every day in a
//! window centered on its own day (`days_before` before, `days_after` after).
//! Installations that check in rarely still cover the days around their one
//! observed check.
//!
//! Buckets are append-only while open. A day is closed - its estimate final -
//! once the latest observed day is far enough past it that no future record's
//! window can still reach it; closed buckets are evicted after reporting, so
//! retained state is bounded by the window span rather than the run length.

use crate::models::DayEstimate;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashSet};

/// Observation sets for one calendar day.
///
/// An IP lands in exactly one of `ips_with_id`/`ips_without_id` per record
/// that touches the bucket; composite site keys only ever land in
/// `sites_with_id`.
#[derive(Debug, Default)]
struct DayBucket {
    sites_with_id: HashSet<String>,
    ips_with_id: HashSet<String>,
    ips_without_id: HashSet<String>,
}

pub struct WindowAggregator {
    buckets: BTreeMap<NaiveDate, DayBucket>,
    days_before: i64,
    days_after: i64,
    /// First day any bucket was created (start of the first record's
    /// window); buckets that later jitter creates before it are never
    /// reported.
    min_date_seen: Option<NaiveDate>,
}

impl WindowAggregator {
    pub fn new(days_before: u32, days_after: u32) -> Self {
        Self {
            buckets: BTreeMap::new(),
            days_before: i64::from(days_before),
            days_after: i64::from(days_after),
            min_date_seen: None,
        }
    }

    /// Record one observation: touches every bucket in the validity window
    /// around `day`.
    ///
    /// The stored site key is `key|ip`, so two installations behind one IP
    /// stay distinct and one installation seen from two IPs counts twice -
    /// while repeat sightings of the same pair collapse.
    pub fn register(&mut self, day: NaiveDate, site_key: Option<&str>, ip: &str) {
        if self.min_date_seen.is_none() {
            self.min_date_seen = Some(day - Duration::days(self.days_before));
        }

        let composite = site_key.map(|key| format!("{}|{}", key, ip));
        for offset in -self.days_before..=self.days_after {
            let bucket = self.buckets.entry(day + Duration::days(offset)).or_default();
            match &composite {
                Some(composite) => {
                    bucket.sites_with_id.insert(composite.clone());
                    bucket.ips_with_id.insert(ip.to_string());
                }
                None => {
                    bucket.ips_without_id.insert(ip.to_string());
                }
            }
        }
    }

    /// Days whose window can no longer receive contributions, ascending,
    /// given that `reference_day` is the latest observed day. Recomputed from
    /// current state on every call; days before the first window's start
    /// never report.
    pub fn closed_days_as_of(&self, reference_day: NaiveDate) -> Vec<NaiveDate> {
        let Some(min_date) = self.min_date_seen else {
            return Vec::new();
        };
        let cutoff = reference_day - Duration::days(self.days_before + 1);
        self.buckets
            .keys()
            .copied()
            .filter(|day| *day >= min_date && *day < cutoff)
            .collect()
    }

    /// All still-retained reportable days through `last_day`, ascending.
    /// Used at end of stream, where every remaining open day is final.
    /// Buckets past the last observed day only ever held window spillover
    /// and are not reportable.
    pub fn remaining_days(&self, last_day: NaiveDate) -> Vec<NaiveDate> {
        let Some(min_date) = self.min_date_seen else {
            return Vec::new();
        };
        self.buckets
            .keys()
            .copied()
            .filter(|day| *day >= min_date && *day <= last_day)
            .collect()
    }

    /// Set sizes for `day`, plus the extrapolated count of unidentified
    /// sites: the identified population's sites-per-IP ratio applied to the
    /// unidentified IPs. Read-only; a day with no bucket reports zeros.
    pub fn estimate(&self, day: NaiveDate) -> DayEstimate {
        let (sites_with_id, ips_with_id, ips_without_id) = match self.buckets.get(&day) {
            Some(bucket) => (
                bucket.sites_with_id.len() as u64,
                bucket.ips_with_id.len() as u64,
                bucket.ips_without_id.len() as u64,
            ),
            None => (0, 0, 0),
        };

        let sites_without_id_estimate = if ips_with_id == 0 {
            0
        } else {
            (sites_with_id as f64 / ips_with_id as f64 * ips_without_id as f64).round() as u64
        };

        DayEstimate {
            sites_with_id,
            sites_without_id_estimate,
            ips_with_id,
            ips_without_id,
        }
    }

    /// Drop every bucket up to and including `day`. Called once the days have
    /// been reported; earlier never-reportable spillover goes with them.
    pub fn evict_through(&mut self, day: NaiveDate) {
        self.buckets = self.buckets.split_off(&(day + Duration::days(1)));
    }

    #[cfg(test)]
    fn bucket_days(&self) -> Vec<NaiveDate> {
        self.buckets.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_register_touches_full_window() {
        let mut agg = WindowAggregator::new(6, 6);
        agg.register(day("2024-01-10"), Some("k"), "1.1.1.1");

        let days = agg.bucket_days();
        assert_eq!(days.len(), 13);
        assert_eq!(days.first().copied(), Some(day("2024-01-04")));
        assert_eq!(days.last().copied(), Some(day("2024-01-16")));
    }

    #[test]
    fn test_degenerate_window_is_single_day() {
        let mut agg = WindowAggregator::new(0, 0);
        agg.register(day("2024-01-10"), None, "1.1.1.1");
        assert_eq!(agg.bucket_days(), vec![day("2024-01-10")]);
    }

    #[test]
    fn test_composite_key_disambiguation() {
        let mut agg = WindowAggregator::new(0, 0);
        let d = day("2024-01-10");
        // Two installations behind one IP: two sites, one IP.
        agg.register(d, Some("a"), "1.1.1.1");
        agg.register(d, Some("b"), "1.1.1.1");
        // Same installation+IP pair again on a later register collapses.
        agg.register(d, Some("a"), "1.1.1.1");
        // Same key from a second IP is a distinct site entry.
        agg.register(d, Some("a"), "2.2.2.2");

        let est = agg.estimate(d);
        assert_eq!(est.sites_with_id, 3);
        assert_eq!(est.ips_with_id, 2);
        assert_eq!(est.ips_without_id, 0);
    }

    #[test]
    fn test_ip_registered_in_exactly_one_set() {
        let mut agg = WindowAggregator::new(1, 1);
        let d = day("2024-01-10");
        agg.register(d, Some("k"), "1.1.1.1");
        agg.register(d, None, "2.2.2.2");

        let est = agg.estimate(d);
        assert_eq!(est.ips_with_id, 1);
        assert_eq!(est.ips_without_id, 1);
    }

    #[test]
    fn test_estimate_with_no_identified_ips_is_zero() {
        let mut agg = WindowAggregator::new(6, 6);
        agg.register(day("2024-01-10"), None, "1.1.1.1");

        let est = agg.estimate(day("2024-01-10"));
        assert_eq!(est.sites_with_id, 0);
        assert_eq!(est.ips_with_id, 0);
        assert_eq!(est.ips_without_id, 1);
        assert_eq!(est.sites_without_id_estimate, 0);
    }

    #[test]
    fn test_estimate_extrapolates_by_ratio() {
        let mut agg = WindowAggregator::new(0, 0);
        let d = day("2024-01-10");
        // Three sites across two identified IPs, three unidentified IPs:
        // round(3/2 * 3) = round(4.5) = 5.
        agg.register(d, Some("a"), "1.1.1.1");
        agg.register(d, Some("b"), "1.1.1.1");
        agg.register(d, Some("c"), "2.2.2.2");
        agg.register(d, None, "3.3.3.3");
        agg.register(d, None, "4.4.4.4");
        agg.register(d, None, "5.5.5.5");

        let est = agg.estimate(d);
        assert_eq!(est.sites_without_id_estimate, 5);
        assert_eq!(est.total_sites(), 8);
        assert_eq!(est.total_ips(), 5);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let mut agg = WindowAggregator::new(6, 6);
        let d = day("2024-01-10");
        agg.register(d, Some("k"), "1.1.1.1");
        agg.register(d, None, "2.2.2.2");

        assert_eq!(agg.estimate(d), agg.estimate(d));
    }

    #[test]
    fn test_closed_days_follow_the_latest_reference() {
        let mut agg = WindowAggregator::new(6, 6);
        agg.register(day("2024-01-10"), Some("k"), "1.1.1.1");
        agg.register(day("2024-01-20"), Some("k"), "1.1.1.1");

        // Cutoff is 2024-01-20 minus 7 days: every bucket from the first
        // window's start through 2024-01-12 is closed.
        let closed = agg.closed_days_as_of(day("2024-01-20"));
        let expected: Vec<NaiveDate> = (4..=12).map(|d| day(&format!("2024-01-{:02}", d))).collect();
        assert_eq!(closed, expected);
    }

    #[test]
    fn test_no_days_close_while_the_window_can_still_change() {
        let mut agg = WindowAggregator::new(6, 6);
        agg.register(day("2024-01-10"), Some("k"), "1.1.1.1");
        // Same-day reference closes nothing.
        assert!(agg.closed_days_as_of(day("2024-01-10")).is_empty());
        // One day later the cutoff still shields the first window's start.
        let closed = agg.closed_days_as_of(day("2024-01-11"));
        assert!(closed.is_empty());
        let closed = agg.closed_days_as_of(day("2024-01-12"));
        assert_eq!(closed, vec![day("2024-01-04")]);
    }

    #[test]
    fn test_evict_through_drops_reported_days() {
        let mut agg = WindowAggregator::new(6, 6);
        agg.register(day("2024-01-10"), Some("k"), "1.1.1.1");
        agg.evict_through(day("2024-01-12"));

        let days = agg.bucket_days();
        assert_eq!(days.first().copied(), Some(day("2024-01-13")));
        // Eviction does not disturb later buckets.
        assert_eq!(days.last().copied(), Some(day("2024-01-16")));
    }

    #[test]
    fn test_remaining_days_stop_at_last_observed_day() {
        let mut agg = WindowAggregator::new(6, 6);
        agg.register(day("2024-01-10"), Some("k"), "1.1.1.1");

        let remaining = agg.remaining_days(day("2024-01-10"));
        // Window spillover past the last observed day is not reportable.
        assert_eq!(remaining.first().copied(), Some(day("2024-01-04")));
        assert_eq!(remaining.last().copied(), Some(day("2024-01-10")));
        assert_eq!(remaining.len(), 7);
    }
}
