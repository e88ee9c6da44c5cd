//! Ordering Guard
//!
//! The estimator assumes input arrives in timestamp order; day-close
//! decisions would silently go wrong on unsorted input. The guard tolerates
//! small backwards jitter (clock skew between log writers) but treats
//! anything beyond the tolerance as fatal.

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};

pub struct OrderingGuard {
    /// High-water mark of accepted timestamps. Jitter within tolerance is
    /// accepted without rewinding this, so a later record is always compared
    /// against the newest instant seen.
    high_water: Option<DateTime<Utc>>,
    tolerance: Duration,
}

impl OrderingGuard {
    pub fn new(tolerance_ms: i64) -> Self {
        Self {
            high_water: None,
            tolerance: Duration::milliseconds(tolerance_ms),
        }
    }

    /// Accept or reject the next record's timestamp. Rejection is fatal for
    /// the run; there is no degraded continuation.
    pub fn check(&mut self, timestamp: DateTime<Utc>) -> Result<()> {
        if let Some(high_water) = self.high_water {
            if high_water - timestamp > self.tolerance {
                bail!(
                    "log entries are not sorted in ascending order ({} seen after {})",
                    timestamp.to_rfc3339(),
                    high_water.to_rfc3339()
                );
            }
            if timestamp > high_water {
                self.high_water = Some(timestamp);
            }
        } else {
            self.high_water = Some(timestamp);
        }
        Ok(())
    }
}
