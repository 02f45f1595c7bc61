//! Recency window check.
//!
//! Both the publication time and "now" are viewed in the site's fixed zone
//! before comparing. Two policies are available:
//!
//! - [`RecencyPolicy::CalendarDays`] (default): difference between the two
//!   calendar dates, correct across month and year boundaries.
//! - [`RecencyPolicy::DayOfMonth`]: difference between the day-of-month
//!   numbers only. Kept for compatibility with archives built under that
//!   rule; around a month boundary it accepts almost anything
//!   (`1 - 31 = -30`).
//!
//! Articles dated in the future are always accepted.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// How the day distance between two instants is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyPolicy {
    #[default]
    CalendarDays,
    DayOfMonth,
}

/// Accepts articles published at most `window_days` days before "now".
#[derive(Debug, Clone, Copy)]
pub struct RecencyFilter {
    pub window_days: u32,
    pub zone: FixedOffset,
    pub policy: RecencyPolicy,
}

impl RecencyFilter {
    pub fn new(window_days: u32, zone: FixedOffset, policy: RecencyPolicy) -> Self {
        Self {
            window_days,
            zone,
            policy,
        }
    }

    /// Whether an article updated at `update_time` is still fresh at `now`.
    ///
    /// # Arguments
    ///
    /// * `now` - Reference instant, normally `Utc::now()`.
    /// * `update_time` - The article's publication time.
    ///
    /// # Returns
    ///
    /// `true` when the day distance is at most `window_days`, including any
    /// negative distance (future-dated articles).
    pub fn accepts(&self, now: DateTime<Utc>, update_time: DateTime<Utc>) -> bool {
        self.days_between(now, update_time) <= i64::from(self.window_days)
    }

    /// Days from `update_time` to `now` under this filter's policy.
    pub fn days_between(&self, now: DateTime<Utc>, update_time: DateTime<Utc>) -> i64 {
        let now = now.with_timezone(&self.zone);
        let then = update_time.with_timezone(&self.zone);
        match self.policy {
            RecencyPolicy::CalendarDays => (now.date_naive() - then.date_naive()).num_days(),
            RecencyPolicy::DayOfMonth => i64::from(now.day()) - i64::from(then.day()),
        }
    }
}
