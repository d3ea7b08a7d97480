//! ISO-week bucketing for the weekly point cap.
//!
//! Activities are tagged with the week bucket they were logged in, and the
//! weekly cap is enforced per player per bucket. The bucket is assigned once
//! at creation from the activity's own timestamp and never recomputed, so a
//! later cap change never re-evaluates past weeks.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// An ISO calendar-week bucket, e.g. `2026-W35`.
///
/// Uses the ISO week-numbering year, so dates near a year boundary land in
/// the bucket of the week they actually belong to (`2026-01-01` can be
/// `2025-W53`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekKey(String);

impl WeekKey {
    /// Derive the week bucket for a timestamp.
    pub fn from_datetime(when: &DateTime<Utc>) -> Self {
        let iso = when.iso_week();
        Self(format!("{:04}-W{:02}", iso.year(), iso.week()))
    }

    /// Return the bucket as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for WeekKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
