use std::collections::BTreeSet;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

/// Only activity this many days back counts towards streaks.
pub const LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    pub current_streak: i64,
    pub longest_streak: i64,
}

fn local_day(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// Compute day streaks from lesson completion timestamps.
///
/// Timestamps are truncated to calendar days in `offset`. The current streak
/// counts back from today and is 0 when there was no activity today.
pub fn compute(activity: &[DateTime<Utc>], now: DateTime<Utc>, offset: FixedOffset) -> Streaks {
    let cutoff = now - chrono::Duration::days(LOOKBACK_DAYS);

    // descending, deduplicated
    let days: BTreeSet<NaiveDate> = activity
        .iter()
        .filter(|ts| **ts >= cutoff)
        .map(|ts| local_day(*ts, offset))
        .collect();
    let days: Vec<NaiveDate> = days.into_iter().rev().collect();

    if days.is_empty() {
        return Streaks::default();
    }

    let mut current = 0;
    let mut expected = Some(local_day(now, offset));
    for day in &days {
        match expected {
            Some(e) if *day == e => {
                current += 1;
                expected = e.checked_sub_days(Days::new(1));
            }
            Some(e) if *day > e => continue,
            _ => break,
        }
    }

    let mut longest = 1;
    let mut run = 1;
    for pair in days.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    Streaks {
        current_streak: current,
        longest_streak: longest.max(current),
    }
}
