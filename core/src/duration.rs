//! Duration arithmetic over (start, end, period) triples.
//!
//! All division happens on integer nanoseconds (i128), so repeated calls
//! that chain `last_completion_time` into the next `start` never drift.

use crate::types::Timestamp;
use chrono::TimeDelta;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Result of `number_of_times_completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completions {
    pub count:                u64,
    /// Latest instant ≤ end at which a whole number of periods had elapsed
    /// since start. Feed it back in as the next call's start.
    pub last_completion_time: Timestamp,
}

/// How many whole `period`s fit between `start` and `end`.
///
/// Panics unless `end > start` and `period > 0`. Both are programming
/// errors: a zero-rate caller must short-circuit before getting here.
pub fn number_of_times_completed(start: Timestamp, end: Timestamp, period: TimeDelta) -> Completions {
    assert!(end > start, "number_of_times_completed: end {end} is not after start {start}");
    assert!(
        period > TimeDelta::zero(),
        "number_of_times_completed: period {period} is not positive"
    );

    let elapsed = total_nanos(end - start);
    let period_nanos = total_nanos(period);

    let count = elapsed / period_nanos;
    let remainder = elapsed % period_nanos;

    Completions {
        count:                u64::try_from(count).unwrap_or(u64::MAX),
        last_completion_time: end - from_nanos(remainder),
    }
}

/// Exact nanosecond length of a duration. Sign is preserved.
pub fn total_nanos(delta: TimeDelta) -> i128 {
    // num_seconds truncates toward zero and subsec_nanos carries the same sign.
    i128::from(delta.num_seconds()) * NANOS_PER_SECOND + i128::from(delta.subsec_nanos())
}

/// Inverse of `total_nanos`. Saturates at the `TimeDelta` range.
pub fn from_nanos(nanos: i128) -> TimeDelta {
    let secs = nanos.div_euclid(NANOS_PER_SECOND);
    let rem = nanos.rem_euclid(NANOS_PER_SECOND);
    let secs = i64::try_from(secs).unwrap_or(if nanos < 0 { i64::MIN } else { i64::MAX });
    TimeDelta::try_seconds(secs)
        .map(|s| s + TimeDelta::nanoseconds(rem as i64))
        .unwrap_or(if nanos < 0 { TimeDelta::MIN } else { TimeDelta::MAX })
}

pub fn as_seconds_f64(delta: TimeDelta) -> f64 {
    total_nanos(delta) as f64 / NANOS_PER_SECOND as f64
}

/// Closest `TimeDelta` to `secs` at nanosecond resolution. Non-finite
/// input saturates.
pub fn from_seconds_f64(secs: f64) -> TimeDelta {
    if secs.is_nan() {
        return TimeDelta::zero();
    }
    let nanos = (secs * NANOS_PER_SECOND as f64).round();
    if nanos >= i128::MAX as f64 {
        return TimeDelta::MAX;
    }
    if nanos <= i128::MIN as f64 {
        return TimeDelta::MIN;
    }
    from_nanos(nanos as i128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(secs: i64, millis: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap() + TimeDelta::milliseconds(millis)
    }

    #[test]
    fn counts_whole_periods_and_keeps_remainder() {
        let c = number_of_times_completed(t(0, 0), t(5, 500), TimeDelta::seconds(1));
        assert_eq!(c.count, 5);
        assert_eq!(c.last_completion_time, t(5, 0));
    }

    #[test]
    fn exact_multiple_lands_on_end() {
        let c = number_of_times_completed(t(0, 0), t(9, 0), TimeDelta::seconds(3));
        assert_eq!(c.count, 3);
        assert_eq!(c.last_completion_time, t(9, 0));
    }

    #[test]
    fn shorter_than_one_period_is_zero() {
        let c = number_of_times_completed(t(0, 0), t(0, 250), TimeDelta::seconds(1));
        assert_eq!(c.count, 0);
        assert_eq!(c.last_completion_time, t(0, 0));
    }

    #[test]
    fn handles_sub_nanosecond_unfriendly_periods() {
        // 1/3 s does not divide evenly; integer nanos must still be exact.
        let third = TimeDelta::nanoseconds(333_333_333);
        let c = number_of_times_completed(t(0, 0), t(1, 0), third);
        assert_eq!(c.count, 3);
        assert_eq!(c.last_completion_time, t(0, 0) + TimeDelta::nanoseconds(999_999_999));
    }

    #[test]
    #[should_panic(expected = "is not after start")]
    fn end_before_start_panics() {
        number_of_times_completed(t(5, 0), t(1, 0), TimeDelta::seconds(1));
    }

    #[test]
    #[should_panic(expected = "is not after start")]
    fn empty_interval_panics() {
        number_of_times_completed(t(5, 0), t(5, 0), TimeDelta::seconds(1));
    }

    #[test]
    #[should_panic(expected = "is not positive")]
    fn zero_period_panics() {
        number_of_times_completed(t(0, 0), t(1, 0), TimeDelta::zero());
    }

    #[test]
    fn nanos_round_trip_negative_durations() {
        let d = TimeDelta::milliseconds(-1_500);
        assert_eq!(total_nanos(d), -1_500_000_000);
        assert_eq!(from_nanos(total_nanos(d)), d);
        assert_eq!(as_seconds_f64(d), -1.5);
    }

    #[test]
    fn seconds_f64_rounds_to_nearest_nano() {
        assert_eq!(from_seconds_f64(0.5), TimeDelta::milliseconds(500));
        assert_eq!(from_seconds_f64(f64::INFINITY), TimeDelta::MAX);
        assert_eq!(from_seconds_f64(f64::NAN), TimeDelta::zero());
    }
}
