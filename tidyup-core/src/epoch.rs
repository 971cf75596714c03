//! Epoch engine: maps instants to rotation weeks.
//!
//! Everything here is pure time arithmetic over `chrono` values. Week
//! arithmetic runs at millisecond resolution on UTC instants; only the two
//! Sunday anchors look at a local calendar, through the time zone of the
//! `now` argument.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::types::WeekKey;

/// Length of one rotation week in milliseconds (exactly 7 × 24 × 3600 s).
pub const WEEK_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Local wall-clock time of the weekly anchor: Sunday 23:59:00.
const ANCHOR_MINUTES_AFTER_MIDNIGHT: i64 = 23 * 60 + 59;

/// One rotation week as a `chrono::Duration`.
pub fn week() -> Duration {
    Duration::milliseconds(WEEK_MILLIS)
}

/// `floor((now - start) / WEEK)`. Negative when `now` precedes `start`.
pub fn week_index(now: DateTime<Utc>, start: DateTime<Utc>) -> i64 {
    (now.timestamp_millis() - start.timestamp_millis()).div_euclid(WEEK_MILLIS)
}

/// Lower bound of week `index`.
pub fn week_start(start: DateTime<Utc>, index: i64) -> DateTime<Utc> {
    start + Duration::milliseconds(WEEK_MILLIS.saturating_mul(index))
}

/// The instant at which the week index next increments. Strictly after `now`.
pub fn next_boundary(now: DateTime<Utc>, start: DateTime<Utc>) -> DateTime<Utc> {
    week_start(start, week_index(now, start) + 1)
}

/// Completion-map key for the week containing `now`.
pub fn week_key(now: DateTime<Utc>, start: DateTime<Utc>) -> WeekKey {
    WeekKey::from(week_index(now, start))
}

/// Next Sunday 23:59:00 in `now`'s time zone, strictly after `now`.
pub fn next_sunday_2359<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let days_ahead = (7 - days_from_sunday(now)) % 7;
    let candidate = anchor_on(&now.timezone(), now.date_naive() + Duration::days(days_ahead));
    if candidate <= now.with_timezone(&Utc) {
        candidate + week()
    } else {
        candidate
    }
}

/// Most recent Sunday 23:59:00 in `now`'s time zone, at or before `now`.
pub fn prev_sunday_2359<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let candidate = anchor_on(
        &now.timezone(),
        now.date_naive() - Duration::days(days_from_sunday(now)),
    );
    if candidate > now.with_timezone(&Utc) {
        candidate - week()
    } else {
        candidate
    }
}

/// Returns `start` when it is set and not in the future, otherwise the most
/// recent Sunday anchor.
pub fn clamp_start<Tz: TimeZone>(start: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> DateTime<Utc> {
    match start {
        Some(start) if start <= now.with_timezone(&Utc) => start,
        _ => prev_sunday_2359(now),
    }
}

/// 0-based day of week, Sunday first. Shared by both anchors.
fn days_from_sunday<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    i64::from(now.weekday().num_days_from_sunday())
}

fn anchor_on<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN) + Duration::minutes(ANCHOR_MINUTES_AFTER_MIDNIGHT);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        // 23:59 inside a DST gap: fall back to the same wall time read as UTC.
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use rstest::rstest;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("rfc3339")
            .with_timezone(&Utc)
    }

    // 2024-06-02 is a Sunday.
    const SUNDAY_ANCHOR: &str = "2024-06-02T23:59:00Z";

    #[rstest]
    #[case("2024-06-02T23:59:00Z", 0)]
    #[case("2024-06-09T23:58:59Z", 0)]
    #[case("2024-06-09T23:59:00Z", 1)]
    #[case("2024-06-16T23:59:00Z", 2)]
    #[case("2024-06-02T23:58:59Z", -1)]
    #[case("2024-05-26T23:59:00Z", -1)]
    #[case("2024-05-26T23:58:59Z", -2)]
    fn week_index_floors(#[case] now: &str, #[case] expected: i64) {
        assert_eq!(week_index(utc(now), utc(SUNDAY_ANCHOR)), expected);
    }

    #[test]
    fn week_index_is_monotonic_and_steps_by_one_at_boundaries() {
        let start = utc(SUNDAY_ANCHOR);
        let mut now = start - Duration::days(10);
        let mut last = week_index(now, start);
        while now < start + Duration::days(30) {
            now += Duration::hours(5);
            let idx = week_index(now, start);
            assert!(idx >= last);
            assert!(idx - last <= 1);
            last = idx;
        }
        for k in -3..4 {
            let boundary = week_start(start, k);
            assert_eq!(week_index(boundary, start), k);
            assert_eq!(week_index(boundary - Duration::milliseconds(1), start), k - 1);
        }
    }

    #[rstest]
    #[case("2024-06-02T23:59:00Z", "2024-06-09T23:59:00Z")]
    #[case("2024-06-05T12:00:00Z", "2024-06-09T23:59:00Z")]
    #[case("2024-05-30T00:00:00Z", "2024-06-02T23:59:00Z")]
    fn next_boundary_is_strictly_after_now(#[case] now: &str, #[case] expected: &str) {
        let next = next_boundary(utc(now), utc(SUNDAY_ANCHOR));
        assert_eq!(next, utc(expected));
        assert!(next > utc(now));
    }

    #[test]
    fn week_key_changes_at_boundary() {
        let start = utc(SUNDAY_ANCHOR);
        assert_eq!(week_key(start, start), WeekKey::from("0"));
        assert_eq!(week_key(start + week(), start), WeekKey::from("1"));
    }

    #[rstest]
    // Wednesday
    #[case("2024-06-05T10:00:00Z", "2024-06-09T23:59:00Z", "2024-06-02T23:59:00Z")]
    // Sunday morning: anchor later the same day
    #[case("2024-06-09T08:00:00Z", "2024-06-09T23:59:00Z", "2024-06-02T23:59:00Z")]
    // Exactly on the anchor: next is a week later, previous is now
    #[case("2024-06-09T23:59:00Z", "2024-06-16T23:59:00Z", "2024-06-09T23:59:00Z")]
    // Sunday after the anchor minute
    #[case("2024-06-09T23:59:30Z", "2024-06-16T23:59:00Z", "2024-06-09T23:59:00Z")]
    // Saturday
    #[case("2024-06-08T23:00:00Z", "2024-06-09T23:59:00Z", "2024-06-02T23:59:00Z")]
    fn sunday_anchors(#[case] now: &str, #[case] next: &str, #[case] prev: &str) {
        let now = utc(now);
        assert_eq!(next_sunday_2359(&now), utc(next));
        assert_eq!(prev_sunday_2359(&now), utc(prev));
        assert!(next_sunday_2359(&now) > now);
        assert!(prev_sunday_2359(&now) <= now);
    }

    #[test]
    fn anchors_agree_modulo_one_week() {
        let mut now = utc("2024-06-01T00:00:00Z");
        for _ in 0..200 {
            let next = next_sunday_2359(&now);
            let prev = prev_sunday_2359(&now);
            assert_eq!(next - prev, week(), "at {now}");
            now += Duration::minutes(97);
        }
    }

    #[test]
    fn anchors_use_local_calendar_of_the_offset() {
        // 2024-06-09T20:00Z is Monday 2024-06-10 05:00 at +09:00.
        let tokyo = FixedOffset::east_opt(9 * 3600).expect("offset");
        let now = utc("2024-06-09T20:00:00Z").with_timezone(&tokyo);
        let prev = prev_sunday_2359(&now).with_timezone(&tokyo);
        assert_eq!(prev.to_rfc3339(), "2024-06-09T23:59:00+09:00");
        let next = next_sunday_2359(&now).with_timezone(&tokyo);
        assert_eq!(next.to_rfc3339(), "2024-06-16T23:59:00+09:00");
    }

    #[test]
    fn clamp_start_keeps_past_and_replaces_future_or_missing() {
        let now = utc("2024-06-05T10:00:00Z");
        let past = utc("2024-01-07T23:59:00Z");
        assert_eq!(clamp_start(Some(past), &now), past);
        assert_eq!(clamp_start(Some(now), &now), now);
        let anchor = utc("2024-06-02T23:59:00Z");
        assert_eq!(clamp_start(Some(now + Duration::days(3)), &now), anchor);
        assert_eq!(clamp_start(None, &now), anchor);
    }
}
