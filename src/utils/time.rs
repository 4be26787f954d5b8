use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use now::DateTimeNow;

/// This is the standard way of converting a date to a string in focusflow.
pub fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Returns start of the next day.
pub fn next_day_start<Tz: TimeZone>(date: DateTime<Tz>) -> DateTime<Tz> {
    (date + Duration::days(1)).with_time(NaiveTime::MIN).unwrap()
}

/// UTC bounds of one local calendar day, `[00:00, next day 00:00)`.
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    // anchored at noon so the local conversion stays unambiguous around DST shifts
    let noon = Local
        .from_local_datetime(&day.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()))
        .unwrap();
    let start = noon.beginning_of_day();
    (
        start.with_timezone(&Utc),
        next_day_start(start).with_timezone(&Utc),
    )
}

/// Formats a duration as zero padded `HH:MM:SS`. Negative values render as zero.
pub fn format_duration(value: Duration) -> String {
    let total = value.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, total % 3600 / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Local, TimeZone};

    use super::*;

    #[test]
    fn durations_format_zero_padded() {
        assert_eq!(format_duration(Duration::seconds(0)), "00:00:00");
        assert_eq!(format_duration(Duration::seconds(3661)), "01:01:01");
        assert_eq!(format_duration(Duration::seconds(-5)), "00:00:00");
        assert_eq!(format_duration(Duration::hours(100)), "100:00:00");
    }

    #[test]
    fn day_bounds_cover_a_whole_day() {
        let day = Local
            .with_ymd_and_hms(2018, 7, 4, 12, 0, 0)
            .unwrap()
            .date_naive();

        let (start, end) = day_bounds(day);

        assert_eq!(end - start, Duration::days(1));
        assert_eq!(start.with_timezone(&Local).date_naive(), day);
    }
}
