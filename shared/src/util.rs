/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Start of the calendar month containing `now_ms` (UTC), in milliseconds.
///
/// Monthly quotas are counted from this instant.
pub fn billing_period_start(now_ms: i64) -> i64 {
    use chrono::{Datelike, TimeZone, Utc};

    let Some(now) = Utc.timestamp_millis_opt(now_ms).single() else {
        return 0;
    };
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .map(|start| start.timestamp_millis())
        .unwrap_or(0)
}
