use chrono::{DateTime, Local, TimeZone, Utc};

// ============== Text Helpers ==============

const TRUNCATION_MARKER: &str = "...";

/// Cap `text` at `max_len` characters. Over-long input keeps
/// `max_len - 3` characters and ends in `...`, so the result is exactly
/// `max_len` long.
pub fn truncate_caption(text: &str, max_len: usize) -> String {
    let len = text.chars().count();
    if len <= max_len {
        return text.to_string();
    }

    let keep = max_len.saturating_sub(TRUNCATION_MARKER.len());
    let mut out = text.chars().take(keep).collect::<String>();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Short single-purpose preview for log lines.
pub fn preview(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut out = text.chars().take(max_len).collect::<String>();
    out.push_str(TRUNCATION_MARKER);
    out
}

// ============== Timestamp Helpers ==============

/// Local midnight of the day containing `now`, as a UTC instant.
///
/// Falls back to 24h before `now` in the (DST-gap) case where local midnight
/// does not exist.
pub fn start_of_local_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| tz.from_local_datetime(&naive).earliest());

    match midnight {
        Some(m) => m.with_timezone(&Utc),
        None => now.with_timezone(&Utc) - chrono::Duration::hours(24),
    }
}

/// Start of today in the process' local time zone.
pub fn start_of_today() -> DateTime<Utc> {
    start_of_local_day(&Local::now())
}
