use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Asia::Tokyo;
use chrono_tz::Tz;

/// Fixed timestamp layout shared by every sheet column that stores a time.
/// Zero-padded and fixed-width, so lexicographic order matches time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Watermark used when `last_report_at` has never been written.
pub const DEFAULT_WATERMARK: &str = "2000-01-01 00:00:00";

pub fn now_jst() -> DateTime<Tz> {
    Utc::now().with_timezone(&Tokyo)
}

/// Current JST time in the persisted timestamp format.
pub fn now_jst_string() -> String {
    now_jst().format(TIMESTAMP_FORMAT).to_string()
}

/// Current JST date, `YYYY-MM-DD`.
pub fn today_jst_string() -> String {
    now_jst().format("%Y-%m-%d").to_string()
}

/// Current JST wall-clock time, `HH:MM:SS`.
pub fn clock_jst_string() -> String {
    now_jst().format("%H:%M:%S").to_string()
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}
