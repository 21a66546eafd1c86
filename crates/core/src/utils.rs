use chrono::{DateTime, Local, TimeZone};

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Converts an epoch timestamp (seconds) to local time as `YYYY-MM-DD HH:MM:SS`.
/// Missing or out-of-range timestamps yield an empty string.
pub fn format_epoch_to_local(timestamp: Option<i64>) -> String {
    let Some(secs) = timestamp else {
        return String::new();
    };

    // Ambiguous local times (DST fold) resolve to the earlier instant
    let local: Option<DateTime<Local>> = Local.timestamp_opt(secs, 0).earliest();
    match local {
        Some(dt) => dt.format(DATE_FORMAT).to_string(),
        None => String::new(),
    }
}
