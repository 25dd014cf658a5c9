use chrono::DateTime;

use crate::domain::market_data::Timestamp;

const DAY_SECS: i64 = 24 * 60 * 60;

/// Format an axis label according to the visible time span, in UTC.
///
/// - span <= 2 days -> `HH:MM`
/// - span <= 1 year -> `DD.MM`
/// - longer -> `MM.YYYY`
pub fn format_time_label(timestamp: Timestamp, visible_span_secs: i64) -> String {
    let Some(dt) = DateTime::from_timestamp(timestamp.value(), 0) else {
        return String::new();
    };
    let pattern = if visible_span_secs <= 2 * DAY_SECS {
        "%H:%M"
    } else if visible_span_secs <= 365 * DAY_SECS {
        "%d.%m"
    } else {
        "%m.%Y"
    };
    dt.format(pattern).to_string()
}

/// Header line of the tooltip, e.g. `2024-01-01 09:30 UTC`.
pub fn format_tooltip_time(timestamp: Timestamp) -> String {
    DateTime::from_timestamp(timestamp.value(), 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default()
}
