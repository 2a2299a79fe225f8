//! `mm:ss.mmm` time strings used throughout reports.

/// Format seconds as `mm:ss.mmm`, truncating to whole milliseconds.
///
/// Minutes are not wrapped into hours, so long runs print `125:03.250`.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let whole = seconds.trunc() as u64;
    let millis = ((seconds - whole as f64) * 1000.0) as u64;
    format!("{:02}:{:02}.{:03}", whole / 60, whole % 60, millis.min(999))
}

/// Parse a `mm:ss.mmm` string back into seconds.
pub fn parse_time(text: &str) -> Option<f64> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    if !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(minutes as f64 * 60.0 + seconds)
}

/// Sum two time strings.
pub fn sum_times(first: &str, second: &str) -> Option<String> {
    Some(format_time(parse_time(first)? + parse_time(second)?))
}

/// `mm:ss.mmm (p%)` where `p` is the truncated share of `total`.
pub fn format_share(seconds: f64, total: f64) -> String {
    let percent = if total > 0.0 {
        (seconds / total * 100.0) as i64
    } else {
        0
    };
    format!("{} ({percent}%)", format_time(seconds))
}
