//! Interval parsing for `--interval`.

use std::time::Duration;

use anyhow::Context;

/// Parse an interval such as "60", "300s", "30m" or "1h".
///
/// A bare number is taken as seconds. Zero is allowed and means the next
/// cycle starts right away.
pub fn parse_interval(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty interval");
    }

    let (digits, unit_secs) = match s.char_indices().last() {
        Some((i, 'h')) => (&s[..i], 3600),
        Some((i, 'm')) => (&s[..i], 60),
        Some((i, 's')) => (&s[..i], 1),
        _ => (s, 1),
    };

    let count: u64 = digits
        .trim()
        .parse()
        .with_context(|| format!("Invalid interval '{s}': expected e.g. 60, 300s, 30m, 1h"))?;
    let secs = count
        .checked_mul(unit_secs)
        .with_context(|| format!("Interval '{s}' is too large"))?;

    Ok(Duration::from_secs(secs))
}
