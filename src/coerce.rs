//! Scalar coercions from raw export text to typed values
//!
//! Every function here is total: malformed input yields `None` (the missing
//! marker) instead of an error, so a single bad cell never aborts a run.

/// Size values that carry no numeric information
const SIZE_SENTINELS: [&str; 4] = ["varies with device", "-", "unknown", ""];

const KIB_PER_MIB: f64 = 1024.0;
const BYTES_PER_MB: f64 = 1_000_000.0;

/// Parse a finite float, ignoring surrounding whitespace
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a non-negative integer count. A float spelling such as `"3.0"` is
/// truncated.
pub fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u64>() {
        return i64::try_from(v).ok();
    }
    let v = parse_number(s)?;
    if v < 0.0 || v >= i64::MAX as f64 {
        return None;
    }
    Some(v.trunc() as i64)
}

/// Install counts like `"1,000,000+"`
pub fn parse_count(s: &str) -> Option<i64> {
    parse_int(&strip_chars(s, &['+', ',']))
}

/// Comma-grouped integers like `"2,345"`
pub fn parse_grouped_int(s: &str) -> Option<i64> {
    parse_int(&strip_chars(s, &[',']))
}

/// Prices like `"$2.99"`. Negative amounts are not prices.
pub fn parse_currency(s: &str) -> Option<f64> {
    parse_number(&strip_chars(s, &['$', ','])).filter(|v| *v >= 0.0)
}

/// Sizes like `"19M"` or `"512k"`, returned in megabytes.
///
/// The `k` suffix is binary (1024 kilobytes per megabyte). Sentinels such as
/// `"Varies with device"` are missing.
pub fn parse_size(s: &str) -> Option<f64> {
    let s = s.trim();
    let lowered = s.to_lowercase();
    if SIZE_SENTINELS.contains(&lowered.as_str()) {
        return None;
    }

    if let Some(prefix) = s.strip_suffix('M') {
        parse_number(prefix)
    } else if let Some(prefix) = s.strip_suffix('k') {
        parse_number(prefix).map(|kb| kb / KIB_PER_MIB)
    } else {
        parse_number(s)
    }
}

/// Byte counts to decimal megabytes
pub fn bytes_to_mb(s: &str) -> Option<f64> {
    parse_number(s).map(|bytes| bytes / BYTES_PER_MB)
}

fn strip_chars(s: &str, chars: &[char]) -> String {
    s.chars().filter(|c| !chars.contains(c)).collect()
}
