use chrono::{DateTime, NaiveDateTime};

use crate::error::{NkError, Result};

/// Timestamp layout used by the EDF catalog and the survey sheets
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses an EDF seconds string such as `"1"` or `"0.5"` into 100 ns units.
///
/// Digits past the seventh decimal place are dropped.
pub fn parse_edf_time(s: &str) -> Result<i64> {
    let trimmed = s.trim();
    let invalid = || NkError::InvalidFormat(format!("Invalid duration '{}'", trimmed));

    let (sign, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }

    let digits = |part: &str| -> Result<i64> {
        if part.is_empty() {
            Ok(0)
        } else if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse::<i64>().map_err(|_| invalid())
        } else {
            Err(invalid())
        }
    };

    let fraction = &fraction[..fraction.len().min(7)];
    let ticks = digits(whole)? * crate::EDFLIB_TIME_DIMENSION
        + digits(fraction)? * 10i64.pow(7 - fraction.len() as u32);

    Ok(sign * ticks)
}

/// Locale-independent integer parse; blank or garbage reads as 0.
pub fn atoi_nonlocalized(s: &str) -> i32 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }

    s.parse().unwrap_or(0)
}

/// Locale-independent float parse; blank or garbage reads as 0.0.
pub fn atof_nonlocalized(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    s.parse().unwrap_or(0.0)
}

/// Extracts the high-pass and low-pass cutoffs (Hz) from an EDF prefilter
/// field such as `"HP:0.1Hz LP:70Hz N:60Hz"`.
///
/// `HP:DC` is read as a 0 Hz high-pass. Cutoffs given in kHz are scaled.
pub fn parse_prefilter(prefilter: &str) -> (Option<f64>, Option<f64>) {
    let upper = prefilter.to_ascii_uppercase();
    (cutoff_after(&upper, "HP:"), cutoff_after(&upper, "LP:"))
}

fn cutoff_after(field: &str, key: &str) -> Option<f64> {
    let start = field.find(key)? + key.len();
    let rest = field[start..].trim_start();

    if rest.starts_with("DC") {
        return Some(0.0);
    }

    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(rest.len());
    let value: f64 = rest[..end].parse().ok()?;

    if rest[end..].trim_start().starts_with("KHZ") {
        Some(value * 1000.0)
    } else {
        Some(value)
    }
}

/// Nanoseconds since the Unix epoch for a naive wall-clock time.
///
/// Header and survey clocks are both naive; they are mapped onto the epoch
/// without any zone shift so they stay comparable.
pub fn naive_to_ns(t: NaiveDateTime) -> Result<u64> {
    let nanos = t
        .and_utc()
        .timestamp_nanos_opt()
        .ok_or_else(|| NkError::InvalidTimestamp(format!("{} is out of range", t)))?;
    u64::try_from(nanos)
        .map_err(|_| NkError::InvalidTimestamp(format!("{} is before the Unix epoch", t)))
}

/// Inverse of [`naive_to_ns`].
pub fn ns_to_naive(ns: u64) -> Option<NaiveDateTime> {
    let secs = i64::try_from(ns / 1_000_000_000).ok()?;
    let nsecs = (ns % 1_000_000_000) as u32;
    DateTime::from_timestamp(secs, nsecs).map(|dt| dt.naive_utc())
}

/// Parses a timestamp cell from a catalog or survey sheet.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    ACCEPTED_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| NkError::InvalidTimestamp(s.to_string()))
}

pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}
