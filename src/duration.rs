// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Duration parsing for Go-style duration strings.
//!
//! Parses the same grammar as Go's `time.ParseDuration`: a possibly signed sequence of
//! decimal numbers, each with an optional fraction and a mandatory unit suffix, such as
//! `"300ms"`, `"1.5h"` or `"2h45m"`. Valid units are `ns`, `us` (or `µs`), `ms`, `s`,
//! `m` and `h`. Negative durations are rejected since a certificate lifetime cannot be
//! negative.

use anyhow::{bail, Context, Result};
use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Largest duration Go can represent (`math.MaxInt64` nanoseconds, ~292 years).
const MAX_DURATION_NANOS: u128 = i64::MAX as u128;

/// Fraction digits beyond this are ignored; they are below nanosecond precision anyway.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parse a Go-style duration string into a Rust `Duration`.
///
/// # Examples
///
/// ```
/// use acm_manager::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("8760h").unwrap(), Duration::from_secs(31_536_000));
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
/// assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
///
/// assert!(parse_duration("").is_err());
/// assert!(parse_duration("10").is_err());   // Missing unit
/// assert!(parse_duration("30d").is_err());  // Days are not a Go unit
/// assert!(parse_duration("-1h").is_err());  // Negative
/// ```
///
/// # Errors
///
/// Returns an error if:
/// - The string is empty or contains no number
/// - A number is missing its unit, or the unit is unknown
/// - The duration is negative
/// - The duration exceeds what Go can represent (~292 years)
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    if duration_str.is_empty() {
        bail!("Duration string cannot be empty");
    }

    let mut rest = duration_str;
    if rest.starts_with('-') {
        bail!("Duration '{duration_str}' is negative");
    }
    rest = rest.strip_prefix('+').unwrap_or(rest);

    // Special case: a bare zero needs no unit
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        bail!("Duration '{duration_str}' contains no value");
    }

    let mut total_nanos: u128 = 0;

    while !rest.is_empty() {
        // Integer part
        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_end);

        // Optional fraction
        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_end = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_end)
            }
            None => ("", after_int),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            bail!("Invalid duration '{duration_str}': expected a number");
        }

        // Unit runs until the next number starts
        let unit_end = after_number
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_number.len());
        let (unit, remaining) = after_number.split_at(unit_end);

        let unit_nanos = unit_in_nanos(unit)
            .with_context(|| format!("Invalid duration '{duration_str}'"))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .with_context(|| format!("Duration '{duration_str}' is too large"))?
        };

        let mut component = whole
            .checked_mul(unit_nanos)
            .with_context(|| format!("Duration '{duration_str}' is too large"))?;

        if !frac_part.is_empty() {
            let digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
            let numerator: u128 = digits
                .parse()
                .with_context(|| format!("Invalid fraction in duration '{duration_str}'"))?;
            let denominator = 10u128.pow(u32::try_from(digits.len())?);
            component += numerator * unit_nanos / denominator;
        }

        total_nanos = total_nanos
            .checked_add(component)
            .filter(|total| *total <= MAX_DURATION_NANOS)
            .with_context(|| format!("Duration '{duration_str}' is too large"))?;

        rest = remaining;
    }

    let secs = u64::try_from(total_nanos / NANOS_PER_SECOND)?;
    let nanos = u32::try_from(total_nanos % NANOS_PER_SECOND)?;
    Ok(Duration::new(secs, nanos))
}

/// Size of one `unit` in nanoseconds.
fn unit_in_nanos(unit: &str) -> Result<u128> {
    Ok(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => NANOS_PER_MICRO,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SECOND,
        "m" => NANOS_PER_MINUTE,
        "h" => NANOS_PER_HOUR,
        "" => bail!("missing unit (use ns, us, ms, s, m or h)"),
        other => bail!("unknown unit '{other}' (use ns, us, ms, s, m or h)"),
    })
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod duration_tests;
