//! Signed nanosecond durations and the duration-literal grammar
//!
//! Literals are sequences of `number unit` pairs with an optional leading
//! sign, e.g. `1h2m3s`, `-1.5h` or `200us`. Valid units are `ns`, `us`
//! (or `µs`/`μs`), `ms`, `s`, `m` and `h`.

use crate::error::ParseError;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

const KIND: &str = "Duration";

/// Largest magnitude a literal may reach before the sign is applied (`|i64::MIN|`).
const MAX_MAGNITUDE: u64 = 1 << 63;

const UNITS: [(&str, u64); 8] = [
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

/// A span of time stored as a signed 64-bit count of nanoseconds.
///
/// Unlike [`std::time::Duration`] it can be negative, which the literal
/// grammar allows (`-1h30m`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(i64);

/// Returned when converting between [`Duration`] and [`std::time::Duration`]
/// would lose the sign or the magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("duration is out of range for the target representation")]
pub struct DurationRangeError;

impl Duration {
    pub const ZERO: Duration = Duration(0);
    pub const NANOSECOND: Duration = Duration(1);
    pub const MICROSECOND: Duration = Duration(1_000);
    pub const MILLISECOND: Duration = Duration(1_000_000);
    pub const SECOND: Duration = Duration(1_000_000_000);
    pub const MINUTE: Duration = Duration(60_000_000_000);
    pub const HOUR: Duration = Duration(3_600_000_000_000);

    pub const fn from_nanos(nanos: i64) -> Self {
        Duration(nanos)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Duration) -> Option<Duration> {
        self.0.checked_add(rhs.0).map(Duration)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Duration> {
        self.0.checked_mul(rhs).map(Duration)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Duration {
        Duration(-self.0)
    }
}

impl Mul<i64> for Duration {
    type Output = Duration;

    fn mul(self, rhs: i64) -> Duration {
        Duration(self.0 * rhs)
    }
}

impl TryFrom<Duration> for std::time::Duration {
    type Error = DurationRangeError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        u64::try_from(value.0)
            .map(std::time::Duration::from_nanos)
            .map_err(|_| DurationRangeError)
    }
}

impl TryFrom<std::time::Duration> for Duration {
    type Error = DurationRangeError;

    fn try_from(value: std::time::Duration) -> Result<Self, Self::Error> {
        i64::try_from(value.as_nanos())
            .map(Duration)
            .map_err(|_| DurationRangeError)
    }
}

impl FromStr for Duration {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut rest = input;
        let mut negative = false;
        if let Some(stripped) = rest.strip_prefix('-') {
            negative = true;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('+') {
            rest = stripped;
        }

        // a bare zero is the only literal allowed without a unit
        if rest == "0" {
            return Ok(Duration::ZERO);
        }
        if rest.is_empty() {
            return Err(ParseError::invalid(input, KIND, "empty duration"));
        }

        let mut total: u64 = 0;
        while !rest.is_empty() {
            if !rest.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
                return Err(ParseError::invalid(input, KIND, "expected a number"));
            }

            let (whole, after_whole) =
                leading_int(rest).ok_or_else(|| ParseError::overflow(input, KIND))?;
            let has_whole = after_whole.len() != rest.len();
            rest = after_whole;

            let mut fraction = 0;
            let mut scale = 1.0;
            let mut has_fraction = false;
            if let Some(after_dot) = rest.strip_prefix('.') {
                let (digits, digits_scale, after_fraction) = leading_fraction(after_dot);
                has_fraction = after_fraction.len() != after_dot.len();
                fraction = digits;
                scale = digits_scale;
                rest = after_fraction;
            }
            if !has_whole && !has_fraction {
                return Err(ParseError::invalid(input, KIND, "expected a number"));
            }

            let unit_len = rest
                .find(|c: char| c == '.' || c.is_ascii_digit())
                .unwrap_or(rest.len());
            if unit_len == 0 {
                return Err(ParseError::invalid(input, KIND, "missing unit"));
            }
            let (unit, after_unit) = rest.split_at(unit_len);
            let per_unit = UNITS
                .iter()
                .find(|(name, _)| *name == unit)
                .map(|(_, nanos)| *nanos)
                .ok_or_else(|| {
                    ParseError::invalid(input, KIND, format!("unknown unit '{unit}'"))
                })?;
            rest = after_unit;

            let mut value = whole
                .checked_mul(per_unit)
                .filter(|v| *v <= MAX_MAGNITUDE)
                .ok_or_else(|| ParseError::overflow(input, KIND))?;
            if fraction > 0 {
                value += (fraction as f64 * (per_unit as f64 / scale)) as u64;
                if value > MAX_MAGNITUDE {
                    return Err(ParseError::overflow(input, KIND));
                }
            }
            total = total
                .checked_add(value)
                .filter(|t| *t <= MAX_MAGNITUDE)
                .ok_or_else(|| ParseError::overflow(input, KIND))?;
        }

        if negative {
            // total <= 2^63, so this lands on i64::MIN at worst
            return Ok(Duration((total as i64).wrapping_neg()));
        }
        i64::try_from(total)
            .map(Duration)
            .map_err(|_| ParseError::overflow(input, KIND))
    }
}

/// Consume leading ASCII digits; `None` once the value exceeds 2^63.
fn leading_int(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let mut value: u64 = 0;
    for b in s[..end].bytes() {
        if value > (MAX_MAGNITUDE - 1) / 10 {
            return None;
        }
        value = value * 10 + u64::from(b - b'0');
        if value > MAX_MAGNITUDE {
            return None;
        }
    }
    Some((value, &s[end..]))
}

/// Consume fraction digits, dropping precision that no longer fits.
fn leading_fraction(s: &str) -> (u64, f64, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let mut value: u64 = 0;
    let mut scale = 1.0;
    let mut saturated = false;
    for b in s[..end].bytes() {
        if saturated {
            continue;
        }
        if value > (i64::MAX as u64) / 10 {
            saturated = true;
            continue;
        }
        let next = value * 10 + u64::from(b - b'0');
        if next > MAX_MAGNITUDE {
            saturated = true;
            continue;
        }
        value = next;
        scale *= 10.0;
    }
    (value, scale, &s[end..])
}

impl fmt::Display for Duration {
    /// Canonical literal, e.g. `1h2m0.0002s`, `1.5ms` or `0s`.
    ///
    /// Parsing the output yields the same duration.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nanos = self.0.unsigned_abs();
        if nanos == 0 {
            return f.write_str("0s");
        }

        // built back to front
        let mut out: Vec<char> = Vec::with_capacity(32);
        if nanos < Duration::SECOND.0 as u64 {
            let (suffix, precision) = if nanos < Duration::MICROSECOND.0 as u64 {
                ("sn", 0)
            } else if nanos < Duration::MILLISECOND.0 as u64 {
                ("sµ", 3)
            } else {
                ("sm", 6)
            };
            out.extend(suffix.chars());
            nanos = push_fraction(&mut out, nanos, precision);
            push_int(&mut out, nanos);
        } else {
            out.push('s');
            nanos = push_fraction(&mut out, nanos, 9);
            push_int(&mut out, nanos % 60);
            nanos /= 60;
            if nanos > 0 {
                out.push('m');
                push_int(&mut out, nanos % 60);
                nanos /= 60;
                if nanos > 0 {
                    out.push('h');
                    push_int(&mut out, nanos);
                }
            }
        }
        if self.0 < 0 {
            out.push('-');
        }

        let literal: String = out.into_iter().rev().collect();
        f.write_str(&literal)
    }
}

/// Push the lowest `precision` digits of `value` as a fraction, trailing
/// zeros (and the dot, if nothing is left) omitted. Returns the integer part.
fn push_fraction(out: &mut Vec<char>, mut value: u64, precision: u32) -> u64 {
    let mut printed = false;
    for _ in 0..precision {
        let digit = value % 10;
        printed = printed || digit != 0;
        if printed {
            out.push(char::from(b'0' + digit as u8));
        }
        value /= 10;
    }
    if printed {
        out.push('.');
    }
    value
}

fn push_int(out: &mut Vec<char>, mut value: u64) {
    if value == 0 {
        out.push('0');
        return;
    }
    while value > 0 {
        out.push(char::from(b'0' + (value % 10) as u8));
        value /= 10;
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Duration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Duration {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let literal = String::deserialize(deserializer)?;
        literal.parse().map_err(serde::de::Error::custom)
    }
}
