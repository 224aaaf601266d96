//! Fixed-precision lap time values.
//!
//! Two independent types back the two textual forms used by the game's
//! community timesheets:
//! - [`LapTime`] — compact `M:SS.mmm` (e.g. `1:06.243`), minutes unbounded
//! - [`LapTimeExt`] — extended `H:MM:SS.mmm`, used for multi-hour totals
//!
//! Both store a single integer millisecond magnitude, so repeated arithmetic
//! never accumulates floating-point error. Values are immutable; every
//! operation returns a new value.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static COMPACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{2})\.(\d{3})$").expect("valid compact time regex"));

static EXTENDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})\.(\d{3})$").expect("valid extended time regex")
});

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Which textual form a time value (or raw operand) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// `M:SS.mmm`
    Compact,
    /// `H:MM:SS.mmm`
    Extended,
}

impl Variant {
    /// Human-readable pattern for error messages.
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Compact => "M:SS.mmm",
            Self::Extended => "H:MM:SS.mmm",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

/// Errors from parsing or constructing lap times.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimeError {
    /// The string does not match the required time pattern.
    #[error("time {input:?} does not match the {expected} format")]
    Format {
        input: String,
        expected: Variant,
    },

    /// An operand of one variant was combined with the other variant.
    #[error("cannot combine a {value} time with a {operand} operand")]
    VariantMismatch { value: Variant, operand: Variant },

    /// Seconds-based construction was given a negative (or NaN) value.
    #[error("seconds must be a non-negative number, got {value}")]
    NegativeSeconds { value: f64 },
}

/// An operand for lap-time arithmetic: either an already-parsed value or a
/// raw string in the same variant's format.
///
/// Raw strings are resolved by [`LapTime::coerce`] / [`LapTimeExt::coerce`]
/// at the boundary of every public operation; a string in the *other*
/// variant's format is a [`TimeError::VariantMismatch`], never silently
/// reinterpreted.
#[derive(Debug, Clone, Copy)]
pub enum TimeOperand<'a, T> {
    /// An already-typed time value.
    Time(T),
    /// A raw string to be parsed as the same variant.
    Raw(&'a str),
}

impl From<LapTime> for TimeOperand<'_, LapTime> {
    fn from(time: LapTime) -> Self {
        Self::Time(time)
    }
}

impl<'a> From<&'a str> for TimeOperand<'a, LapTime> {
    fn from(raw: &'a str) -> Self {
        Self::Raw(raw)
    }
}

impl From<LapTimeExt> for TimeOperand<'_, LapTimeExt> {
    fn from(time: LapTimeExt) -> Self {
        Self::Time(time)
    }
}

impl<'a> From<&'a str> for TimeOperand<'a, LapTimeExt> {
    fn from(raw: &'a str) -> Self {
        Self::Raw(raw)
    }
}

/// A compact lap time in `M:SS.mmm` form.
///
/// Equality and ordering are by magnitude, not by source string: `1:06.243`
/// equals any value constructed to 66243 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LapTime {
    millis: u64,
}

impl LapTime {
    /// The zero duration, `0:00.000`.
    pub const ZERO: Self = Self { millis: 0 };

    /// Builds a time directly from a millisecond magnitude.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Builds a time from a non-negative number of seconds, rounded to
    /// millisecond resolution.
    pub fn from_seconds(seconds: f64) -> Result<Self, TimeError> {
        Ok(Self::from_millis(seconds_to_millis(seconds)?))
    }

    /// Returns the magnitude in whole milliseconds.
    #[must_use]
    pub const fn total_millis(self) -> u64 {
        self.millis
    }

    /// Returns the magnitude as floating-point seconds.
    ///
    /// Output/aggregation boundary only — the float must not be round-tripped
    /// back into a time value for further exact arithmetic, since re-parsing
    /// via seconds may round.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_seconds(self) -> f64 {
        self.millis as f64 / 1_000.0
    }

    /// Resolves an operand to a typed value.
    ///
    /// A raw string in the extended format is a [`TimeError::VariantMismatch`]
    /// here, never silently reinterpreted; this check lives at the operand
    /// boundary only, so a bare parse of the wrong shape stays a plain
    /// [`TimeError::Format`].
    pub fn coerce(operand: TimeOperand<'_, Self>) -> Result<Self, TimeError> {
        match operand {
            TimeOperand::Time(time) => Ok(time),
            TimeOperand::Raw(raw) => {
                if EXTENDED_RE.is_match(raw) {
                    return Err(TimeError::VariantMismatch {
                        value: Variant::Compact,
                        operand: Variant::Extended,
                    });
                }
                raw.parse()
            }
        }
    }

    /// Adds an operand, returning a new value.
    pub fn plus<'a>(self, other: impl Into<TimeOperand<'a, Self>>) -> Result<Self, TimeError> {
        Ok(self + Self::coerce(other.into())?)
    }

    /// Subtracts an operand, clamping at zero.
    ///
    /// Clamp-to-zero is the documented policy for underflow (an earlier
    /// revision of the system underflowed silently); callers that need to
    /// know the sign should compare first.
    pub fn minus<'a>(self, other: impl Into<TimeOperand<'a, Self>>) -> Result<Self, TimeError> {
        Ok(self - Self::coerce(other.into())?)
    }
}

impl Add for LapTime {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_millis(self.millis.saturating_add(rhs.millis))
    }
}

impl Sub for LapTime {
    type Output = Self;

    // Clamp-to-zero, see `minus`.
    fn sub(self, rhs: Self) -> Self {
        Self::from_millis(self.millis.saturating_sub(rhs.millis))
    }
}

impl FromStr for LapTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(caps) = COMPACT_RE.captures(s) else {
            return Err(TimeError::Format {
                input: s.to_string(),
                expected: Variant::Compact,
            });
        };
        let minutes = parse_field(&caps[1], s, Variant::Compact)?;
        let seconds = parse_field(&caps[2], s, Variant::Compact)?;
        let millis = parse_field(&caps[3], s, Variant::Compact)?;
        Ok(Self::from_millis(
            minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis,
        ))
    }
}

impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.millis / MS_PER_MINUTE;
        let seconds = self.millis % MS_PER_MINUTE / MS_PER_SECOND;
        let millis = self.millis % MS_PER_SECOND;
        write!(f, "{minutes}:{seconds:02}.{millis:03}")
    }
}

impl Serialize for LapTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LapTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An extended lap time in `H:MM:SS.mmm` form.
///
/// Used where compact times can overflow past 59 minutes, such as summing a
/// full timesheet. Not interchangeable with [`LapTime`]: mixing the variants
/// in arithmetic is a [`TimeError::VariantMismatch`]. The only crossing is
/// the explicit, lossless widening `LapTimeExt::from(lap_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LapTimeExt {
    millis: u64,
}

impl LapTimeExt {
    /// The zero duration, `0:00:00.000`.
    pub const ZERO: Self = Self { millis: 0 };

    /// Builds a time directly from a millisecond magnitude.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Builds a time from a non-negative number of seconds, rounded to
    /// millisecond resolution.
    pub fn from_seconds(seconds: f64) -> Result<Self, TimeError> {
        Ok(Self::from_millis(seconds_to_millis(seconds)?))
    }

    /// Returns the magnitude in whole milliseconds.
    #[must_use]
    pub const fn total_millis(self) -> u64 {
        self.millis
    }

    /// Returns the magnitude as floating-point seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_seconds(self) -> f64 {
        self.millis as f64 / 1_000.0
    }

    /// Resolves an operand to a typed value.
    ///
    /// A raw string in the compact format is a [`TimeError::VariantMismatch`],
    /// mirroring [`LapTime::coerce`].
    pub fn coerce(operand: TimeOperand<'_, Self>) -> Result<Self, TimeError> {
        match operand {
            TimeOperand::Time(time) => Ok(time),
            TimeOperand::Raw(raw) => {
                if COMPACT_RE.is_match(raw) {
                    return Err(TimeError::VariantMismatch {
                        value: Variant::Extended,
                        operand: Variant::Compact,
                    });
                }
                raw.parse()
            }
        }
    }

    /// Adds an operand, returning a new value.
    pub fn plus<'a>(self, other: impl Into<TimeOperand<'a, Self>>) -> Result<Self, TimeError> {
        Ok(self + Self::coerce(other.into())?)
    }

    /// Subtracts an operand, clamping at zero.
    pub fn minus<'a>(self, other: impl Into<TimeOperand<'a, Self>>) -> Result<Self, TimeError> {
        Ok(self - Self::coerce(other.into())?)
    }
}

impl From<LapTime> for LapTimeExt {
    /// Widens a compact time. Lossless: both types share the millisecond
    /// magnitude, only the rendering gains an hours field.
    fn from(time: LapTime) -> Self {
        Self::from_millis(time.total_millis())
    }
}

impl Add for LapTimeExt {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_millis(self.millis.saturating_add(rhs.millis))
    }
}

impl Sub for LapTimeExt {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_millis(self.millis.saturating_sub(rhs.millis))
    }
}

impl FromStr for LapTimeExt {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(caps) = EXTENDED_RE.captures(s) else {
            return Err(TimeError::Format {
                input: s.to_string(),
                expected: Variant::Extended,
            });
        };
        let hours = parse_field(&caps[1], s, Variant::Extended)?;
        let minutes = parse_field(&caps[2], s, Variant::Extended)?;
        let seconds = parse_field(&caps[3], s, Variant::Extended)?;
        let millis = parse_field(&caps[4], s, Variant::Extended)?;
        Ok(Self::from_millis(
            hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis,
        ))
    }
}

impl fmt::Display for LapTimeExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.millis / MS_PER_HOUR;
        let minutes = self.millis % MS_PER_HOUR / MS_PER_MINUTE;
        let seconds = self.millis % MS_PER_MINUTE / MS_PER_SECOND;
        let millis = self.millis % MS_PER_SECOND;
        write!(f, "{hours}:{minutes:02}:{seconds:02}.{millis:03}")
    }
}

impl Serialize for LapTimeExt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LapTimeExt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn parse_field(digits: &str, input: &str, expected: Variant) -> Result<u64, TimeError> {
    // Overflow on an absurd digit run is reported as a format problem.
    digits.parse().map_err(|_| TimeError::Format {
        input: input.to_string(),
        expected,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds_to_millis(seconds: f64) -> Result<u64, TimeError> {
    if seconds.is_nan() || seconds < 0.0 {
        return Err(TimeError::NegativeSeconds { value: seconds });
    }
    Ok((seconds * 1_000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(s: &str) -> LapTime {
        s.parse().expect("valid compact time")
    }

    fn ext(s: &str) -> LapTimeExt {
        s.parse().expect("valid extended time")
    }

    #[test]
    fn compact_format_round_trips() {
        for s in ["0:00.000", "1:06.243", "0:59.100", "12:03.007", "100:00.001"] {
            assert_eq!(lap(s).to_string(), s);
        }
    }

    #[test]
    fn extended_format_round_trips() {
        for s in ["0:00:00.000", "1:06:02.243", "12:59:59.999", "100:00:00.001"] {
            assert_eq!(ext(s).to_string(), s);
        }
    }

    #[test]
    fn compact_rejects_malformed_input() {
        for s in [
            "", "-", "1:06.24", "1:06.2430", "1:6.243", "106.243", "1:06:243", "a:06.243",
            "-1:06.243", "1:06,243", " 1:06.243",
        ] {
            assert!(matches!(
                s.parse::<LapTime>(),
                Err(TimeError::Format { .. })
            ));
        }
    }

    #[test]
    fn bare_parse_of_other_shape_is_a_format_error() {
        // The variant check lives at the operand boundary; a plain parse
        // reports any deviation from its own pattern uniformly.
        assert!(matches!(
            "1:02:03.000".parse::<LapTime>(),
            Err(TimeError::Format {
                expected: Variant::Compact,
                ..
            })
        ));
        assert!(matches!(
            "1:06.243".parse::<LapTimeExt>(),
            Err(TimeError::Format {
                expected: Variant::Extended,
                ..
            })
        ));
    }

    #[test]
    fn cross_variant_coercion_names_both_kinds() {
        let err = LapTime::coerce(TimeOperand::Raw("1:02:03.000")).unwrap_err();
        assert_eq!(
            err,
            TimeError::VariantMismatch {
                value: Variant::Compact,
                operand: Variant::Extended,
            }
        );

        let err = LapTimeExt::coerce(TimeOperand::Raw("1:06.243")).unwrap_err();
        assert_eq!(
            err,
            TimeError::VariantMismatch {
                value: Variant::Extended,
                operand: Variant::Compact,
            }
        );
    }

    #[test]
    fn oversized_seconds_field_normalizes() {
        // The pattern admits any two digits; the magnitude normalizes and
        // re-renders canonically.
        assert_eq!(lap("1:75.000").to_string(), "2:15.000");
    }

    #[test]
    fn equality_is_by_magnitude() {
        assert_eq!(lap("1:06.243"), LapTime::from_millis(66_243));
        assert_eq!(
            lap("1:06.243"),
            LapTime::from_seconds(66.243).expect("non-negative")
        );
    }

    #[test]
    fn ordering_is_transitive() {
        let a = lap("0:55.000");
        let b = lap("1:00.000");
        let c = lap("1:05.999");
        assert!(a < b && b < c);
        assert!(a < c);
    }

    #[test]
    fn addition_identity() {
        let a = lap("1:06.243");
        assert_eq!(a.plus("0:00.000").unwrap(), a);
        assert_eq!(a + LapTime::ZERO, a);
    }

    #[test]
    fn addition_carries_into_minutes() {
        assert_eq!((lap("0:59.900") + lap("0:00.200")).to_string(), "1:00.100");
    }

    #[test]
    fn subtraction_clamps_to_zero() {
        let small = lap("0:55.000");
        let big = lap("1:05.000");
        assert_eq!(small - big, LapTime::ZERO);
        assert_eq!(small.minus("1:05.000").unwrap(), LapTime::ZERO);
        assert_eq!(big - small, lap("0:10.000"));
    }

    #[test]
    fn raw_operand_of_wrong_variant_is_rejected() {
        let err = lap("1:06.243").plus("0:01:00.000").unwrap_err();
        assert!(matches!(err, TimeError::VariantMismatch { .. }));

        let err = ext("0:01:00.000").minus("1:06.243").unwrap_err();
        assert!(matches!(err, TimeError::VariantMismatch { .. }));
    }

    #[test]
    fn from_seconds_rejects_negative_and_nan() {
        assert!(matches!(
            LapTime::from_seconds(-0.001),
            Err(TimeError::NegativeSeconds { .. })
        ));
        assert!(matches!(
            LapTimeExt::from_seconds(f64::NAN),
            Err(TimeError::NegativeSeconds { .. })
        ));
        assert_eq!(LapTime::from_seconds(66.2434).unwrap(), lap("1:06.243"));
    }

    #[test]
    fn as_seconds_preserves_millisecond_resolution() {
        assert!((lap("1:06.243").as_seconds() - 66.243).abs() < 1e-9);
    }

    #[test]
    fn widening_is_lossless() {
        let total = LapTimeExt::from(lap("59:59.999")) + ext("0:00:00.001");
        assert_eq!(total.to_string(), "1:00:00.000");
    }

    #[test]
    fn serde_round_trips_as_canonical_string() {
        let time = lap("1:06.243");
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "\"1:06.243\"");
        let parsed: LapTime = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, time);

        let result: Result<LapTime, _> = serde_json::from_str("\"1:06.24\"");
        assert!(result.is_err());
    }
}
