//! Type-directed conversion of single strings into values
//!
//! [`DefaultParser`] works on a [`Kind`], a runtime description of the target
//! type, and produces a dynamically typed [`Value`]. The [`FromEnvStr`] trait
//! ties concrete Rust types to their kind and converts the value back, so most
//! callers only need [`parse`].

use crate::duration::Duration;
use crate::error::ParseError;
use std::fmt;
use std::num::IntErrorKind;

/// Runtime description of a parse target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Bool,
    String,
    /// Signed nanosecond duration written as a literal such as `1h30m`
    Duration,
    U8,
    U16,
    U32,
    U64,
    Usize,
    I8,
    I16,
    I32,
    I64,
    Isize,
    F32,
    F64,
    /// Owned pointer to a value of the inner kind
    Pointer(Box<Kind>),
    /// Comma-separated list of the inner kind
    Sequence(Box<Kind>),
    /// Anything the parser has no rule for
    Other(&'static str),
}

impl Kind {
    fn unsigned_max(&self) -> Option<u64> {
        match self {
            Kind::U8 => Some(u8::MAX.into()),
            Kind::U16 => Some(u16::MAX.into()),
            Kind::U32 => Some(u32::MAX.into()),
            Kind::U64 => Some(u64::MAX),
            Kind::Usize => Some(usize::MAX as u64),
            _ => None,
        }
    }

    fn signed_range(&self) -> Option<(i64, i64)> {
        match self {
            Kind::I8 => Some((i8::MIN.into(), i8::MAX.into())),
            Kind::I16 => Some((i16::MIN.into(), i16::MAX.into())),
            Kind::I32 => Some((i32::MIN.into(), i32::MAX.into())),
            Kind::I64 => Some((i64::MIN, i64::MAX)),
            Kind::Isize => Some((isize::MIN as i64, isize::MAX as i64)),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bool => "bool",
            Kind::String => "String",
            Kind::Duration => "Duration",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::Usize => "usize",
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::Isize => "isize",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Pointer(inner) => return write!(f, "Box<{inner}>"),
            Kind::Sequence(inner) => return write!(f, "Vec<{inner}>"),
            Kind::Other(name) => *name,
        };
        f.write_str(name)
    }
}

/// Output of [`DefaultParser::parse`].
///
/// Integers are widened to 64 bits; the parser has already checked that they
/// fit the width of the requested kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    String(String),
    Duration(Duration),
    Uint(u64),
    Int(i64),
    Float(f64),
    Pointer(Box<Value>),
    Sequence(Vec<Value>),
}

/// Stateless parser for the kinds listed on [`Kind`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl DefaultParser {
    /// Parse `input` according to `kind`.
    ///
    /// Strings are trimmed; numbers, booleans and durations are taken as-is.
    /// Sequences split on `,` (the empty string is the empty sequence) and
    /// trim every element before parsing it.
    pub fn parse(&self, input: &str, kind: &Kind) -> Result<Value, ParseError> {
        match kind {
            Kind::Duration => input.parse().map(Value::Duration),
            Kind::Pointer(inner) => self
                .parse(input, inner)
                .map(|value| Value::Pointer(Box::new(value))),
            Kind::String => Ok(Value::String(input.trim().to_string())),
            Kind::Bool => parse_bool(input).map(Value::Bool),
            Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 | Kind::Usize => {
                parse_unsigned(input, kind).map(Value::Uint)
            }
            Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 | Kind::Isize => {
                parse_signed(input, kind).map(Value::Int)
            }
            Kind::F32 | Kind::F64 => parse_float(input, kind).map(Value::Float),
            Kind::Sequence(element) => self.parse_sequence(input, element),
            Kind::Other(_) => Err(ParseError::unsupported(kind)),
        }
    }

    /// Parse `input` straight into `T`.
    pub fn parse_as<T: FromEnvStr>(&self, input: &str) -> Result<T, ParseError> {
        T::from_value(self.parse(input, &T::kind())?)
    }

    /// Parse `input` into an existing location.
    ///
    /// `target` is only written when parsing succeeds.
    pub fn unmarshal<T: FromEnvStr>(&self, input: &str, target: &mut T) -> Result<(), ParseError> {
        *target = self.parse_as(input)?;
        Ok(())
    }

    fn parse_sequence(&self, input: &str, element: &Kind) -> Result<Value, ParseError> {
        if input.is_empty() {
            return Ok(Value::Sequence(Vec::new()));
        }

        input
            .split(',')
            .enumerate()
            .map(|(index, part)| {
                self.parse(part.trim(), element)
                    .map_err(|source| ParseError::Element {
                        index,
                        source: Box::new(source),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence)
    }
}

/// Parse `input` into `T` with the [`DefaultParser`].
///
/// ```rust
/// assert_eq!(envtag::parse::<u8>("255").unwrap(), 255);
/// assert_eq!(envtag::parse::<Vec<i32>>("1, -2, 100, 3").unwrap(), vec![1, -2, 100, 3]);
/// assert!(envtag::parse::<u8>("256").is_err());
/// ```
pub fn parse<T: FromEnvStr>(input: &str) -> Result<T, ParseError> {
    DefaultParser.parse_as(input)
}

fn parse_bool(input: &str) -> Result<bool, ParseError> {
    match input.to_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        _ => Err(ParseError::invalid(input, Kind::Bool, "expected true or false")),
    }
}

fn parse_unsigned(input: &str, kind: &Kind) -> Result<u64, ParseError> {
    if input.starts_with('+') {
        return Err(ParseError::invalid(input, kind, "unexpected sign"));
    }
    let value = input.parse::<u64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ParseError::overflow(input, kind),
        _ => ParseError::invalid(input, kind, e),
    })?;

    match kind.unsigned_max() {
        Some(max) if value <= max => Ok(value),
        _ => Err(ParseError::overflow(input, kind)),
    }
}

fn parse_signed(input: &str, kind: &Kind) -> Result<i64, ParseError> {
    let value = input.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ParseError::overflow(input, kind),
        _ => ParseError::invalid(input, kind, e),
    })?;

    match kind.signed_range() {
        Some((min, max)) if (min..=max).contains(&value) => Ok(value),
        _ => Err(ParseError::overflow(input, kind)),
    }
}

fn parse_float(input: &str, kind: &Kind) -> Result<f64, ParseError> {
    // f32 is parsed at its own width so rounding happens once
    let value = match kind {
        Kind::F32 => input.parse::<f32>().map(f64::from),
        _ => input.parse::<f64>(),
    }
    .map_err(|e| ParseError::invalid(input, kind, e))?;

    // `1e400` parses to infinity instead of failing
    if value.is_infinite() && !is_infinity_literal(input) {
        return Err(ParseError::overflow(input, kind));
    }
    Ok(value)
}

fn is_infinity_literal(input: &str) -> bool {
    let unsigned = input.trim_start_matches(|c| c == '+' || c == '-');
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

/// Types the [`DefaultParser`] can produce from a single string.
///
/// Implemented for the primitive numbers, `bool`, `String`, [`Duration`],
/// [`std::time::Duration`], `Box<T>` and `Vec<T>`. Newtypes can reuse an
/// existing kind:
///
/// ```rust
/// use envtag::{FromEnvStr, Kind, ParseError, Value};
///
/// struct Port(u16);
///
/// impl FromEnvStr for Port {
///     fn kind() -> Kind {
///         Kind::U16
///     }
///
///     fn from_value(value: Value) -> Result<Self, ParseError> {
///         u16::from_value(value).map(Port)
///     }
/// }
///
/// assert_eq!(envtag::parse::<Port>("8080").unwrap().0, 8080);
/// ```
pub trait FromEnvStr: Sized {
    /// Kind the parser should target for this type.
    fn kind() -> Kind;

    /// Convert the parser output back into `Self`.
    fn from_value(value: Value) -> Result<Self, ParseError>;
}

fn mismatch(value: &Value, kind: Kind) -> ParseError {
    ParseError::invalid(
        format!("{value:?}"),
        kind,
        "parsed value does not match the target kind",
    )
}

macro_rules! impl_unsigned {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl FromEnvStr for $ty {
            fn kind() -> Kind {
                Kind::$kind
            }

            fn from_value(value: Value) -> Result<Self, ParseError> {
                match value {
                    Value::Uint(v) => {
                        <$ty>::try_from(v).map_err(|_| ParseError::overflow(v.to_string(), Kind::$kind))
                    }
                    other => Err(mismatch(&other, Kind::$kind)),
                }
            }
        }
    )*};
}

macro_rules! impl_signed {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl FromEnvStr for $ty {
            fn kind() -> Kind {
                Kind::$kind
            }

            fn from_value(value: Value) -> Result<Self, ParseError> {
                match value {
                    Value::Int(v) => {
                        <$ty>::try_from(v).map_err(|_| ParseError::overflow(v.to_string(), Kind::$kind))
                    }
                    other => Err(mismatch(&other, Kind::$kind)),
                }
            }
        }
    )*};
}

impl_unsigned!(u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize);
impl_signed!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize);

impl FromEnvStr for f32 {
    fn kind() -> Kind {
        Kind::F32
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            // exact: the parser produced this from an f32
            Value::Float(v) => Ok(v as f32),
            other => Err(mismatch(&other, Kind::F32)),
        }
    }
}

impl FromEnvStr for f64 {
    fn kind() -> Kind {
        Kind::F64
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(mismatch(&other, Kind::F64)),
        }
    }
}

impl FromEnvStr for bool {
    fn kind() -> Kind {
        Kind::Bool
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch(&other, Kind::Bool)),
        }
    }
}

impl FromEnvStr for String {
    fn kind() -> Kind {
        Kind::String
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(mismatch(&other, Kind::String)),
        }
    }
}

impl FromEnvStr for Duration {
    fn kind() -> Kind {
        Kind::Duration
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Duration(v) => Ok(v),
            other => Err(mismatch(&other, Kind::Duration)),
        }
    }
}

impl FromEnvStr for std::time::Duration {
    fn kind() -> Kind {
        Kind::Duration
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Duration(v) => std::time::Duration::try_from(v).map_err(|_| {
                ParseError::invalid(v.to_string(), "std::time::Duration", "duration must not be negative")
            }),
            other => Err(mismatch(&other, Kind::Duration)),
        }
    }
}

impl<T: FromEnvStr> FromEnvStr for Box<T> {
    fn kind() -> Kind {
        Kind::Pointer(Box::new(T::kind()))
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Pointer(inner) => T::from_value(*inner).map(Box::new),
            other => Err(mismatch(&other, Self::kind())),
        }
    }
}

impl<T: FromEnvStr> FromEnvStr for Vec<T> {
    fn kind() -> Kind {
        Kind::Sequence(Box::new(T::kind()))
    }

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    T::from_value(item).map_err(|source| ParseError::Element {
                        index,
                        source: Box::new(source),
                    })
                })
                .collect(),
            other => Err(mismatch(&other, Self::kind())),
        }
    }
}
