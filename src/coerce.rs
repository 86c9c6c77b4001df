//! Scalar coercion between textual source values and typed leaves.
//!
//! Every leaf of a record bottoms out in a [`Scalar`]: a string, a bool, an
//! integer of a fixed width, or an `f64`. Sources that only carry text
//! (environment variables, command-line values) go through [`Scalar::parse_text`];
//! [`Scalar::format_text`] is the inverse.

use std::fmt;
use thiserror::Error;

/// Element kind of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Bool,
    /// Unsigned integer of the given bit width.
    Unsigned(u32),
    /// Signed integer of the given bit width.
    Signed(u32),
    Float,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::String => write!(f, "string"),
            ScalarKind::Bool => write!(f, "bool"),
            ScalarKind::Unsigned(bits) => write!(f, "u{}", bits),
            ScalarKind::Signed(bits) => write!(f, "i{}", bits),
            ScalarKind::Float => write!(f, "f64"),
        }
    }
}

/// A textual value that does not convert to its leaf kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {input:?} as {kind}: {reason}")]
pub struct CoercionError {
    pub kind: ScalarKind,
    pub input: String,
    pub reason: String,
}

impl CoercionError {
    pub fn new(kind: ScalarKind, input: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            kind,
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}

/// How integer text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Radix {
    /// Plain base 10.
    #[default]
    Decimal,
    /// Base 10, or base 16/8/2 when the digits start with `0x`/`0o`/`0b`.
    Prefixed,
}

/// Tokens accepted as `true`.
pub const TRUE_TOKENS: [&str; 6] = ["1", "t", "T", "TRUE", "true", "True"];
/// Tokens accepted as `false`.
pub const FALSE_TOKENS: [&str; 6] = ["0", "f", "F", "FALSE", "false", "False"];

/// A leaf element type with a textual form and a zero value.
///
/// The zero value is `Default::default()`; the merge engine treats it as
/// "not provided".
pub trait Scalar: Clone + Default + PartialEq + fmt::Debug + 'static {
    const KIND: ScalarKind;

    fn parse_text(text: &str, radix: Radix) -> Result<Self, CoercionError>;

    fn format_text(&self) -> String;

    fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn parse_text(text: &str, _radix: Radix) -> Result<Self, CoercionError> {
        Ok(text.to_string())
    }

    fn format_text(&self) -> String {
        self.clone()
    }
}

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn parse_text(text: &str, _radix: Radix) -> Result<Self, CoercionError> {
        parse_bool(text)
    }

    fn format_text(&self) -> String {
        self.to_string()
    }
}

impl Scalar for f64 {
    const KIND: ScalarKind = ScalarKind::Float;

    fn parse_text(text: &str, _radix: Radix) -> Result<Self, CoercionError> {
        text.parse::<f64>()
            .map_err(|err| CoercionError::new(Self::KIND, text, err))
    }

    fn format_text(&self) -> String {
        self.to_string()
    }
}

/// Parse a boolean token.
pub fn parse_bool(text: &str) -> Result<bool, CoercionError> {
    if TRUE_TOKENS.contains(&text) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&text) {
        Ok(false)
    } else {
        Err(CoercionError::new(
            ScalarKind::Bool,
            text,
            "expected one of 1, t, true, 0, f, false",
        ))
    }
}

/// Split an optional sign and radix prefix off integer text.
///
/// Returns `(negative, digits, radix)`.
fn split_integer(text: &str, radix: Radix) -> (bool, &str, u32) {
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    if radix == Radix::Decimal {
        return (negative, rest, 10);
    }

    let lower = rest.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (negative, &rest[2..], 16),
        Some("0o") => (negative, &rest[2..], 8),
        Some("0b") => (negative, &rest[2..], 2),
        _ => (negative, rest, 10),
    }
}

const INVALID_DIGIT: &str = "invalid digit found in string";

macro_rules! unsigned_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::Unsigned(<$ty>::BITS);

            fn parse_text(text: &str, radix: Radix) -> Result<Self, CoercionError> {
                let (negative, digits, base) = split_integer(text, radix);
                // from_str_radix would accept a second sign after the prefix
                if negative || digits.starts_with(['+', '-']) {
                    return Err(CoercionError::new(Self::KIND, text, INVALID_DIGIT));
                }
                <$ty>::from_str_radix(digits, base)
                    .map_err(|err| CoercionError::new(Self::KIND, text, err))
            }

            fn format_text(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

macro_rules! signed_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::Signed(<$ty>::BITS);

            fn parse_text(text: &str, radix: Radix) -> Result<Self, CoercionError> {
                let (negative, digits, base) = split_integer(text, radix);
                if digits.starts_with(['+', '-']) {
                    return Err(CoercionError::new(Self::KIND, text, INVALID_DIGIT));
                }
                // Re-attach the sign so the minimum value parses without overflow.
                let signed;
                let digits = if negative {
                    signed = format!("-{}", digits);
                    signed.as_str()
                } else {
                    digits
                };
                <$ty>::from_str_radix(digits, base)
                    .map_err(|err| CoercionError::new(Self::KIND, text, err))
            }

            fn format_text(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

unsigned_scalar!(u8, u16, u32, u64, usize);
signed_scalar!(i8, i16, i32, i64, isize);

/// Split a comma-separated list into its elements.
///
/// Elements are not trimmed; an empty input yields no elements.
pub fn split_list(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split(',').collect()
    }
}

/// Parse every element, committing nothing if any element fails.
pub fn parse_all<S: Scalar>(elements: &[&str], radix: Radix) -> Result<Vec<S>, CoercionError> {
    elements
        .iter()
        .map(|element| S::parse_text(element, radix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_tokens() {
        for token in TRUE_TOKENS {
            assert_eq!(bool::parse_text(token, Radix::Decimal), Ok(true));
        }
        for token in FALSE_TOKENS {
            assert_eq!(bool::parse_text(token, Radix::Decimal), Ok(false));
        }
        for token in ["yes", "no", "tRUE", "", " true"] {
            let err = bool::parse_text(token, Radix::Decimal).unwrap_err();
            assert_eq!(err.kind, ScalarKind::Bool);
            assert_eq!(err.input, token);
        }
    }

    #[test]
    fn test_unsigned_respects_bit_width() {
        assert_eq!(u8::parse_text("255", Radix::Decimal), Ok(255));
        assert!(u8::parse_text("256", Radix::Decimal).is_err());
        assert_eq!(u16::parse_text("8081", Radix::Decimal), Ok(8081));
        assert_eq!(u64::parse_text("18446744073709551615", Radix::Decimal), Ok(u64::MAX));
        assert!(u32::parse_text("-1", Radix::Decimal).is_err());
        assert!(u32::parse_text("+-1", Radix::Decimal).is_err());
        assert!(u32::parse_text("12a", Radix::Decimal).is_err());
        assert!(u32::parse_text("", Radix::Decimal).is_err());
    }

    #[test]
    fn test_signed_parses_negative_and_extremes() {
        assert_eq!(i32::parse_text("-10000", Radix::Decimal), Ok(-10000));
        assert_eq!(i8::parse_text("-128", Radix::Decimal), Ok(i8::MIN));
        assert!(i8::parse_text("128", Radix::Decimal).is_err());
        assert_eq!(i64::parse_text("+42", Radix::Decimal), Ok(42));
        assert!(i64::parse_text("--42", Radix::Decimal).is_err());
    }

    #[test]
    fn test_prefixed_radix() {
        assert_eq!(u16::parse_text("0x1F90", Radix::Prefixed), Ok(8080));
        assert_eq!(u16::parse_text("0o17", Radix::Prefixed), Ok(15));
        assert_eq!(u8::parse_text("0b101", Radix::Prefixed), Ok(5));
        assert_eq!(i16::parse_text("-0x10", Radix::Prefixed), Ok(-16));
        assert_eq!(i8::parse_text("-0x80", Radix::Prefixed), Ok(i8::MIN));
        assert_eq!(u32::parse_text("010", Radix::Prefixed), Ok(10));
        // Decimal mode does not interpret prefixes.
        assert!(u16::parse_text("0x1F90", Radix::Decimal).is_err());
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(f64::parse_text("12.5", Radix::Decimal), Ok(12.5));
        assert_eq!(f64::parse_text("-1e3", Radix::Decimal), Ok(-1000.0));
        assert!(f64::parse_text("inf", Radix::Decimal).unwrap().is_infinite());
        assert!(f64::parse_text("NaN", Radix::Decimal).unwrap().is_nan());
        assert!(f64::parse_text("1.2.3", Radix::Decimal).is_err());
    }

    #[test]
    fn test_zero_values() {
        assert!(String::new().is_zero());
        assert!(false.is_zero());
        assert!(!true.is_zero());
        assert!(0u64.is_zero());
        assert!(0.0f64.is_zero());
        assert!(!f64::NAN.is_zero());
        assert!(!"x".to_string().is_zero());
        assert!(!(-1i32).is_zero());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_list("a,,b"), vec!["a", "", "b"]);
        assert_eq!(split_list("single"), vec!["single"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_parse_all_is_all_or_nothing() {
        let parsed: Vec<u32> = parse_all(&["3", "2", "1"], Radix::Decimal).unwrap();
        assert_eq!(parsed, vec![3, 2, 1]);

        let err = parse_all::<u32>(&["3", "x", "1"], Radix::Decimal).unwrap_err();
        assert_eq!(err.input, "x");
    }

    #[test]
    fn test_format_text() {
        assert_eq!(true.format_text(), "true");
        assert_eq!((-5i16).format_text(), "-5");
        assert_eq!(2.5f64.format_text(), "2.5");
        assert_eq!("host".to_string().format_text(), "host");
    }
}
