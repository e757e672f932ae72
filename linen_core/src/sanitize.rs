//! # Input Sanitizers
//!
//! Four total functions that project an arbitrary input value onto a
//! well-formed number. They never fail and never return NaN or infinity.
//!
//! | Sanitizer              | Output      | Range        | Non-finite input |
//! |------------------------|-------------|--------------|------------------|
//! | [`to_non_negative_int`]| `u64`       | `[0, ∞)`     | `0`              |
//! | [`to_unit_price`]      | `f64`       | `[0, ∞)`     | `0`              |
//! | [`to_par_level`]       | `f64`       | `[0.5, 10]`  | `1`              |
//! | [`to_margin`]          | `f64`       | `[0, 200]`   | `0`              |
//!
//! A PAR level falls back to the neutral multiplier `1`, not `0`: a zero
//! multiplier would silently zero every requirement.
//!
//! ## Coercion
//!
//! Every sanitizer first coerces its input through [`ToNumber`]. Numbers are
//! taken as-is, strings are trimmed and parsed as decimals (blank or
//! unparseable strings are NaN), JSON `null` is `0`, booleans are `1`/`0`,
//! arrays and objects are NaN.
//!
//! ## Example
//!
//! ```rust
//! use linen_core::sanitize::{to_margin, to_non_negative_int, to_par_level, to_unit_price};
//!
//! assert_eq!(to_non_negative_int(3.9), 3);
//! assert_eq!(to_non_negative_int("bad"), 0);
//! assert_eq!(to_unit_price(1.25), 1.25);
//! assert_eq!(to_par_level("bad"), 1.0);
//! assert_eq!(to_margin(250), 200.0);
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lowest accepted PAR level
pub const MIN_PAR_LEVEL: f64 = 0.5;
/// Highest accepted PAR level
pub const MAX_PAR_LEVEL: f64 = 10.0;
/// PAR level used when the input is not a usable number
pub const DEFAULT_PAR_LEVEL: f64 = 1.0;
/// Highest accepted owner margin, in percent
pub const MAX_MARGIN: f64 = 200.0;
/// Margin applied when a snapshot carries none
pub const DEFAULT_MARGIN: f64 = 40.0;

// ============================================================================
// Coercion
// ============================================================================

/// Explicit, total conversion of a value to `f64`.
///
/// Failure is expressed as NaN, which every sanitizer maps to its
/// documented fallback.
///
/// Empty and whitespace-only strings are failures too, not zero: a blank
/// PAR field gives `to_par_level("") == 1.0` rather than the 0.5 floor, and
/// a blank margin gives 0 through the non-finite path.
pub trait ToNumber {
    fn to_number(&self) -> f64;
}

impl<T: ToNumber + ?Sized> ToNumber for &T {
    fn to_number(&self) -> f64 {
        (**self).to_number()
    }
}

macro_rules! impl_to_number_lossless {
    ($($t:ty),*) => {
        $(impl ToNumber for $t {
            fn to_number(&self) -> f64 {
                *self as f64
            }
        })*
    };
}

impl_to_number_lossless!(f64, f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToNumber for bool {
    fn to_number(&self) -> f64 {
        if *self {
            1.0
        } else {
            0.0
        }
    }
}

impl ToNumber for str {
    fn to_number(&self) -> f64 {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return f64::NAN;
        }
        trimmed.parse().unwrap_or(f64::NAN)
    }
}

impl ToNumber for String {
    fn to_number(&self) -> f64 {
        self.as_str().to_number()
    }
}

impl ToNumber for serde_json::Value {
    fn to_number(&self) -> f64 {
        use serde_json::Value;
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => b.to_number(),
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => s.to_number(),
            Value::Array(_) | Value::Object(_) => f64::NAN,
        }
    }
}

impl<T: ToNumber> ToNumber for Option<T> {
    fn to_number(&self) -> f64 {
        self.as_ref().map_or(f64::NAN, ToNumber::to_number)
    }
}

/// A number as supplied by a caller, before sanitization.
///
/// Deserializes from ANY JSON value using the [`ToNumber`] rules, so a
/// snapshot with `"stays": "abc"` or `"margin": [1]` still parses; the
/// malformed value simply becomes NaN and is absorbed downstream.
///
/// Non-finite values serialize as strings (`"NaN"`, `"inf"`) so they
/// survive a round trip with the same meaning.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct NumericInput(pub f64);

impl NumericInput {
    /// The raw coerced value (may be NaN or infinite)
    pub fn value(self) -> f64 {
        self.0
    }
}

impl ToNumber for NumericInput {
    fn to_number(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! impl_numeric_input_from {
    ($($t:ty),*) => {
        $(impl From<$t> for NumericInput {
            fn from(value: $t) -> Self {
                NumericInput(value.to_number())
            }
        })*
    };
}

impl_numeric_input_from!(f64, f32, i32, i64, u32, u64, usize, bool, &str, String, serde_json::Value);

impl Serialize for NumericInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if !v.is_finite() {
            serializer.serialize_str(&v.to_string())
        } else if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
            serializer.serialize_i64(v as i64)
        } else {
            serializer.serialize_f64(v)
        }
    }
}

impl<'de> Deserialize<'de> for NumericInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(NumericInput(raw.to_number()))
    }
}

// ============================================================================
// Sanitizers
// ============================================================================

/// Coerce to a count: `max(0, floor(x))`, or `0` when not finite.
///
/// Flooring happens before clamping, so `3.9 → 3` and `-0.5 → 0`.
/// Values beyond `u64::MAX` saturate.
pub fn to_non_negative_int(value: impl ToNumber) -> u64 {
    let num = value.to_number();
    if !num.is_finite() {
        return 0;
    }
    num.floor().max(0.0) as u64
}

/// Coerce to a unit price: `max(0, x)`, or `0` when not finite.
///
/// No upper bound; fractional currency amounts are preserved.
pub fn to_unit_price(value: impl ToNumber) -> f64 {
    let num = value.to_number();
    if !num.is_finite() {
        return 0.0;
    }
    num.max(0.0)
}

/// Coerce to a PAR level in `[0.5, 10]`, or `1` when not finite.
pub fn to_par_level(value: impl ToNumber) -> f64 {
    let num = value.to_number();
    if !num.is_finite() {
        return DEFAULT_PAR_LEVEL;
    }
    num.clamp(MIN_PAR_LEVEL, MAX_PAR_LEVEL)
}

/// Coerce to an owner margin percentage in `[0, 200]`, or `0` when not finite.
pub fn to_margin(value: impl ToNumber) -> f64 {
    let num = value.to_number();
    if !num.is_finite() {
        return 0.0;
    }
    num.clamp(0.0, MAX_MARGIN)
}

/// Keep a money figure finite: overflow saturates at `f64::MAX`.
pub(crate) fn finite_money(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.min(f64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_non_negative_int_examples() {
        assert_eq!(to_non_negative_int(3.9), 3);
        assert_eq!(to_non_negative_int(-1), 0);
        assert_eq!(to_non_negative_int("bad"), 0);
        assert_eq!(to_non_negative_int(-0.5), 0);
        assert_eq!(to_non_negative_int(f64::NAN), 0);
        assert_eq!(to_non_negative_int(f64::INFINITY), 0);
        assert_eq!(to_non_negative_int(" 12 "), 12);
        assert_eq!(to_non_negative_int(1e30), u64::MAX);
    }

    #[test]
    fn test_unit_price_examples() {
        assert_eq!(to_unit_price(1.25), 1.25);
        assert_eq!(to_unit_price(-10), 0.0);
        assert_eq!(to_unit_price("4.50"), 4.5);
        assert_eq!(to_unit_price(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_par_level_examples() {
        assert_eq!(to_par_level(0), 0.5);
        assert_eq!(to_par_level(12), 10.0);
        assert_eq!(to_par_level("bad"), 1.0);
        assert_eq!(to_par_level(2.5), 2.5);
        assert_eq!(to_par_level(f64::NAN), 1.0);
    }

    #[test]
    fn test_margin_examples() {
        assert_eq!(to_margin(-5), 0.0);
        assert_eq!(to_margin(250), 200.0);
        assert_eq!(to_margin(40), 40.0);
        assert_eq!(to_margin("bad"), 0.0);
    }

    #[test]
    fn test_fallbacks_differ_for_par_level() {
        // Non-finite PAR level is neutral (1); everything else falls to 0.
        assert_eq!(to_par_level(f64::NAN), DEFAULT_PAR_LEVEL);
        assert_eq!(to_margin(f64::NAN), 0.0);
        assert_eq!(to_unit_price(f64::NAN), 0.0);
        assert_eq!(to_non_negative_int(f64::NAN), 0);
    }

    #[test]
    fn test_blank_string_is_not_zero() {
        assert!("   ".to_number().is_nan());
        assert_eq!(to_par_level(""), DEFAULT_PAR_LEVEL);
        assert_eq!(to_par_level("  \t"), DEFAULT_PAR_LEVEL);
        assert_eq!(to_par_level("0"), MIN_PAR_LEVEL);
        assert_eq!(to_non_negative_int(""), 0);
        assert_eq!(to_margin(" "), 0.0);
    }

    #[test]
    fn test_json_coercion() {
        assert_eq!(json!(null).to_number(), 0.0);
        assert_eq!(json!(true).to_number(), 1.0);
        assert_eq!(json!("7").to_number(), 7.0);
        assert!(json!([1, 2]).to_number().is_nan());
        assert!(json!({"a": 1}).to_number().is_nan());
        assert!("".to_number().is_nan());
        assert!(None::<f64>.to_number().is_nan());
    }

    #[test]
    fn test_numeric_input_accepts_any_json() {
        let parsed: Vec<NumericInput> =
            serde_json::from_str(r#"[3, "4.5", "oops", null, false, {}]"#).unwrap();
        assert_eq!(parsed[0].value(), 3.0);
        assert_eq!(parsed[1].value(), 4.5);
        assert!(parsed[2].value().is_nan());
        assert_eq!(parsed[3].value(), 0.0);
        assert_eq!(parsed[4].value(), 0.0);
        assert!(parsed[5].value().is_nan());
    }

    #[test]
    fn test_numeric_input_serialization() {
        assert_eq!(serde_json::to_string(&NumericInput(3.0)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&NumericInput(1.5)).unwrap(), "1.5");

        let json = serde_json::to_string(&NumericInput(f64::NAN)).unwrap();
        assert_eq!(json, "\"NaN\"");
        let back: NumericInput = serde_json::from_str(&json).unwrap();
        assert_eq!(to_par_level(back), DEFAULT_PAR_LEVEL);
    }

    #[test]
    fn test_finite_money() {
        assert_eq!(finite_money(12.5), 12.5);
        assert_eq!(finite_money(f64::INFINITY), f64::MAX);
        assert_eq!(finite_money(f64::NAN), 0.0);
    }

    proptest! {
        #[test]
        fn prop_non_negative_int_matches_floor(x in -1e12f64..1e12f64) {
            prop_assert_eq!(to_non_negative_int(x), x.floor().max(0.0) as u64);
        }

        #[test]
        fn prop_sanitizers_are_idempotent(x in proptest::num::f64::ANY) {
            let n = to_non_negative_int(x);
            prop_assert_eq!(to_non_negative_int(n), n);

            let p = to_unit_price(x);
            prop_assert_eq!(to_unit_price(p), p);

            let par = to_par_level(x);
            prop_assert_eq!(to_par_level(par), par);

            let m = to_margin(x);
            prop_assert_eq!(to_margin(m), m);
        }

        #[test]
        fn prop_sanitized_values_stay_in_range(x in proptest::num::f64::ANY) {
            let p = to_unit_price(x);
            prop_assert!(p.is_finite() && p >= 0.0);

            let par = to_par_level(x);
            prop_assert!((MIN_PAR_LEVEL..=MAX_PAR_LEVEL).contains(&par));

            let m = to_margin(x);
            prop_assert!((0.0..=MAX_MARGIN).contains(&m));
        }
    }
}
