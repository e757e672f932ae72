//! # Exports
//!
//! Renderers that turn a [`CalculationResult`](crate::calculations::CalculationResult)
//! into something a person can send or print. They only read the result;
//! nothing flows back into the engine.
//!
//! - [`csv`] - results table and order sheet
//! - [`email`] - plain-text report body and `mailto:` link
//! - [`pdf`] - landscape A4 report via Typst

pub mod csv;
pub mod email;
pub mod pdf;

/// 2^52: the smallest magnitude at which every `f64` is a whole number.
const WHOLE_ONLY_THRESHOLD: f64 = 4_503_599_627_370_496.0;

/// Format a money amount as pounds sterling: `1234.5 → "£1,234.50"`.
///
/// From 2^52 upwards an `f64` carries no fraction, so the pence are always
/// zero and the amount is formatted from its integer part alone.
pub fn format_gbp(value: f64) -> String {
    let abs = value.abs();
    let (pounds, rem) = if abs < WHOLE_ONLY_THRESHOLD {
        let pence = (abs * 100.0).round();
        let pounds = (pence / 100.0).trunc();
        (pounds, pence - pounds * 100.0)
    } else {
        (abs, 0.0)
    };

    let digits = format!("{:.0}", pounds);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}£{}.{:02.0}", sign, grouped, rem)
}

/// Format a PAR level the way it is shown to users: `2 → "2x"`, `1.5 → "1.5x"`.
pub fn format_par_level(par_level: f64) -> String {
    if par_level.fract() == 0.0 {
        format!("{:.0}x", par_level)
    } else {
        format!("{}x", par_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_gbp() {
        assert_eq!(format_gbp(0.0), "£0.00");
        assert_eq!(format_gbp(72.8), "£72.80");
        assert_eq!(format_gbp(1234.5), "£1,234.50");
        assert_eq!(format_gbp(1_000_000.0), "£1,000,000.00");
        assert_eq!(format_gbp(0.125), "£0.13");
        assert_eq!(format_gbp(-5.0), "-£5.00");
    }

    #[test]
    fn test_format_gbp_saturated_amounts() {
        assert_eq!(format_gbp(1e16), "£10,000,000,000,000,000.00");

        let max = format_gbp(f64::MAX);
        assert!(max.starts_with("£179,769,313,"));
        assert!(max.ends_with(".00"));
        assert!(!max.contains("inf"));
        assert!(!max.contains("NaN"));
        assert!(format_gbp(-f64::MAX).starts_with("-£179,769,313,"));
    }

    #[test]
    fn test_format_par_level() {
        assert_eq!(format_par_level(1.0), "1x");
        assert_eq!(format_par_level(1.5), "1.5x");
        assert_eq!(format_par_level(10.0), "10x");
    }
}
