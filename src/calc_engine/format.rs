/// 2^63, the first integer an `i64` cannot hold. Exact as an `f64`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Integer-valued results print without a decimal point, everything else
/// uses the default `f64` rendering, as do integers outside the `i64` range.
pub fn format_result(value: f64) -> String {
    if value.fract() == 0.0 && (-I64_LIMIT..I64_LIMIT).contains(&value) {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_have_no_fraction() {
        assert_eq!(format_result(2.0), "2");
        assert_eq!(format_result(-4.0), "-4");
        assert_eq!(format_result(-0.0), "0");
        assert_eq!(format_result(1e15), "1000000000000000");
    }

    #[test]
    fn test_integers_beyond_i64_are_exact() {
        assert_eq!(format_result(2f64.powi(63)), "9223372036854775808");
        assert_eq!(format_result(-(2f64.powi(63))), "-9223372036854775808");
        assert_eq!(format_result(2f64.powi(62)), "4611686018427387904");
        assert_eq!(format_result(1e20), "100000000000000000000");
    }

    #[test]
    fn test_fractions_keep_decimals() {
        assert_eq!(format_result(2.5), "2.5");
        assert_eq!(format_result(-0.125), "-0.125");
        assert_eq!(format_result(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_non_finite_values() {
        assert_eq!(format_result(f64::NAN), "NaN");
        assert_eq!(format_result(f64::INFINITY), "inf");
        assert_eq!(format_result(f64::NEG_INFINITY), "-inf");
    }
}
