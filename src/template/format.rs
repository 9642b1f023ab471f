//! Number formatting for evaluated expressions.

/// Format a number with comma thousands separators.
///
/// Whole numbers render without decimals; anything else renders with
/// exactly one decimal digit.
///
/// ```
/// use docfill::template::format_number;
///
/// assert_eq!(format_number(3008582.0), "3,008,582");
/// assert_eq!(format_number(1234.5), "1,234.5");
/// assert_eq!(format_number(0.0), "0");
/// ```
pub fn format_number(value: f64) -> String {
    // -0.0 would otherwise render as "-0"
    let value = if value == 0.0 { 0.0 } else { value };

    let plain = if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    };
    group_thousands(&plain)
}

fn group_thousands(plain: &str) -> String {
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (integer, fraction) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(plain.len() + integer.len() / 3);
    grouped.push_str(sign);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push_str(fraction);
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_numbers() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(-1500.0), "-1,500");
    }

    #[test]
    fn test_fractional_numbers() {
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.76), "0.8");
        assert_eq!(format_number(-1234567.5), "-1,234,567.5");
    }

    #[test]
    fn test_rounding_to_whole_keeps_decimal() {
        // not an integer, so one decimal digit even when it rounds to .0
        assert_eq!(format_number(2.96), "3.0");
        assert_eq!(format_number(999.99), "1,000.0");
    }
}
