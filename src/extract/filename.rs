//! Numbers embedded in illustration file names.
//!
//! File names follow conventions such as
//! `4岁人士存20000美金存5年_19到85岁提取12000.pdf`, where the digit runs
//! are, in order, the values a product template expects.

use crate::template::NOT_AVAILABLE;
use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

fn digit_runs() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"[0-9]+").unwrap())
}

/// Every run of decimal digits in `name`, in order.
///
/// The name is NFKC-normalized first, so full-width digits (`２０`) count.
pub fn numbers_in(name: &str) -> Vec<String> {
    let normalized: String = name.nfkc().collect();
    digit_runs()
        .find_iter(&normalized)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The first `count` numbers, or `None` if the name has fewer.
pub fn leading_numbers(name: &str, count: usize) -> Option<Vec<String>> {
    let mut numbers = numbers_in(name);
    if numbers.len() < count {
        return None;
    }
    numbers.truncate(count);
    Some(numbers)
}

/// The numbers at the given 0-based positions, or `None` if any is absent.
pub fn numbers_at(name: &str, positions: &[usize]) -> Option<Vec<String>> {
    let numbers = numbers_in(name);
    positions.iter().map(|&i| numbers.get(i).cloned()).collect()
}

/// All digits in `text` joined together, or "N/A" when there are none.
///
/// Used for cells such as `第 20 年` where only the number matters.
pub fn digits_only(text: &str) -> String {
    let digits: String = numbers_in(text).concat();
    if digits.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        digits
    }
}
