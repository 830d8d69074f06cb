//! Small lenient text helpers shared by the config and log parsers.
//!
//! Both input formats are produced by tools that pad numbers and coordinates
//! inconsistently, so numeric fields are read from their leading numeric
//! prefix: `" 12.5hp"` reads as `12.5`, and a field with no number at all
//! reads as nothing.

use crate::geometry::Point;

const COORD_START: char = '(';
const COORD_FINISH: char = ')';
const COORD_DELIMITER: char = ',';

/// Reads the leading decimal number of `raw`, skipping leading whitespace.
pub(crate) fn leading_f32(raw: &str) -> Option<f32> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0usize;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    trimmed[..end].parse::<f32>().ok()
}

/// Reads the leading integer of `raw`, skipping leading whitespace.
pub(crate) fn leading_i64(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0usize;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    trimmed[..end].parse::<i64>().ok()
}

/// Parses an `x,y` pair, optionally quoted and/or wrapped in parentheses.
pub(crate) fn parse_coordinates(raw: &str) -> Option<Point> {
    let unquoted = raw.trim().trim_matches('"').trim();
    let inner = unquoted
        .trim_start_matches(|c: char| c == COORD_START || c.is_whitespace())
        .trim_end_matches(|c: char| c == COORD_FINISH || c.is_whitespace());
    let (x, y) = inner.split_once(COORD_DELIMITER)?;
    Some(Point::new(leading_f32(x)?, leading_f32(y)?))
}

/// Parses the last parenthesized pair found in `raw`, or the whole text when
/// it carries no parenthesis.
pub(crate) fn parse_trailing_coordinates(raw: &str) -> Option<Point> {
    match raw.rfind(COORD_START) {
        Some(start) => parse_coordinates(&raw[start..]),
        None => parse_coordinates(raw),
    }
}
