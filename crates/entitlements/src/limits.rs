//! Bounds and parsing for numeric entitlement fields
//!
//! `priority` and `rate_limit_per_minute` are clamped whenever they are edited,
//! so a buffer can never hold an out-of-range value even before it is saved.

use plandesk_shared::types::{
    DEFAULT_PRIORITY, DEFAULT_RATE_LIMIT_PER_MINUTE, LIMIT_UNLIMITED, MAX_PRIORITY,
    MAX_RATE_LIMIT_PER_MINUTE, MIN_PRIORITY, MIN_RATE_LIMIT_PER_MINUTE,
};

use crate::error::{EditError, EditResult};

fn clamp_to(value: i64, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(i64::from(min), i64::from(max));
    u32::try_from(clamped).unwrap_or(min)
}

pub fn clamp_priority(value: i64) -> u32 {
    clamp_to(value, MIN_PRIORITY, MAX_PRIORITY)
}

pub fn clamp_rate_limit(value: i64) -> u32 {
    clamp_to(value, MIN_RATE_LIMIT_PER_MINUTE, MAX_RATE_LIMIT_PER_MINUTE)
}

/// Lenient integer parse for form input: leading digits win ("15/min" is 15),
/// fractional input is truncated, anything else is `None`.
fn parse_leading_int(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let prefix: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
    if prefix.is_empty() {
        return None;
    }
    // Saturate very long digit strings instead of failing
    let magnitude = prefix.parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * magnitude)
}

/// Parse a priority from text, falling back to the default on garbage
pub fn parse_priority(input: &str) -> u32 {
    parse_leading_int(input)
        .map(clamp_priority)
        .unwrap_or(DEFAULT_PRIORITY)
}

/// Parse a per-minute rate limit from text, falling back to the default on garbage
pub fn parse_rate_limit(input: &str) -> u32 {
    parse_leading_int(input)
        .map(clamp_rate_limit)
        .unwrap_or(DEFAULT_RATE_LIMIT_PER_MINUTE)
}

/// LIMIT-type features accept `-1` (unlimited), `0` (disabled) or a positive cap
pub fn validate_limit_value(value: i64) -> EditResult<i64> {
    if value < LIMIT_UNLIMITED {
        return Err(EditError::InvalidValue(format!(
            "limit must be {} (unlimited) or greater, got {}",
            LIMIT_UNLIMITED, value
        )));
    }
    Ok(value)
}
