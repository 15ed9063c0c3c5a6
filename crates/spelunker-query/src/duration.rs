//! ISO 8601 durations naming the window of recently modified records.
//!
//! Accepts `PnW` and `PnYnMnDTnHnMnS` with any component omitted. Calendar
//! units are approximated: a year is 365 days, a month 30 days.

use crate::error::{Result, SpelunkerError};
use std::time::Duration;

/// Window used when a request does not name one
pub const DEFAULT_RECENT: &str = "P30D";

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

pub fn parse_duration(value: &str) -> Result<Duration> {
    let invalid = || SpelunkerError::invalid_input(format!("Invalid duration '{}'", value));

    let body = value.trim().strip_prefix('P').ok_or_else(invalid)?;

    if body.is_empty() {
        return Err(invalid());
    }

    let (date, time) = match body.split_once('T') {
        Some((_, "")) => return Err(invalid()),
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let mut seconds: u64 = 0;

    let mut add = |amount: u64, unit: u64| -> Result<()> {
        seconds = amount
            .checked_mul(unit)
            .and_then(|s| seconds.checked_add(s))
            .ok_or_else(invalid)?;
        Ok(())
    };

    for (amount, designator) in components(date).ok_or_else(invalid)? {
        match designator {
            'Y' => add(amount, 365 * DAY)?,
            'M' => add(amount, 30 * DAY)?,
            'W' => add(amount, 7 * DAY)?,
            'D' => add(amount, DAY)?,
            _ => return Err(invalid()),
        }
    }

    if let Some(time) = time {
        for (amount, designator) in components(time).ok_or_else(invalid)? {
            match designator {
                'H' => add(amount, HOUR)?,
                'M' => add(amount, MINUTE)?,
                'S' => add(amount, 1)?,
                _ => return Err(invalid()),
            }
        }
    }

    Ok(Duration::from_secs(seconds))
}

/// Split `30D12H` style text into (amount, designator) pairs
fn components(text: &str) -> Option<Vec<(u64, char)>> {
    let mut out = Vec::new();
    let mut digits = String::new();

    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        if digits.is_empty() {
            return None;
        }

        out.push((digits.parse().ok()?, c));
        digits.clear();
    }

    if !digits.is_empty() {
        return None;
    }

    Some(out)
}
