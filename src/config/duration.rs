//! Duration strings such as `3s`, `250ms` or `1m30s`.
use std::time::Duration;

use crate::error::ConfigError;

/// Parse a duration string into a [`Duration`].
///
/// Accepts one or more `<number><unit>` groups where the unit is one of
/// `ms`, `s`, `m`, `h` or `d`.  A bare integer is read as milliseconds.
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDuration`] for malformed input and
/// [`ConfigError::ZeroDuration`] when the total is zero.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let text = input.trim();
    let invalid = || ConfigError::InvalidDuration(input.to_string());
    if text.is_empty() {
        return Err(invalid());
    }

    if let Ok(ms) = text.parse::<u64>() {
        return non_zero(Duration::from_millis(ms));
    }

    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let (number, tail) = rest.split_at(digits);
        let value: u64 = number.parse().map_err(|_| invalid())?;
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        let part = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3_600)),
            "d" => Duration::from_secs(value.saturating_mul(86_400)),
            _ => return Err(invalid()),
        };
        total = total.saturating_add(part);
        rest = next;
    }
    non_zero(total)
}

/// Render a [`Duration`] back into the shortest exact duration string.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms % 1_000 != 0 {
        return format!("{ms}ms");
    }
    let secs = ms / 1_000;
    match secs {
        s if s != 0 && s % 86_400 == 0 => format!("{}d", s / 86_400),
        s if s != 0 && s % 3_600 == 0 => format!("{}h", s / 3_600),
        s if s != 0 && s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}

const fn non_zero(duration: Duration) -> Result<Duration, ConfigError> {
    if duration.is_zero() {
        Err(ConfigError::ZeroDuration)
    } else {
        Ok(duration)
    }
}
