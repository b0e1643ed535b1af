//! Canonical text forms shared by the option variants.
//!
//! Numbers are parsed locale-independently. Vector payloads are lists of
//! items where each item is either raw text running up to the separator or
//! a double-quoted, C-escaped string. A quoted item may be followed by either
//! `,` or `;`, which is what lets the JSON loader feed quoted arrays into any
//! vector option.

use crate::error::{ConfigError, ConfigResult};

/// Escape `\r`, `\n`, `\` and `"` with a backslash.
#[must_use]
pub fn escape_string_cstyle(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\\' | '"' => {
                out.push('\\');
                out.push(c);
            },
            c => out.push(c),
        }
    }
    out
}

/// Strict inverse of [`escape_string_cstyle`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEscape`] on a trailing backslash or an
/// escape code other than `r`, `n`, `\` or `"`.
pub fn unescape_string_cstyle(text: &str) -> ConfigResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                return Err(ConfigError::InvalidEscape {
                    message: format!("unrecognized escape code '\\{other}'"),
                });
            },
            None => {
                return Err(ConfigError::InvalidEscape {
                    message: "trailing backslash at end of string".to_owned(),
                });
            },
        }
    }
    Ok(out)
}

/// Split a serialized vector into its items.
///
/// Returns `None` when a quoted item is unterminated, badly escaped, or
/// followed by anything but a separator.
pub(crate) fn split_items(text: &str, separator: char) -> Option<Vec<String>> {
    let mut items = Vec::new();
    if text.is_empty() {
        return Some(items);
    }

    let mut chars = text.chars().peekable();
    loop {
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut raw = String::new();
            loop {
                match chars.next()? {
                    '"' => break,
                    '\\' => {
                        raw.push('\\');
                        raw.push(chars.next()?);
                    },
                    c => raw.push(c),
                }
            }
            items.push(unescape_string_cstyle(&raw).ok()?);
            match chars.next() {
                None => break,
                Some(c) if c == separator || c == ',' || c == ';' => {},
                Some(_) => return None,
            }
        } else {
            let mut raw = String::new();
            let mut at_end = true;
            for c in chars.by_ref() {
                if c == separator {
                    at_end = false;
                    break;
                }
                raw.push(c);
            }
            items.push(raw);
            if at_end {
                break;
            }
        }

        // A separator as the very last character leaves an empty item.
        if chars.peek().is_none() {
            items.push(String::new());
            break;
        }
    }
    Some(items)
}

/// Join items with `separator`, quoting the ones that would not survive
/// [`split_items`] as raw text.
pub(crate) fn join_items<I>(items: I, separator: char) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        if needs_quoting(&item, separator) {
            out.push('"');
            out.push_str(&escape_string_cstyle(&item));
            out.push('"');
        } else {
            out.push_str(&item);
        }
    }
    out
}

fn needs_quoting(item: &str, separator: char) -> bool {
    item.is_empty()
        || item
            .chars()
            .any(|c| c == separator || matches!(c, '"' | '\\' | '\r' | '\n'))
}

/// Parse a finite float, ignoring surrounding whitespace.
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub(crate) fn parse_int(text: &str) -> Option<i32> {
    text.trim().parse::<i32>().ok()
}

/// Accepts `true/1/yes/on` and `false/0/no/off`, case-insensitively.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Heuristic used when a bool no longer parses: anything that is not
/// recognizably true maps to false.
#[must_use]
pub fn looks_like_true(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

pub(crate) fn format_float(value: f64) -> String {
    format!("{value}")
}

/// Parse `<number>%` into a fraction, or a bare number as-is.
///
/// The flag is true when the `%` suffix was present.
pub(crate) fn parse_percent(text: &str) -> Option<(f64, bool)> {
    let trimmed = text.trim();
    match trimmed.strip_suffix('%') {
        Some(number) => {
            let number = number.trim();
            match shift_point(number, false) {
                Some(fraction) => parse_float(&fraction),
                None => parse_float(number).map(|v| v / 100.0),
            }
            .map(|v| (v, true))
        },
        None => parse_float(trimmed).map(|v| (v, false)),
    }
}

/// Render a fraction as `<fraction*100>%`.
///
/// The shortest decimal text of the fraction has its point moved two
/// places, so parsing the result yields the same fraction bit for bit.
pub(crate) fn format_percent(fraction: f64) -> String {
    let shown = shift_point(&format_float(fraction), true)
        .unwrap_or_else(|| format_float(fraction * 100.0));
    format!("{shown}%")
}

/// Move the decimal point of a plain decimal number two places right
/// (`right`) or left. `None` for anything but `[+-]digits[.digits]`.
fn shift_point(number: &str, right: bool) -> Option<String> {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number.strip_prefix('+').unwrap_or(number)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !is_digits(int_part) || !is_digits(frac_part) {
        return None;
    }

    let (int_digits, frac_digits) = if right {
        let padded = format!("{frac_part:0<2}");
        let (head, tail) = padded.split_at(2);
        (format!("{int_part}{head}"), tail.to_owned())
    } else {
        let padded = format!("{int_part:0>3}");
        let (head, tail) = padded.split_at(padded.len().saturating_sub(2));
        (head.to_owned(), format!("{tail}{frac_part}"))
    };

    let int_digits = match int_digits.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };
    let frac_digits = frac_digits.trim_end_matches('0');
    Some(if frac_digits.is_empty() {
        format!("{sign}{int_digits}")
    } else {
        format!("{sign}{int_digits}.{frac_digits}")
    })
}
