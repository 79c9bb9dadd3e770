//! Free text to structured items.
//!
//! One item per non-empty line. Each line goes through three tiers, first match wins:
//!
//! 1. `<number> <unit> <label>`: unit is a run of ASCII letters followed by whitespace.
//! 2. `<number> <label>`: no unit.
//! 3. anything else: the whole line is the label, quantity 1.
//!
//! Numbers are `digits[.digits]`. This is a heuristic for text a human types and
//! reviews, so a label that starts with a number ("7up") lands in tier 1 or 2.

use crate::model::Item;

/// Parses a multi-line correction into items, preserving line order.
pub fn parse(text: &str) -> Vec<Item> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Item {
    let Some((qty, rest)) = leading_quantity(line) else {
        return Item::canonical(1.0, None, line);
    };
    if let Some((unit, label)) = split_unit(rest) {
        return Item::canonical(qty, Some(unit), label);
    }
    Item::canonical(qty, None, rest)
}

/// Splits `<number><ws>+<rest>` and returns the quantity and a non-empty rest.
fn leading_quantity(line: &str) -> Option<(f64, &str)> {
    let int_end = ascii_run(line, 0, |c| c.is_ascii_digit());
    if int_end == 0 {
        return None;
    }
    let mut end = int_end;
    if line[end..].starts_with('.') {
        let frac_end = ascii_run(line, end + 1, |c| c.is_ascii_digit());
        if frac_end > end + 1 {
            end = frac_end;
        }
    }
    let rest = skip_whitespace(&line[end..])?;
    let qty = line[..end].parse().ok()?;
    Some((qty, rest))
}

/// Splits `<letters><ws>+<label>` off the text following the quantity.
fn split_unit(rest: &str) -> Option<(&str, &str)> {
    let unit_end = ascii_run(rest, 0, |c| c.is_ascii_alphabetic());
    if unit_end == 0 {
        return None;
    }
    let label = skip_whitespace(&rest[unit_end..])?;
    Some((&rest[..unit_end], label))
}

/// Requires at least one leading whitespace char and returns what follows it,
/// or `None` when nothing follows.
fn skip_whitespace(s: &str) -> Option<&str> {
    let trimmed = s.trim_start();
    if trimmed.len() == s.len() || trimmed.is_empty() {
        return None;
    }
    Some(trimmed)
}

/// Byte index where the run of ASCII chars matching `pred` starting at `from` ends.
fn ascii_run(s: &str, from: usize, pred: impl Fn(u8) -> bool) -> usize {
    s.as_bytes()[from..]
        .iter()
        .position(|&b| !pred(b))
        .map_or(s.len(), |offset| from + offset)
}
