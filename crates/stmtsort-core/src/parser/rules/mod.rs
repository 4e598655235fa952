//! Rule-based row and date extraction shared by the statement parsers.

pub mod dates;
pub mod patterns;

pub use dates::{parse_date_token, parse_day_month_token, month_from_name, DateScan, TokenDate};
pub use patterns::*;

use regex::Regex;

/// A transaction row split into its leading token and the remaining text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    pub token: &'a str,
    pub rest: &'a str,
}

/// Split `line` with a row pattern that has `token` and `rest` groups.
///
/// Lines whose remainder carries no letters (amount-only lines, page
/// numbers) are not rows, and neither is a date standing alone on a line.
pub fn split_row<'a>(pattern: &Regex, line: &'a str) -> Option<Row<'a>> {
    if DATE_TEXTUAL.is_match(line.trim()) {
        return None;
    }
    let caps = pattern.captures(line)?;
    let token = caps.name("token")?.as_str();
    let rest = caps.name("rest")?.as_str();
    rest.chars()
        .any(|c| c.is_ascii_alphabetic())
        .then_some(Row { token, rest })
}
