//! Revolut EUR account statements.
//!
//! Revolut statements are consolidated: account, pockets and deposit
//! sections all list rows as
//!   2 Jan 2024 Card payment to Lidl €12.00 €88.00
//!   2 Jan 2024 - 3 Jan 2024 Transfer to savings €50.00
//! The first date of each row is the transaction date.

use tracing::debug;

use super::rules::{
    DateScan, REVOLUT_COMPLETED_DATE, REVOLUT_DATE_LINE, REVOLUT_HEADER_CONTEXT, ROW_WITH_YEAR,
    parse_date_token, split_row,
};
use super::{ParseOutcome, ParseSettings, StatementParser};
use crate::pdf::StatementText;

/// Parser for Revolut EUR debit account statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct RevolutDebitParser;

impl RevolutDebitParser {
    pub fn new() -> Self {
        Self
    }
}

impl StatementParser for RevolutDebitParser {
    fn name(&self) -> &'static str {
        "Revolut-debit-EUR"
    }

    fn matches(&self, text: &StatementText) -> bool {
        let first = text.first_page_text();
        first.contains("EUR Statement")
            && (first.contains("Revolut Bank UAB") || first.contains("Revolut Ltd"))
            && first.contains("Account transactions from")
    }

    fn extract(&self, text: &StatementText, settings: &ParseSettings) -> ParseOutcome {
        let mut scan = DateScan::new();

        for page in text.pages() {
            let lines: Vec<&str> = page.lines().collect();
            for (i, &line) in lines.iter().enumerate() {
                if REVOLUT_HEADER_CONTEXT.is_match(line) {
                    continue;
                }
                if let Some(token) = row_token(line, &lines[i + 1..]) {
                    scan.record(token, parse_date_token(token));
                }
            }
        }

        debug!("Revolut scan: {:?}", scan.stats());
        scan.finish(settings.max_skip_rate)
    }
}

/// Leading date of a transaction row, if `line` starts one.
///
/// The description either follows the date(s) on the same line or wraps onto
/// the next non-empty line, which then starts with a capital letter.
fn row_token<'a>(line: &'a str, following: &[&str]) -> Option<&'a str> {
    if let Some(row) = split_row(&ROW_WITH_YEAR, line) {
        // A completion date alone is not a description.
        let description = REVOLUT_COMPLETED_DATE.replace(row.rest, "");
        if description.chars().any(|c| c.is_ascii_alphabetic()) {
            return Some(row.token);
        }
    }

    let caps = REVOLUT_DATE_LINE.captures(line)?;
    let token = caps.name("token")?.as_str();
    let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
    if !REVOLUT_COMPLETED_DATE.replace(rest, "").trim().is_empty() {
        return None;
    }

    let next = following.iter().map(|l| l.trim()).find(|l| !l.is_empty())?;
    let wraps = next.starts_with(|c: char| c.is_ascii_uppercase())
        && !REVOLUT_HEADER_CONTEXT.is_match(next);
    wraps.then_some(token)
}
