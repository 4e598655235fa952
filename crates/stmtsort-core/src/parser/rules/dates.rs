//! Date token parsing and skip-rate accounting for statement rows.

use chrono::{Datelike, Month, NaiveDate};
use tracing::trace;

use super::patterns::{DATE_DAY_MONTH, DATE_DMY, DATE_TEXTUAL, DATE_YMD};
use crate::models::statement::{DateRange, ScanStats};
use crate::parser::ParseOutcome;

/// Outcome of reading one candidate date token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDate {
    Valid(NaiveDate),
    /// Reads as month-first (`04/25/2023`); statements here are day-first.
    Ambiguous,
    Malformed,
}

impl TokenDate {
    pub fn valid(self) -> Option<NaiveDate> {
        match self {
            TokenDate::Valid(date) => Some(date),
            _ => None,
        }
    }
}

/// Parse a full date token: `DD/MM/YYYY`, `DD.MM.YY`, `DD-MM-YYYY`,
/// `YYYY-MM-DD`, `DD MMM YYYY` or `DD Month YY`.
pub fn parse_date_token(token: &str) -> TokenDate {
    let token = token.trim();

    if let Some(caps) = DATE_TEXTUAL.captures(token) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let year = parse_year(&caps[3]);
        return match month_from_name(&caps[2]) {
            Some(month) => from_ymd(year, month, day),
            None => TokenDate::Malformed,
        };
    }

    if let Some(caps) = DATE_DMY.captures(token) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[3].parse().unwrap_or(0);
        if day <= 12 && month > 12 {
            return TokenDate::Ambiguous;
        }
        return from_ymd(parse_year(&caps[4]), month, day);
    }

    if let Some(caps) = DATE_YMD.captures(token) {
        let year: i32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        return from_ymd(year, month, day);
    }

    TokenDate::Malformed
}

/// Parse a `DD MMM` token, taking the year from the statement date.
///
/// Statements list the most recent twelve months, so a row month later than
/// the statement month belongs to the previous year.
pub fn parse_day_month_token(token: &str, statement_date: NaiveDate) -> TokenDate {
    let Some(caps) = DATE_DAY_MONTH.captures(token.trim()) else {
        return TokenDate::Malformed;
    };
    let day: u32 = caps[1].parse().unwrap_or(0);
    let Some(month) = month_from_name(&caps[2]) else {
        return TokenDate::Malformed;
    };

    let year = if month > statement_date.month() {
        statement_date.year() - 1
    } else {
        statement_date.year()
    };
    from_ymd(year, month, day)
}

/// Month number for an English month name or abbreviation.
pub fn month_from_name(name: &str) -> Option<u32> {
    if name.eq_ignore_ascii_case("sept") {
        return Some(9);
    }
    name.parse::<Month>().ok().map(|m| m.number_from_month())
}

fn from_ymd(year: i32, month: u32, day: u32) -> TokenDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(TokenDate::Valid)
        .unwrap_or(TokenDate::Malformed)
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if s.len() <= 2 {
        // Two-digit year: assume 2000s for 00-49, 1900s for 50-99
        if year < 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

/// Collects row dates and counts the tokens that had to be skipped.
#[derive(Debug, Default)]
pub struct DateScan {
    dates: Vec<NaiveDate>,
    stats: ScanStats,
}

impl DateScan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate token and its parse.
    pub fn record(&mut self, token: &str, parsed: TokenDate) {
        self.stats.candidates += 1;
        match parsed {
            TokenDate::Valid(date) => {
                self.stats.accepted += 1;
                self.dates.push(date);
            }
            TokenDate::Ambiguous | TokenDate::Malformed => {
                trace!("Skipping date token {:?} ({:?})", token, parsed);
                self.stats.skipped += 1;
            }
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Turn the scan into an outcome.
    ///
    /// More than `max_skip_rate` skipped tokens, or no accepted dates at all,
    /// makes the statement unparseable.
    pub fn finish(self, max_skip_rate: f64) -> ParseOutcome {
        let stats = self.stats;

        if stats.candidates == 0 {
            return ParseOutcome::Unparseable {
                diagnostic: "no transaction rows found".to_string(),
                stats,
            };
        }

        if stats.skip_rate() > max_skip_rate {
            return ParseOutcome::Unparseable {
                diagnostic: format!(
                    "{} of {} candidate date tokens could not be parsed ({:.0}% > {:.0}%)",
                    stats.skipped,
                    stats.candidates,
                    stats.skip_rate() * 100.0,
                    max_skip_rate * 100.0
                ),
                stats,
            };
        }

        match DateRange::spanning(self.dates) {
            Some(range) => ParseOutcome::Parsed { range, stats },
            None => ParseOutcome::Unparseable {
                diagnostic: "no valid transaction dates".to_string(),
                stats,
            },
        }
    }
}
