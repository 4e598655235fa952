//! AIB credit card statements.
//!
//! Rows carry a transaction and a posting date without a year:
//!   13 Dec 15 Dec TESCO STORES 45.10
//! The year comes from the printed statement date:
//!   Account Statement - 11th January, 2026

use chrono::NaiveDate;
use tracing::debug;

use super::rules::{
    AIB_CREDIT_STATEMENT_DATE, DateScan, ROW_DAY_MONTH, month_from_name, parse_day_month_token,
    split_row,
};
use super::{ParseOutcome, ParseSettings, StatementParser};
use crate::pdf::StatementText;

/// Parser for AIB credit card statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct AibCreditParser;

impl AibCreditParser {
    pub fn new() -> Self {
        Self
    }

    /// Printed statement date, searched from the last page backwards.
    fn statement_date(&self, text: &StatementText) -> Option<NaiveDate> {
        text.pages().iter().rev().find_map(|page| {
            let caps = AIB_CREDIT_STATEMENT_DATE.captures(&page.text)?;
            let day: u32 = caps[1].parse().ok()?;
            let month = month_from_name(&caps[2])?;
            let year: i32 = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
    }
}

impl StatementParser for AibCreditParser {
    fn name(&self) -> &'static str {
        "AIB-credit"
    }

    fn matches(&self, text: &StatementText) -> bool {
        let first = text.first_page_text();
        first.contains("Credit Limit") && first.contains("Account Statement")
    }

    fn extract(&self, text: &StatementText, settings: &ParseSettings) -> ParseOutcome {
        let mut scan = DateScan::new();

        let Some(statement_date) = self.statement_date(text) else {
            return ParseOutcome::Unparseable {
                diagnostic: "statement date not found; row years cannot be resolved".to_string(),
                stats: scan.stats(),
            };
        };

        for page in text.pages() {
            for line in page.lines() {
                if AIB_CREDIT_STATEMENT_DATE.is_match(line) {
                    continue;
                }
                if let Some(row) = split_row(&ROW_DAY_MONTH, line) {
                    scan.record(row.token, parse_day_month_token(row.token, statement_date));
                }
            }
        }

        debug!("AIB credit scan (statement {}): {:?}", statement_date, scan.stats());
        scan.finish(settings.max_skip_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_recognizes_credit_statement() {
        let parser = AibCreditParser::new();
        let text = StatementText::from_text("Account Statement - 11th January, 2026\nCredit Limit: €5,000.00");
        assert!(parser.matches(&text));
        assert!(!parser.matches(&StatementText::from_text("Account Statement - 11th January, 2026")));
        assert!(!parser.matches(&StatementText::from_text("Credit Limit: €5,000.00")));
    }

    #[test]
    fn test_rows_across_year_boundary() {
        let text = StatementText::from_pages([
            "Account Statement - 11th January, 2026\nCredit Limit: €5,000.00\n\
             13 Dec 15 Dec TESCO STORES 45.10\n\
             20 Dec 21 Dec AMAZON EU 12.99\n",
            "2 Jan 3 Jan SPOTIFY 10.99\n\
             9 Jan 10 Jan PAYMENT THANK YOU 500.00\n",
        ]);

        match AibCreditParser::new().parse(&text, &ParseSettings::default()) {
            ParseOutcome::Parsed { range, stats } => {
                assert_eq!(range.start(), date(2025, 12, 13));
                assert_eq!(range.end(), date(2026, 1, 9));
                assert_eq!(stats.candidates, 4);
            }
            other => panic!("expected parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_statement_date_from_last_page() {
        let text = StatementText::from_pages([
            "Account Statement - 11th January, 2025\nCredit Limit\n",
            "Account Statement - 3rd March, 2026\n1 Mar 2 Mar SHOP 1.00\n",
        ]);
        assert_eq!(AibCreditParser::new().statement_date(&text), Some(date(2026, 3, 3)));
    }

    #[test]
    fn test_missing_statement_date_is_unparseable() {
        let text = StatementText::from_text("Account Statement\nCredit Limit\n13 Dec 15 Dec SHOP 1.00\n");

        match AibCreditParser::new().parse(&text, &ParseSettings::default()) {
            ParseOutcome::Unparseable { diagnostic, .. } => {
                assert!(diagnostic.contains("statement date"));
            }
            other => panic!("expected unparseable, got {:?}", other),
        }
    }
}
