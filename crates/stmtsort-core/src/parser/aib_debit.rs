//! AIB personal bank account (debit) statements.
//!
//! Expected extracted-text layout:
//!   Statement of Account with Allied Irish Banks, p.l.c.
//!   Personal Bank Account
//!   Date of Statement 28 Apr 2017
//!   Date Details Debit € Credit € Balance €
//!   3 Apr 2017 BALANCE FORWARD 1234.56
//!   5 Apr 2017 Interest Rate
//!   TEST TRANSACTION 100.00

use tracing::debug;

use super::rules::{DateScan, ROW_WITH_YEAR, parse_date_token, split_row};
use super::{ParseOutcome, ParseSettings, StatementParser};
use crate::pdf::StatementText;

const COLUMNS: &[&str] = &["Date", "Details", "Debit", "Credit", "Balance"];

/// Parser for AIB debit account statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct AibDebitParser;

impl AibDebitParser {
    pub fn new() -> Self {
        Self
    }
}

impl StatementParser for AibDebitParser {
    fn name(&self) -> &'static str {
        "AIB-debit"
    }

    fn matches(&self, text: &StatementText) -> bool {
        let first = text.first_page_text();
        first.contains("Statement of Account")
            && first.contains("Personal Bank Account")
            && first.contains("Date of Statement")
    }

    fn extract(&self, text: &StatementText, settings: &ParseSettings) -> ParseOutcome {
        let mut scan = DateScan::new();

        for page in text.pages() {
            for line in page.body_lines(COLUMNS) {
                if let Some(row) = split_row(&ROW_WITH_YEAR, line) {
                    scan.record(row.token, parse_date_token(row.token));
                }
            }
        }

        debug!("AIB debit scan: {:?}", scan.stats());
        scan.finish(settings.max_skip_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "Statement of Account with Allied Irish Banks, p.l.c.\n\
                          Personal Bank Account\n\
                          Date of Statement\n\
                          31 Mar 2023\n";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_recognizes_debit_statement() {
        let text = StatementText::from_text(HEADER);
        assert!(AibDebitParser::new().matches(&text));
    }

    #[test]
    fn test_rejects_missing_keywords() {
        let parser = AibDebitParser::new();
        for text in [
            "Personal Bank Account Date of Statement",
            "Statement of Account Date of Statement",
            "Statement of Account Personal Bank Account",
        ] {
            assert!(!parser.matches(&StatementText::from_text(text)), "{}", text);
            assert_eq!(
                parser.parse(&StatementText::from_text(text), &ParseSettings::default()),
                ParseOutcome::NotThisFormat
            );
        }
    }

    #[test]
    fn test_numeric_rows_with_noise_token() {
        let text = StatementText::from_pages([
            format!(
                "{HEADER}Date Details Debit € Credit € Balance €\n\
                 01/03/2023 BALANCE FORWARD 500.00\n\
                 02/03/2023 SUPERVALU 12.50 487.50\n\
                 123 NOISE ROW\n"
            ),
            "Date Details Debit € Credit € Balance €\n\
             15/03/2023 SALARY 2000.00 2487.50\n\
             28/03/2023 RENT 900.00 1587.50\n"
                .to_string(),
        ]);

        match AibDebitParser::new().parse(&text, &ParseSettings::default()) {
            ParseOutcome::Parsed { range, stats } => {
                assert_eq!(range.start(), date(2023, 3, 1));
                assert_eq!(range.end(), date(2023, 3, 28));
                assert_eq!(stats.candidates, 5);
                assert_eq!(stats.skipped, 1);
            }
            other => panic!("expected parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_balance_forward_starts_range() {
        let text = StatementText::from_text(
            "Statement of Account\nPersonal Bank Account\nDate of Statement\n28 Apr 2017\n\
             Date Details Debit € Credit € Balance €\n\
             3 Apr 2017 BALANCE FORWARD 1234.56\n\
             5 Apr 2017 Interest Rate\n\
             TEST TRANSACTION 100.00\n\
             27 Apr 2017 CARD PAYMENT 20.00\n",
        );

        match AibDebitParser::new().parse(&text, &ParseSettings::default()) {
            ParseOutcome::Parsed { range, .. } => {
                assert_eq!(range.start(), date(2017, 4, 3));
                assert_eq!(range.end(), date(2017, 4, 27));
            }
            other => panic!("expected parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_header_dates_are_not_rows() {
        let text = StatementText::from_text(format!(
            "{HEADER}Date Details Debit € Credit € Balance €\nno rows here\n"
        ));
        assert!(matches!(
            AibDebitParser::new().parse(&text, &ParseSettings::default()),
            ParseOutcome::Unparseable { .. }
        ));
    }

    #[test]
    fn test_mostly_noise_is_unparseable() {
        let text = StatementText::from_text(format!(
            "{HEADER}Date Details Debit € Credit € Balance €\n\
             01/03/2023 SUPERVALU 12.50\n\
             99/99/2023 GARBLED\n\
             123 NOISE\n"
        ));

        match AibDebitParser::new().parse(&text, &ParseSettings::default()) {
            ParseOutcome::Unparseable { diagnostic, stats } => {
                assert_eq!(stats.skipped, 2);
                assert!(diagnostic.contains("2 of 3"));
            }
            other => panic!("expected unparseable, got {:?}", other),
        }

        let lenient = ParseSettings { max_skip_rate: 0.9 };
        assert!(matches!(
            AibDebitParser::new().parse(&text, &lenient),
            ParseOutcome::Parsed { .. }
        ));
    }

    #[test]
    fn test_parse_is_repeatable() {
        let text = StatementText::from_text(format!(
            "{HEADER}Date Details Debit € Credit € Balance €\n01/03/2023 SHOP 1.00\n"
        ));
        let parser = AibDebitParser::new();
        let settings = ParseSettings::default();
        assert_eq!(parser.parse(&text, &settings), parser.parse(&text, &settings));
    }
}
