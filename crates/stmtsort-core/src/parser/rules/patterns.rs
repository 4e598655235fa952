//! Common regex patterns for statement row and date extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Transaction row: a digit-led token followed by more text.
    // Textual dates ("3 Apr 2017") are tried before bare numeric tokens.
    pub static ref ROW_WITH_YEAR: Regex = Regex::new(
        r"^\s*(?P<token>\d{1,2}\s+[A-Za-z]{3,9}\.?\s+\d{2,4}|\d[\d/.\-]*)\s+(?P<rest>\S.*)$"
    ).unwrap();

    // Credit card rows carry day and month only: "13 Dec 15 Dec MERCHANT".
    pub static ref ROW_DAY_MONTH: Regex = Regex::new(
        r"^\s*(?P<token>\d{1,2}\s+[A-Za-z]{3,9}\.?|\d[\d/.\-]*)\s+(?P<rest>\S.*)$"
    ).unwrap();

    // Date tokens
    pub static ref DATE_TEXTUAL: Regex = Regex::new(
        r"^(\d{1,2})\s+([A-Za-z]{3,9})\.?\s+(\d{4}|\d{2})$"
    ).unwrap();

    pub static ref DATE_DAY_MONTH: Regex = Regex::new(
        r"^(\d{1,2})\s+([A-Za-z]{3,9})\.?$"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"^(\d{1,2})([/.\-])(\d{1,2})[/.\-](\d{4}|\d{2})$"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})$"
    ).unwrap();

    // Printed statement dates
    pub static ref AIB_CREDIT_STATEMENT_DATE: Regex = Regex::new(
        r"Account Statement\s*-\s*(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]+),?\s+(\d{4})"
    ).unwrap();

    // Revolut rows may carry a second (completion) date: "- 3 Jan 2024".
    pub static ref REVOLUT_COMPLETED_DATE: Regex = Regex::new(
        r"^-\s+\d{1,2}\s+[A-Za-z]{3,9}\s+\d{4}\s*"
    ).unwrap();

    // A date-led Revolut line whose description may wrap onto the next line.
    pub static ref REVOLUT_DATE_LINE: Regex = Regex::new(
        r"^\s*(?P<token>\d{1,2}\s+[A-Za-z]{3,9}\s+\d{4})(?P<rest>.*)$"
    ).unwrap();

    pub static ref REVOLUT_HEADER_CONTEXT: Regex = Regex::new(
        r"(?i)(generated on|statement|page)(?:\s+the)?\s+\d{1,2}\s+[a-z]{3,9}\s+\d{4}"
    ).unwrap();
}
