//! Aggregate view over per-file analysis results.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use super::{FileOutcome, FileReport};
use crate::dedup::DuplicateGroup;
use crate::models::statement::{DateRange, YearMonth};

/// Outcome category, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Parsed,
    Duplicate,
    Unparseable,
    Malformed,
    Unrecognized,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Parsed => "parsed",
            OutcomeKind::Duplicate => "duplicate",
            OutcomeKind::Unparseable => "unparseable",
            OutcomeKind::Malformed => "malformed",
            OutcomeKind::Unrecognized => "unrecognized",
        }
    }

    /// Whether files with this outcome make a run incomplete.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OutcomeKind::Unparseable | OutcomeKind::Malformed | OutcomeKind::Unrecognized
        )
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hole between two consecutive statements of the same format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementBreak {
    pub parser: String,
    pub previous: PathBuf,
    pub previous_end: NaiveDate,
    pub next: PathBuf,
    pub next_start: NaiveDate,
    /// Days from the previous end to the next start.
    pub gap_days: i64,
}

/// Run-level totals and coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_files: usize,
    pub by_outcome: BTreeMap<OutcomeKind, usize>,
    /// Recognized files (parsed or unparseable) per parser identity.
    pub by_parser: BTreeMap<String, usize>,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    pub total_days_covered: i64,
    /// Months between the earliest and latest month no statement touches.
    pub coverage_gaps: Vec<YearMonth>,
    pub statement_breaks: Vec<StatementBreak>,
    pub duplicate_groups: Vec<DuplicateGroup>,
}

impl Summary {
    /// Aggregate file reports. Only parsed files contribute dates.
    pub fn from_reports(reports: &[FileReport], duplicate_groups: Vec<DuplicateGroup>) -> Self {
        let mut summary = Summary {
            total_files: reports.len(),
            duplicate_groups,
            ..Default::default()
        };

        let mut parsed: Vec<(&str, &PathBuf, DateRange)> = Vec::new();

        for report in reports {
            *summary.by_outcome.entry(report.outcome.kind()).or_default() += 1;

            match &report.outcome {
                FileOutcome::Parsed { parser, range, .. } => {
                    *summary.by_parser.entry(parser.clone()).or_default() += 1;
                    parsed.push((parser.as_str(), &report.path, *range));
                }
                FileOutcome::Unparseable { parser, .. } => {
                    *summary.by_parser.entry(parser.clone()).or_default() += 1;
                }
                _ => {}
            }
        }

        let Some(overall) = DateRange::spanning(
            parsed
                .iter()
                .flat_map(|(_, _, r)| [r.start(), r.end()]),
        ) else {
            return summary;
        };

        summary.earliest = Some(overall.start());
        summary.latest = Some(overall.end());
        summary.total_days_covered = overall.days();
        summary.coverage_gaps = overall
            .months()
            .filter(|month| !parsed.iter().any(|(_, _, r)| r.intersects_month(*month)))
            .collect();
        summary.statement_breaks = find_breaks(&mut parsed);

        summary
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.by_outcome.get(&kind).copied().unwrap_or(0)
    }

    pub fn failures(&self) -> usize {
        self.by_outcome
            .iter()
            .filter(|(kind, _)| kind.is_failure())
            .map(|(_, n)| n)
            .sum()
    }
}

/// Breaks of more than one day between consecutive statements, per parser.
fn find_breaks(parsed: &mut [(&str, &PathBuf, DateRange)]) -> Vec<StatementBreak> {
    parsed.sort_by(|a, b| {
        a.0.cmp(b.0)
            .then(a.2.start().cmp(&b.2.start()))
            .then(a.1.cmp(b.1))
    });

    parsed
        .windows(2)
        .filter(|pair| pair[0].0 == pair[1].0)
        .filter_map(|pair| {
            let (parser, previous, prev_range) = pair[0];
            let (_, next, next_range) = pair[1];
            let gap_days = (next_range.start() - prev_range.end()).num_days();
            (gap_days > 1).then(|| StatementBreak {
                parser: parser.to_string(),
                previous: previous.clone(),
                previous_end: prev_range.end(),
                next: next.clone(),
                next_start: next_range.start(),
                gap_days,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::statement::ScanStats;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parsed(name: &str, parser: &str, start: NaiveDate, end: NaiveDate) -> FileReport {
        FileReport {
            path: PathBuf::from(name),
            digest: None,
            outcome: FileOutcome::Parsed {
                parser: parser.to_string(),
                range: DateRange::new(start, end).unwrap(),
                stats: ScanStats::default(),
            },
        }
    }

    fn malformed(name: &str) -> FileReport {
        FileReport {
            path: PathBuf::from(name),
            digest: None,
            outcome: FileOutcome::Malformed {
                reason: "text extraction timed out".to_string(),
            },
        }
    }

    #[test]
    fn test_gap_month_between_statements() {
        let reports = vec![
            parsed("jan.pdf", "AIB-debit", date(2023, 1, 1), date(2023, 1, 31)),
            parsed("mar.pdf", "AIB-debit", date(2023, 3, 1), date(2023, 3, 31)),
        ];
        let summary = Summary::from_reports(&reports, Vec::new());

        assert_eq!(summary.coverage_gaps, vec![YearMonth::new(2023, 2).unwrap()]);
        assert_eq!(summary.earliest, Some(date(2023, 1, 1)));
        assert_eq!(summary.latest, Some(date(2023, 3, 31)));
        assert_eq!(summary.total_days_covered, 89);

        assert_eq!(summary.statement_breaks.len(), 1);
        let brk = &summary.statement_breaks[0];
        assert_eq!(brk.previous, PathBuf::from("jan.pdf"));
        assert_eq!(brk.next, PathBuf::from("mar.pdf"));
        assert_eq!(brk.gap_days, 29);
    }

    #[test]
    fn test_adjacent_statements_have_no_break() {
        let reports = vec![
            parsed("a.pdf", "AIB-debit", date(2023, 1, 1), date(2023, 1, 31)),
            parsed("b.pdf", "AIB-debit", date(2023, 2, 1), date(2023, 2, 28)),
        ];
        let summary = Summary::from_reports(&reports, Vec::new());
        assert!(summary.coverage_gaps.is_empty());
        assert!(summary.statement_breaks.is_empty());
    }

    #[test]
    fn test_breaks_are_per_parser() {
        let reports = vec![
            parsed("debit-jan.pdf", "AIB-debit", date(2023, 1, 1), date(2023, 1, 31)),
            parsed("credit-jan.pdf", "AIB-credit", date(2023, 1, 10), date(2023, 2, 9)),
            parsed("debit-feb.pdf", "AIB-debit", date(2023, 2, 1), date(2023, 2, 28)),
        ];
        let summary = Summary::from_reports(&reports, Vec::new());
        assert!(summary.statement_breaks.is_empty());
        assert_eq!(summary.by_parser.get("AIB-debit"), Some(&2));
        assert_eq!(summary.by_parser.get("AIB-credit"), Some(&1));
    }

    #[test]
    fn test_malformed_files_do_not_move_bounds() {
        let reports = vec![
            parsed("mar.pdf", "AIB-debit", date(2023, 3, 1), date(2023, 3, 28)),
            malformed("slow.pdf"),
        ];
        let summary = Summary::from_reports(&reports, Vec::new());

        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.count(OutcomeKind::Malformed), 1);
        assert_eq!(summary.failures(), 1);
        assert_eq!(summary.earliest, Some(date(2023, 3, 1)));
        assert_eq!(summary.latest, Some(date(2023, 3, 28)));
    }

    #[test]
    fn test_no_parsed_files() {
        let summary = Summary::from_reports(&[malformed("x.pdf")], Vec::new());
        assert!(summary.earliest.is_none());
        assert!(summary.coverage_gaps.is_empty());
        assert_eq!(summary.total_days_covered, 0);
    }
}
