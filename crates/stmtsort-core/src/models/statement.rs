//! Statement data models: files, date ranges and parse results.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Serialize, Serializer};

use crate::dedup::ContentDigest;

/// A statement file discovered on disk.
///
/// Identity is the path. The content digest is computed on first use and
/// cached for the lifetime of the value; file bytes are never retained.
#[derive(Debug, Clone)]
pub struct StatementFile {
    path: PathBuf,
    digest: OnceLock<ContentDigest>,
}

impl StatementFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            digest: OnceLock::new(),
        }
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display.
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    /// Content digest, hashing the file on first call.
    pub fn digest(&self) -> io::Result<&ContentDigest> {
        if let Some(digest) = self.digest.get() {
            return Ok(digest);
        }
        let digest = ContentDigest::of_file(&self.path)?;
        Ok(self.digest.get_or_init(|| digest))
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Inclusive range of calendar dates covered by a statement.
///
/// `start <= end` always holds; the constructors refuse anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, returning `None` if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Smallest range containing every date, or `None` for no dates.
    pub fn spanning<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut iter = dates.into_iter();
        let first = iter.next()?;
        let (start, end) = iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days from start to end.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Whether any day of `month` falls inside the range.
    pub fn intersects_month(&self, month: YearMonth) -> bool {
        month.first_day() <= self.end && month.last_day() >= self.start
    }

    /// Every calendar month the range touches, in order.
    pub fn months(&self) -> impl Iterator<Item = YearMonth> {
        YearMonth::from_date(self.start).through(YearMonth::from_date(self.end))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// A calendar month. Displays as `MMMYYYY` (e.g. `Jan2023`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// The following month.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Months from `self` to `last`, both inclusive.
    pub fn through(self, last: YearMonth) -> impl Iterator<Item = YearMonth> {
        std::iter::successors(Some(self), |m| Some(m.succ())).take_while(move |m| *m <= last)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.first_day().format("%b"), self.year)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Counts of candidate date tokens seen while scanning a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Leading tokens of transaction rows that were tried as dates.
    pub candidates: usize,
    /// Tokens that parsed to a date.
    pub accepted: usize,
    /// Tokens rejected as malformed or ambiguous.
    pub skipped: usize,
}

impl ScanStats {
    /// Share of candidates that were skipped (0.0 when there were none).
    pub fn skip_rate(&self) -> f64 {
        if self.candidates == 0 {
            0.0
        } else {
            self.skipped as f64 / self.candidates as f64
        }
    }
}

/// Result of parsing one original statement file.
///
/// Created once per file per run and never mutated afterwards. Holds the
/// file's path, not its bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    /// Source statement.
    pub path: PathBuf,
    /// Identity of the parser that recognized the format.
    pub parser: String,
    /// Covered dates; `None` marks the statement as unparseable.
    pub range: Option<DateRange>,
    /// Explanation for unparseable statements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// Token statistics from the scan.
    pub stats: ScanStats,
}

impl ParseResult {
    pub fn is_parsed(&self) -> bool {
        self.range.is_some()
    }

    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}
