//! Directory analysis: discovery, duplicate filtering, extraction and
//! parsing, aggregated into a single report.

mod summary;

pub use summary::{OutcomeKind, StatementBreak, Summary};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use glob::{MatchOptions, Pattern, glob_with};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dedup::{Classification, ContentDigest, DuplicateDetector};
use crate::error::{Result, StmtError};
use crate::models::config::StmtConfig;
use crate::models::statement::{DateRange, ParseResult, ScanStats, StatementFile};
use crate::parser::{ParseOutcome, ParseSettings, ParserRegistry};
use crate::pdf::{PdfExtractor, TextSource, extract_with_timeout};

/// What happened to one discovered file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Parsed {
        parser: String,
        range: DateRange,
        stats: ScanStats,
    },
    /// Byte-identical to `of`; not parsed.
    Duplicate { of: PathBuf },
    Unparseable {
        parser: String,
        diagnostic: String,
        stats: ScanStats,
    },
    /// Unreadable, corrupt or timed out.
    Malformed { reason: String },
    /// No parser recognized the format.
    Unrecognized,
}

impl FileOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            FileOutcome::Parsed { .. } => OutcomeKind::Parsed,
            FileOutcome::Duplicate { .. } => OutcomeKind::Duplicate,
            FileOutcome::Unparseable { .. } => OutcomeKind::Unparseable,
            FileOutcome::Malformed { .. } => OutcomeKind::Malformed,
            FileOutcome::Unrecognized => OutcomeKind::Unrecognized,
        }
    }

    /// One-line description for reports.
    pub fn detail(&self) -> String {
        match self {
            FileOutcome::Parsed { parser, range, .. } => format!("{parser}: {range}"),
            FileOutcome::Duplicate { of } => format!("duplicate of {}", of.display()),
            FileOutcome::Unparseable {
                parser, diagnostic, ..
            } => format!("{parser}: {diagnostic}"),
            FileOutcome::Malformed { reason } => reason.clone(),
            FileOutcome::Unrecognized => "no parser recognized the format".to_string(),
        }
    }
}

/// Per-file entry of an analysis report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<ContentDigest>,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    /// The parse result for recognized files.
    pub fn parse_result(&self) -> Option<ParseResult> {
        let (parser, range, diagnostic, stats) = match &self.outcome {
            FileOutcome::Parsed {
                parser,
                range,
                stats,
            } => (parser, Some(*range), None, *stats),
            FileOutcome::Unparseable {
                parser,
                diagnostic,
                stats,
            } => (parser, None, Some(diagnostic.clone()), *stats),
            _ => return None,
        };
        Some(ParseResult {
            path: self.path.clone(),
            parser: parser.clone(),
            range,
            diagnostic,
            stats,
        })
    }
}

/// Per-file reports plus the run summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub files: Vec<FileReport>,
    pub summary: Summary,
}

impl AnalysisReport {
    /// True when no file is unparseable, malformed or unrecognized.
    pub fn is_complete(&self) -> bool {
        self.summary.failures() == 0
    }

    /// Parse results of every recognized non-duplicate file.
    pub fn parse_results(&self) -> Vec<ParseResult> {
        self.files.iter().filter_map(FileReport::parse_result).collect()
    }

    /// Parse results paired with the digest computed during duplicate
    /// detection, ready for `rename_all`.
    pub fn rename_inputs(&self) -> Vec<(ParseResult, ContentDigest)> {
        self.files
            .iter()
            .filter_map(|f| Some((f.parse_result()?, f.digest?)))
            .collect()
    }
}

/// Which files to pick up under an input directory.
#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    pub recursive: bool,
    /// Restrict discovery to these paths under the input. Empty means the
    /// input directory itself.
    pub sub_paths: Vec<PathBuf>,
    /// Skip anything under this directory.
    pub exclude: Option<PathBuf>,
}

/// Find statement PDFs under `input`, sorted by path.
pub fn discover(input: &Path, options: &DiscoverOptions) -> Result<Vec<StatementFile>> {
    if !input.exists() {
        return Err(StmtError::InputNotFound(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Err(StmtError::NotADirectory(input.to_path_buf()));
    }

    let roots: Vec<PathBuf> = if options.sub_paths.is_empty() {
        vec![input.to_path_buf()]
    } else {
        options.sub_paths.iter().map(|sub| input.join(sub)).collect()
    };

    let match_options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut paths = Vec::new();
    for root in roots {
        if !root.is_dir() {
            warn!("Skipping missing directory {}", root.display());
            continue;
        }
        let pattern = format!(
            "{}/{}",
            Pattern::escape(&root.to_string_lossy()),
            if options.recursive { "**/*.pdf" } else { "*.pdf" }
        );
        let entries = glob_with(&pattern, match_options)
            .map_err(|e| StmtError::Config(format!("invalid discovery pattern: {e}")))?;
        for entry in entries {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => warn!("Cannot read {}: {}", e.path().display(), e.error()),
            }
        }
    }

    paths.retain(|p| p.is_file());
    if let Some(exclude) = &options.exclude {
        paths.retain(|p| !p.starts_with(exclude));
    }
    paths.sort();
    paths.dedup();

    debug!("Discovered {} statements under {}", paths.len(), input.display());
    Ok(paths.into_iter().map(StatementFile::new).collect())
}

/// Drives discovery, duplicate filtering and parsing over worker threads.
pub struct Analyzer {
    registry: ParserRegistry,
    source: Arc<dyn TextSource>,
    detector: DuplicateDetector,
    settings: ParseSettings,
    timeout: Duration,
    min_page_text_length: usize,
    jobs: usize,
}

impl Analyzer {
    /// Analyzer with the built-in parsers and PDF extraction.
    pub fn new(config: &StmtConfig) -> Self {
        Self {
            registry: ParserRegistry::with_default_parsers(),
            source: Arc::new(PdfExtractor::new()),
            detector: DuplicateDetector::new(config.dedup.canonical_rule),
            settings: ParseSettings::from(&config.extraction),
            timeout: config.extraction.timeout(),
            min_page_text_length: config.extraction.min_page_text_length,
            jobs: config.analysis.jobs,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn TextSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Discover and analyze every statement under `input`.
    pub fn run(&self, input: &Path, options: &DiscoverOptions) -> Result<AnalysisReport> {
        self.run_with_progress(input, options, |_| {})
    }

    /// Like [`Analyzer::run`], calling `progress` once per file as results
    /// arrive.
    pub fn run_with_progress<F>(
        &self,
        input: &Path,
        options: &DiscoverOptions,
        progress: F,
    ) -> Result<AnalysisReport>
    where
        F: FnMut(&FileReport),
    {
        let files = discover(input, options)?;
        info!("Analyzing {} statements in {}", files.len(), input.display());
        Ok(self.analyze_files(&files, progress))
    }

    /// Analyze an explicit list of files.
    pub fn analyze_files<F>(&self, files: &[StatementFile], mut progress: F) -> AnalysisReport
    where
        F: FnMut(&FileReport),
    {
        let dedup = self.detector.classify(files);

        let mut reports = Vec::with_capacity(files.len());
        let mut work = Vec::new();

        for file in files {
            let path = file.path().to_path_buf();
            let digest = dedup.digest(&path).copied();

            if let Some(reason) = dedup.unreadable.get(&path) {
                reports.push(FileReport {
                    path,
                    digest,
                    outcome: FileOutcome::Malformed {
                        reason: reason.clone(),
                    },
                });
            } else if let Some(Classification::DuplicateOf(of)) = dedup.classification(&path) {
                debug!("{} duplicates {}", file.file_name(), of.display());
                reports.push(FileReport {
                    path,
                    digest,
                    outcome: FileOutcome::Duplicate { of: of.clone() },
                });
            } else {
                work.push((path, digest));
            }
        }

        for report in &reports {
            progress(report);
        }

        let jobs = self.jobs.clamp(1, work.len().max(1));
        let cursor = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<FileReport>();

        thread::scope(|scope| {
            for _ in 0..jobs {
                let tx = tx.clone();
                let cursor = &cursor;
                let work = &work;
                scope.spawn(move || {
                    loop {
                        let i = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some((path, digest)) = work.get(i) else {
                            break;
                        };
                        let report = FileReport {
                            path: path.clone(),
                            digest: *digest,
                            outcome: self.process(path),
                        };
                        if tx.send(report).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for report in rx {
                progress(&report);
                reports.push(report);
            }
        });

        reports.sort_by(|a, b| a.path.cmp(&b.path));
        let summary = Summary::from_reports(&reports, dedup.groups);

        AnalysisReport {
            files: reports,
            summary,
        }
    }

    /// Extract and parse a single file.
    fn process(&self, path: &Path) -> FileOutcome {
        let text = match extract_with_timeout(Arc::clone(&self.source), path, self.timeout) {
            Ok(text) => text.without_short_pages(self.min_page_text_length),
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                return FileOutcome::Malformed {
                    reason: e.to_string(),
                };
            }
        };

        if text.is_blank() {
            return FileOutcome::Malformed {
                reason: "no extractable text".to_string(),
            };
        }

        match self.registry.parse(&text, &self.settings) {
            None => {
                debug!("{}: no parser recognized the format", path.display());
                FileOutcome::Unrecognized
            }
            Some((parser, ParseOutcome::Parsed { range, stats })) => {
                debug!("{}: {} {}", path.display(), parser, range);
                FileOutcome::Parsed {
                    parser: parser.to_string(),
                    range,
                    stats,
                }
            }
            Some((parser, ParseOutcome::Unparseable { diagnostic, stats })) => {
                warn!("{}: {}: {}", path.display(), parser, diagnostic);
                FileOutcome::Unparseable {
                    parser: parser.to_string(),
                    diagnostic,
                    stats,
                }
            }
            Some((_, ParseOutcome::NotThisFormat)) => FileOutcome::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use crate::models::statement::YearMonth;
    use crate::pdf::StatementText;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::fs;

    /// Serves canned text keyed by file name; `slow.pdf` never finishes in
    /// time.
    struct FakeSource {
        texts: HashMap<String, String>,
    }

    impl TextSource for FakeSource {
        fn extract(&self, path: &Path) -> crate::pdf::Result<StatementText> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if name == "slow.pdf" {
                thread::sleep(Duration::from_millis(500));
            }
            self.texts
                .get(&name)
                .map(|t| StatementText::from_text(t.clone()))
                .ok_or_else(|| PdfError::Parse("invalid PDF structure".to_string()))
        }
    }

    fn debit_statement(rows: &[&str]) -> String {
        format!(
            "Statement of Account\nPersonal Bank Account\nDate of Statement\n\
             Date Details Debit € Credit € Balance €\n{}\n",
            rows.join("\n")
        )
    }

    fn analyzer(texts: &[(&str, String)]) -> Analyzer {
        let mut config = StmtConfig::default();
        config.extraction.timeout_secs = 1;
        let source = FakeSource {
            texts: texts
                .iter()
                .map(|(n, t)| (n.to_string(), t.clone()))
                .collect(),
        };
        Analyzer::new(&config)
            .with_source(Arc::new(source))
            .with_jobs(3)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::create_dir_all(dir.path().join("renamed")).unwrap();
        for name in ["b.pdf", "A.PDF", "notes.txt", "nested/c.pdf", "renamed/x.pdf"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let flat = discover(dir.path(), &DiscoverOptions::default()).unwrap();
        let names: Vec<String> = flat.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf"]);

        let deep = discover(
            dir.path(),
            &DiscoverOptions {
                recursive: true,
                exclude: Some(dir.path().join("renamed")),
                ..Default::default()
            },
        )
        .unwrap();
        let names: Vec<String> = deep.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_discover_sub_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("aib/debit")).unwrap();
        fs::write(dir.path().join("aib/debit/one.pdf"), "1").unwrap();
        fs::write(dir.path().join("top.pdf"), "2").unwrap();

        let files = discover(
            dir.path(),
            &DiscoverOptions {
                sub_paths: vec![PathBuf::from("aib/debit"), PathBuf::from("revolut/debit")],
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "one.pdf");
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover(&missing, &DiscoverOptions::default()),
            Err(StmtError::InputNotFound(_))
        ));

        let file = dir.path().join("file.pdf");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            discover(&file, &DiscoverOptions::default()),
            Err(StmtError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_timeout_is_malformed_and_excluded_from_bounds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mar.pdf"), "march").unwrap();
        fs::write(dir.path().join("slow.pdf"), "slow").unwrap();

        let analyzer = analyzer(&[
            ("mar.pdf", debit_statement(&["01/03/2023 SHOP 1.00", "28/03/2023 RENT 2.00"])),
            ("slow.pdf", debit_statement(&["01/01/2020 OLD 1.00"])),
        ])
        .with_timeout(Duration::from_millis(200));

        let report = analyzer.run(dir.path(), &DiscoverOptions::default()).unwrap();

        let slow = report.files.iter().find(|f| f.path.ends_with("slow.pdf")).unwrap();
        assert_eq!(slow.outcome.kind(), OutcomeKind::Malformed);
        assert!(slow.outcome.detail().contains("timed out"));

        assert_eq!(report.summary.count(OutcomeKind::Malformed), 1);
        assert_eq!(report.summary.earliest, Some(date(2023, 3, 1)));
        assert_eq!(report.summary.latest, Some(date(2023, 3, 28)));
        assert!(!report.is_complete());
    }

    #[test]
    fn test_duplicates_are_not_parsed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("stmt_a.pdf"), "same").unwrap();
        fs::write(dir.path().join("stmt_b.pdf"), "same").unwrap();

        let analyzer = analyzer(&[
            ("stmt_a.pdf", debit_statement(&["01/03/2023 SHOP 1.00"])),
            ("stmt_b.pdf", debit_statement(&["01/03/2023 SHOP 1.00"])),
        ]);
        let report = analyzer.run(dir.path(), &DiscoverOptions::default()).unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].outcome.kind(), OutcomeKind::Parsed);
        assert_eq!(
            report.files[1].outcome,
            FileOutcome::Duplicate {
                of: dir.path().join("stmt_a.pdf")
            }
        );
        assert_eq!(report.summary.duplicate_groups.len(), 1);
        assert_eq!(report.parse_results().len(), 1);
        let inputs = report.rename_inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].0.path, dir.path().join("stmt_a.pdf"));
        assert_eq!(Some(inputs[0].1), report.files[0].digest);
        assert!(report.is_complete());
    }

    #[test]
    fn test_gap_and_outcomes_across_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["jan.pdf", "mar.pdf", "other.pdf", "broken.pdf", "empty.pdf"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let analyzer = analyzer(&[
            ("jan.pdf", debit_statement(&["03/01/2023 SHOP 1.00", "30/01/2023 RENT 2.00"])),
            ("mar.pdf", debit_statement(&["02/03/2023 SHOP 1.00", "29/03/2023 RENT 2.00"])),
            ("other.pdf", "Some Other Bank\n01/01/2023 THING 1.00".to_string()),
            ("empty.pdf", debit_statement(&[])),
        ]);
        let report = analyzer.run(dir.path(), &DiscoverOptions::default()).unwrap();

        let kinds: Vec<OutcomeKind> = report.files.iter().map(|f| f.outcome.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                OutcomeKind::Malformed,
                OutcomeKind::Unparseable,
                OutcomeKind::Parsed,
                OutcomeKind::Parsed,
                OutcomeKind::Unrecognized,
            ]
        );
        assert_eq!(report.summary.coverage_gaps, vec![YearMonth::new(2023, 2).unwrap()]);
        assert_eq!(report.summary.by_parser.get("AIB-debit"), Some(&3));
        assert_eq!(report.summary.failures(), 3);
    }

    #[test]
    fn test_reruns_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut texts = Vec::new();
        for day in 1..=9 {
            let name = format!("s{day}.pdf");
            fs::write(dir.path().join(&name), &name).unwrap();
            texts.push((name, debit_statement(&[format!("0{day}/05/2024 SHOP 1.00").as_str()])));
        }
        let texts: Vec<(&str, String)> = texts.iter().map(|(n, t)| (n.as_str(), t.clone())).collect();

        let analyzer = analyzer(&texts);
        let first = analyzer.run(dir.path(), &DiscoverOptions::default()).unwrap();
        let second = analyzer.with_jobs(1).run(dir.path(), &DiscoverOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
