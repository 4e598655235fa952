//! Renaming parsed statements into a date-based naming scheme.
//!
//! Statements are copied, never moved: the source file is left untouched
//! and an existing file in the output directory is never overwritten.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dedup::ContentDigest;
use crate::error::{RenameError, Result};
use crate::models::statement::{DateRange, ParseResult};

/// Snapshot of the output directory: file name to content digest.
#[derive(Debug, Clone, Default)]
pub struct OutputIndex {
    entries: BTreeMap<String, ContentDigest>,
}

impl OutputIndex {
    /// Hash every regular file directly inside `dir`.
    ///
    /// A missing directory is an empty index.
    pub fn scan(dir: &Path) -> std::result::Result<Self, RenameError> {
        let mut entries = BTreeMap::new();
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(RenameError::OutputDir {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };

        for entry in read_dir {
            let entry = entry.map_err(|source| RenameError::OutputDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.insert(name, ContentDigest::of_file(&path)?);
        }

        debug!("Output index of {}: {} files", dir.display(), entries.len());
        Ok(Self { entries })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, ContentDigest)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ContentDigest> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where one statement goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameTarget {
    pub source: PathBuf,
    pub file_name: String,
    pub destination: PathBuf,
    pub parser: String,
    pub range: DateRange,
    pub digest: ContentDigest,
}

/// What `apply` did for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    Copied,
    /// An identical file already sits at the destination.
    AlreadyPresent,
}

/// Base name without suffix or extension.
pub fn base_name(parser: &str, range: &DateRange) -> String {
    format!(
        "{}_from_{}_to_{}",
        parser,
        range.months().next().map(|m| m.to_string()).unwrap_or_default(),
        range.months().last().map(|m| m.to_string()).unwrap_or_default(),
    )
}

/// Per-run naming context.
///
/// Owns every name claimed so far in the run and a snapshot of the output
/// directory taken before planning started.
#[derive(Debug)]
pub struct RenamePlanner {
    output_dir: PathBuf,
    index: OutputIndex,
    claimed: HashSet<String>,
    next_suffix: HashMap<String, u32>,
}

impl RenamePlanner {
    pub fn new(output_dir: impl Into<PathBuf>, index: OutputIndex) -> Self {
        Self {
            output_dir: output_dir.into(),
            index,
            claimed: HashSet::new(),
            next_suffix: HashMap::new(),
        }
    }

    /// Snapshot `output_dir` and start a planner over it.
    pub fn for_output_dir(output_dir: &Path) -> std::result::Result<Self, RenameError> {
        Ok(Self::new(output_dir, OutputIndex::scan(output_dir)?))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Choose a destination name for a parsed statement.
    ///
    /// Returns `None` for results without a date range. Does no I/O.
    pub fn plan(&mut self, result: &ParseResult, digest: ContentDigest) -> Option<RenameTarget> {
        let range = result.range?;
        let base = base_name(&result.parser, &range);

        let file_name = match self.try_claim(format!("{base}.pdf"), digest) {
            Some(name) => name,
            None => loop {
                let n = self.next_suffix.entry(base.clone()).or_insert(1);
                let candidate = format!("{base}_{n}.pdf");
                *n += 1;
                if let Some(name) = self.try_claim(candidate, digest) {
                    break name;
                }
            },
        };

        Some(RenameTarget {
            source: result.path.clone(),
            destination: self.output_dir.join(&file_name),
            file_name,
            parser: result.parser.clone(),
            range,
            digest,
        })
    }

    /// Claim `name` unless this run already handed it out or the output
    /// directory holds different content under it.
    fn try_claim(&mut self, name: String, digest: ContentDigest) -> Option<String> {
        if self.claimed.contains(&name) {
            return None;
        }
        match self.index.get(&name) {
            Some(existing) if *existing != digest => None,
            _ => {
                self.claimed.insert(name.clone());
                Some(name)
            }
        }
    }
}

/// Copy a planned statement into place.
///
/// Never touches the source and never replaces a file with different
/// content. The copy is written to a hidden `.partial` file next to the
/// destination and linked into place only once complete, so a failed copy
/// leaves nothing under the destination name.
pub fn apply(target: &RenameTarget) -> std::result::Result<ApplyOutcome, RenameError> {
    if target.destination.exists() {
        return if ContentDigest::of_file(&target.destination)? == target.digest {
            Ok(ApplyOutcome::AlreadyPresent)
        } else {
            Err(RenameError::Conflict(target.destination.clone()))
        };
    }

    let copy_err = |source| RenameError::Copy {
        from: target.source.clone(),
        to: target.destination.clone(),
        source,
    };

    let partial = partial_path(&target.destination);
    let placed = copy_file(&target.source, &partial)
        .and_then(|()| fs::hard_link(&partial, &target.destination));

    match fs::remove_file(&partial) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", partial.display(), e),
    }

    match placed {
        Ok(()) => Ok(ApplyOutcome::Copied),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(RenameError::Conflict(target.destination.clone()))
        }
        Err(e) => Err(copy_err(e)),
    }
}

fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    let mut input = fs::File::open(from)?;
    let mut output = fs::File::create(to)?;
    io::copy(&mut input, &mut output)?;
    output.sync_all()
}

fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.partial"))
}

/// Options for a rename run.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub output_dir: PathBuf,
    pub dry_run: bool,
}

/// One planned (and possibly applied) rename.
#[derive(Debug, Clone, Serialize)]
pub struct RenameEntry {
    pub target: RenameTarget,
    /// `None` on a dry run.
    pub outcome: Option<ApplyOutcome>,
}

/// Result of a rename run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenameReport {
    pub dry_run: bool,
    pub entries: Vec<RenameEntry>,
    /// Inputs without a date range.
    pub skipped: Vec<PathBuf>,
}

impl RenameReport {
    pub fn targets(&self) -> impl Iterator<Item = &RenameTarget> {
        self.entries.iter().map(|e| &e.target)
    }

    pub fn copied(&self) -> usize {
        self.count(ApplyOutcome::Copied)
    }

    pub fn already_present(&self) -> usize {
        self.count(ApplyOutcome::AlreadyPresent)
    }

    fn count(&self, outcome: ApplyOutcome) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == Some(outcome))
            .count()
    }
}

/// Plan and apply renames for every parsed result, in path order.
///
/// Each result travels with the digest computed for it during duplicate
/// detection; sources are not hashed again.
pub fn rename_all(
    results: &[(ParseResult, ContentDigest)],
    options: &RenameOptions,
) -> Result<RenameReport> {
    let mut ordered: Vec<&(ParseResult, ContentDigest)> = results.iter().collect();
    ordered.sort_by(|a, b| a.0.path.cmp(&b.0.path));

    if !options.dry_run {
        fs::create_dir_all(&options.output_dir).map_err(|source| RenameError::OutputDir {
            path: options.output_dir.clone(),
            source,
        })?;
    }

    let mut planner = RenamePlanner::for_output_dir(&options.output_dir)?;
    let mut report = RenameReport {
        dry_run: options.dry_run,
        ..Default::default()
    };

    for (result, digest) in ordered {
        if !result.is_parsed() {
            report.skipped.push(result.path.clone());
            continue;
        }
        let Some(target) = planner.plan(result, *digest) else {
            report.skipped.push(result.path.clone());
            continue;
        };

        let outcome = if options.dry_run {
            info!("Would copy {} -> {}", result.file_name(), target.file_name);
            None
        } else {
            let outcome = apply(&target)?;
            match outcome {
                ApplyOutcome::Copied => info!("Copied {} -> {}", result.file_name(), target.file_name),
                ApplyOutcome::AlreadyPresent => {
                    debug!("{} already present", target.file_name)
                }
            }
            Some(outcome)
        };

        report.entries.push(RenameEntry { target, outcome });
    }

    if !report.skipped.is_empty() {
        warn!("{} statements without a date range were not renamed", report.skipped.len());
    }

    Ok(report)
}
