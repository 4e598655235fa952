//! Subcommands and the helpers they share.

pub mod analyze;
pub mod config;
pub mod parsers;
pub mod rename;

use std::path::{Path, PathBuf};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use stmtsort_core::StmtConfig;
use stmtsort_core::analysis::{AnalysisReport, FileReport, OutcomeKind};

/// How a command finished, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every file was handled.
    Complete,
    /// Some files were unparseable, malformed or unrecognized.
    Incomplete,
}

impl RunStatus {
    pub fn of(report: &AnalysisReport) -> Self {
        if report.is_complete() {
            RunStatus::Complete
        } else {
            RunStatus::Incomplete
        }
    }
}

/// `<config dir>/stmtsort/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stmtsort")
        .join("config.json")
}

/// Resolve the config file: the `--config` flag if given, else the default
/// location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load configuration.
///
/// An explicit `--config` file must exist; the default file is optional.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<StmtConfig> {
    let path = config_file(config_path);
    if path.exists() {
        debug!("Loading config from {}", path.display());
        return StmtConfig::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e));
    }
    if config_path.is_some() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    Ok(StmtConfig::default())
}

/// Progress bar over `len` files, drawn on stderr.
pub fn file_progress(len: usize) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

/// Advance `pb` for one finished file.
pub fn tick(pb: &ProgressBar, report: &FileReport) {
    pb.set_message(display_name(&report.path));
    pb.inc(1);
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Status glyph for an outcome.
pub fn glyph(kind: OutcomeKind) -> console::StyledObject<&'static str> {
    match kind {
        OutcomeKind::Parsed => style("✓").green(),
        OutcomeKind::Duplicate => style("≡").blue(),
        OutcomeKind::Unparseable => style("!").yellow(),
        OutcomeKind::Malformed | OutcomeKind::Unrecognized => style("✗").red(),
    }
}

/// List every file that kept the run from being complete.
pub fn print_failures(report: &AnalysisReport) {
    let failed: Vec<_> = report
        .files
        .iter()
        .filter(|f| f.outcome.kind().is_failure())
        .collect();
    if failed.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Files needing attention:").red());
    for file in failed {
        println!(
            "  {} {} [{}]: {}",
            glyph(file.outcome.kind()),
            file.path.display(),
            file.outcome.kind(),
            file.outcome.detail()
        );
    }
}
