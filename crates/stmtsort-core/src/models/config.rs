//! Configuration structures for the statement pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::dedup::CanonicalRule;

/// Main configuration for the stmtsort pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StmtConfig {
    /// Text extraction and date parsing configuration.
    pub extraction: ExtractionConfig,

    /// Duplicate detection configuration.
    pub dedup: DedupConfig,

    /// Rename/placement configuration.
    pub rename: RenameConfig,

    /// Directory analysis configuration.
    pub analysis: AnalysisConfig,
}

/// Text extraction and date parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Per-file timeout for PDF text extraction, in seconds.
    pub timeout_secs: u64,

    /// Maximum share of candidate date tokens that may fail to parse
    /// before a statement is reported as unparseable (0.0 - 1.0).
    pub max_skip_rate: f64,

    /// Pages with less trimmed text than this are ignored.
    pub min_page_text_length: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_skip_rate: 0.5,
            min_page_text_length: 0,
        }
    }
}

impl ExtractionConfig {
    /// Extraction timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
    /// Reject a skip-rate threshold that is not a number in 0.0 - 1.0.
    pub fn validate(&self) -> Result<(), String> {
        if (0.0..=1.0).contains(&self.max_skip_rate) {
            Ok(())
        } else {
            Err(format!(
                "extraction.max_skip_rate must be between 0.0 and 1.0, got {}",
                self.max_skip_rate
            ))
        }
    }
}

/// Duplicate detection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Which member of a content-identical group is kept as canonical.
    pub canonical_rule: CanonicalRule,
}

/// Rename/placement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Output directory name used when no explicit output is given,
    /// relative to the input directory.
    pub output_subdir: String,

    /// Plan and report without copying.
    pub dry_run: bool,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            output_subdir: "renamed".to_string(),
            dry_run: false,
        }
    }
}

/// Directory analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Root of the conventional multi-bank layout.
    pub default_input_dir: PathBuf,

    /// Bank/account sub-paths scanned under the default input root.
    pub sub_paths: Vec<PathBuf>,

    /// Descend into subdirectories.
    pub recursive: bool,

    /// Number of worker threads.
    pub jobs: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_input_dir: PathBuf::from("statements_raw"),
            sub_paths: vec![
                PathBuf::from("aib/debit"),
                PathBuf::from("aib/credit"),
                PathBuf::from("revolut/debit"),
            ],
            recursive: false,
            jobs: 4,
        }
    }
}

impl StmtConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<(), std::io::Error> {
        self.extraction
            .validate()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
