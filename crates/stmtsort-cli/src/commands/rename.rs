//! Rename command - copy statements into date-based names.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::info;

use stmtsort_core::analysis::{AnalysisReport, Analyzer, DiscoverOptions, discover};
use stmtsort_core::rename::{ApplyOutcome, RenameOptions, RenameReport, rename_all};

use super::{RunStatus, display_name, file_progress, load_config, print_failures, tick};

/// Arguments for the rename command.
#[derive(Args)]
pub struct RenameArgs {
    /// Directory containing statement PDFs
    input: PathBuf,

    /// Output directory (default: <INPUT>/renamed)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show what would be copied without touching the file system
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

pub async fn run(args: RenameArgs, config_path: Option<&str>) -> anyhow::Result<RunStatus> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.join(&config.rename.output_subdir));
    let discover_options = DiscoverOptions {
        recursive: args.recursive || config.analysis.recursive,
        sub_paths: Vec::new(),
        exclude: Some(output_dir.clone()),
    };
    let rename_options = RenameOptions {
        output_dir,
        dry_run: args.dry_run || config.rename.dry_run,
    };
    let jobs = args.jobs.unwrap_or(config.analysis.jobs);
    let input = args.input;

    let files = discover(&input, &discover_options)?;
    println!(
        "{} Found {} statements in {}",
        style("ℹ").blue(),
        files.len(),
        input.display()
    );

    let pb = file_progress(files.len())?;
    let (analysis, renames) = tokio::task::spawn_blocking({
        let pb = pb.clone();
        let options = rename_options.clone();
        move || -> anyhow::Result<(AnalysisReport, RenameReport)> {
            let analyzer = Analyzer::new(&config).with_jobs(jobs);
            let analysis = analyzer.analyze_files(&files, |report| tick(&pb, report));
            let renames = rename_all(&analysis.rename_inputs(), &options)?;
            Ok((analysis, renames))
        }
    })
    .await??;
    pb.finish_and_clear();

    print_plan(&renames);
    print_failures(&analysis);

    let duplicates = analysis.summary.duplicate_groups.len();
    println!();
    println!(
        "{} {} {} statements in {:?}",
        style("✓").green(),
        if renames.dry_run { "Planned" } else { "Renamed" },
        renames.entries.len(),
        start.elapsed()
    );
    println!(
        "   {} copied, {} already present, {} duplicate groups skipped, {} need attention",
        style(renames.copied()).green(),
        renames.already_present(),
        duplicates,
        style(analysis.summary.failures()).red()
    );
    info!("Output directory: {}", rename_options.output_dir.display());

    Ok(RunStatus::of(&analysis))
}

fn print_plan(report: &RenameReport) {
    for entry in &report.entries {
        let marker = match entry.outcome {
            None => style("→").cyan(),
            Some(ApplyOutcome::Copied) => style("✓").green(),
            Some(ApplyOutcome::AlreadyPresent) => style("=").dim(),
        };
        println!(
            "  {} {} -> {}",
            marker,
            display_name(&entry.target.source),
            entry.target.file_name
        );
    }
}
