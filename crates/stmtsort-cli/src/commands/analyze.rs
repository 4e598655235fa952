//! Analyze command - report date coverage across a statement tree.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::debug;

use stmtsort_core::analysis::{AnalysisReport, Analyzer, DiscoverOptions, OutcomeKind, discover};

use super::{RunStatus, display_name, file_progress, glyph, load_config, print_failures, tick};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Statement directory (default: the configured root and its bank sub-paths)
    input: Option<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also write a per-file CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Full report as JSON
    Json,
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<RunStatus> {
    let config = load_config(config_path)?;

    let (input, sub_paths) = match args.input {
        Some(input) => (input, Vec::new()),
        None => (
            config.analysis.default_input_dir.clone(),
            config.analysis.sub_paths.clone(),
        ),
    };
    let options = DiscoverOptions {
        recursive: args.recursive || config.analysis.recursive,
        sub_paths,
        exclude: Some(input.join(&config.rename.output_subdir)),
    };
    let jobs = args.jobs.unwrap_or(config.analysis.jobs);

    let files = discover(&input, &options)?;
    debug!("Analyzing {} files under {}", files.len(), input.display());

    let pb = file_progress(files.len())?;
    let report = tokio::task::spawn_blocking({
        let pb = pb.clone();
        move || {
            Analyzer::new(&config)
                .with_jobs(jobs)
                .analyze_files(&files, |file| tick(&pb, file))
        }
    })
    .await?;
    pb.finish_and_clear();

    if let Some(csv_path) = &args.csv {
        write_csv(csv_path, &report)?;
        eprintln!(
            "{} Per-file summary written to {}",
            style("✓").green(),
            csv_path.display()
        );
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&input, &report),
    }

    Ok(RunStatus::of(&report))
}

fn print_text(input: &Path, report: &AnalysisReport) {
    let summary = &report.summary;
    let rule = "-".repeat(80);

    println!("{}", style(format!("STATEMENT ANALYSIS: {}", input.display())).bold());
    println!("{rule}");
    println!("Total files:          {}", summary.total_files);
    for kind in [
        OutcomeKind::Parsed,
        OutcomeKind::Duplicate,
        OutcomeKind::Unparseable,
        OutcomeKind::Malformed,
        OutcomeKind::Unrecognized,
    ] {
        let label = format!("{}:", kind);
        println!("  {} {:<18} {}", glyph(kind), label, summary.count(kind));
    }
    for (parser, count) in &summary.by_parser {
        println!("  {:<20} {}", parser, count);
    }

    match (summary.earliest, summary.latest) {
        (Some(earliest), Some(latest)) => {
            println!("Covered period:       {} -> {}", earliest, latest);
            println!("Total days covered:   {}", summary.total_days_covered);
        }
        _ => println!("Covered period:       N/A"),
    }
    println!();

    if summary.coverage_gaps.is_empty() {
        println!("COVERAGE GAPS: none");
    } else {
        let months: Vec<String> = summary.coverage_gaps.iter().map(|m| m.to_string()).collect();
        println!("{} {}", style("COVERAGE GAPS:").yellow(), months.join(", "));
    }

    if summary.statement_breaks.is_empty() {
        println!("STATEMENT BREAKS: none");
    } else {
        println!("{}", style("STATEMENT BREAKS (gaps > 1 day)").yellow());
        for brk in &summary.statement_breaks {
            println!("  {} gap of {} days:", brk.parser, brk.gap_days);
            println!("    previous: {} ends {}", display_name(&brk.previous), brk.previous_end);
            println!("    next:     {} starts {}", display_name(&brk.next), brk.next_start);
        }
    }

    if summary.duplicate_groups.is_empty() {
        println!("DUPLICATE FILES: none");
    } else {
        println!("{}", style("DUPLICATE FILES").blue());
        for group in &summary.duplicate_groups {
            println!("  {}...", &group.digest.to_hex()[..16]);
            for file in &group.files {
                println!("    - {}", file.display());
            }
        }
    }

    println!();
    println!("{:<44} {:<12} {:<12} {}", "File", "Start", "End", "Status");
    println!("{rule}");
    for file in &report.files {
        let (start, end) = file
            .parse_result()
            .and_then(|r| r.range)
            .map(|r| (r.start().to_string(), r.end().to_string()))
            .unwrap_or_default();
        println!(
            "{:<44} {:<12} {:<12} {} {}",
            display_name(&file.path),
            start,
            end,
            glyph(file.outcome.kind()),
            file.outcome.kind()
        );
    }

    print_failures(report);
}

fn write_csv(path: &Path, report: &AnalysisReport) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["path", "status", "parser", "start", "end", "digest", "detail"])?;

    for file in &report.files {
        let result = file.parse_result();
        let parser = result.as_ref().map(|r| r.parser.clone()).unwrap_or_default();
        let range = result.as_ref().and_then(|r| r.range);
        wtr.write_record([
            file.path.display().to_string(),
            file.outcome.kind().to_string(),
            parser,
            range.map(|r| r.start().to_string()).unwrap_or_default(),
            range.map(|r| r.end().to_string()).unwrap_or_default(),
            file.digest.map(|d| d.to_hex()).unwrap_or_default(),
            file.outcome.detail(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
