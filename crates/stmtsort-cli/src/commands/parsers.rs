//! Parsers command - list the registered statement formats.

use console::style;

use stmtsort_core::ParserRegistry;

use super::RunStatus;

pub async fn run() -> anyhow::Result<RunStatus> {
    let registry = ParserRegistry::with_default_parsers();

    println!("Registered parsers (in detection order):");
    for (i, name) in registry.names().iter().enumerate() {
        println!("  {}. {}", i + 1, style(name).green());
    }

    Ok(RunStatus::Complete)
}
