use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::pipeline::{ComparisonOutcome, ReplayOutcome, StageError, NO_COMPARISON_MESSAGE, NO_STORED_DATA_MESSAGE};

/// Busy indicator shown while a stage waits on an external call
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(120));
    progress
}

/// Print a titled block of model output
pub fn print_section(title: &str, body: &str) {
    println!();
    println!("{}", style(format!("### {}", title)).bold().cyan());
    println!("{}", body.trim_end());
}

/// Print a stage failure without aborting the run
pub fn print_stage_error(title: &str, error: &StageError) {
    println!();
    println!("{}", style(format!("### {}", title)).bold().cyan());
    println!("{} {}", style("error:").red().bold(), error);
}

/// Print the comparison stage's outcome
pub fn print_comparison(outcome: &ComparisonOutcome) {
    match outcome {
        ComparisonOutcome::Table(table) => print_section("Comparison Table", table),
        ComparisonOutcome::Empty => {
            println!();
            println!("{}", style(NO_COMPARISON_MESSAGE).red().bold());
        }
    }
}

/// Print the replay stage's outcome
pub fn print_replay(outcome: &ReplayOutcome) {
    match outcome {
        ReplayOutcome::Table { table, stored } => {
            let title = format!(
                "Last Comparison (saved {})",
                stored.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            print_section(&title, table);
        }
        ReplayOutcome::NoData => println!("{}", style(NO_STORED_DATA_MESSAGE).yellow()),
    }
}

/// Write the CSV download to a file
pub fn save_csv(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    let mut content = content.to_string();
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }

    fs_err::write(path, content).with_context(|| format!("Failed to write CSV to {}", path.display()))?;
    Ok(())
}
