//! Run command - chapterize a batch of audiobook files

use crate::catalog::{Catalog, SpotifyClient};
use crate::config::Config;
use crate::inputs::{plan_jobs, resolve_inputs};
use crate::markers::ChapterMarker;
use crate::metadata::Remuxer;
use crate::pipeline::{process_file, Job, Options, Outcome};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;
use tracing::error;

/// Where inputs come from and where outputs go
pub struct Sources<'a> {
    pub file: Option<&'a Path>,
    pub list: Option<&'a Path>,
    pub dir: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub output_dir: Option<&'a Path>,
}

/// Per-batch counts
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub committed: usize,
    pub previewed: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn run(
    config: &Config,
    remuxer: &dyn Remuxer,
    sources: Sources<'_>,
    options: &Options,
    quiet: bool,
) -> Result<()> {
    let credentials = config.credentials()?;

    let inputs = resolve_inputs(sources.file, sources.list, sources.dir)?;
    let jobs = plan_jobs(inputs, sources.output, sources.output_dir)?;

    if let Some(dir) = sources.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut catalog = SpotifyClient::connect(credentials, config.endpoints())
        .context("Error fetching API token")?;

    let summary = run_batch(&mut catalog, remuxer, &jobs, options, quiet)?;

    println!();
    println!(
        "Done: {} chapterized, {} previewed, {} skipped, {} failed",
        summary.committed.to_string().green(),
        summary.previewed,
        summary.skipped.to_string().yellow(),
        summary.failed.to_string().red()
    );

    if summary.failed > 0 {
        bail!("{} file(s) failed", summary.failed);
    }

    Ok(())
}

/// Process jobs in order; per-file errors are counted, auth errors abort
pub fn run_batch<C, R>(
    catalog: &mut C,
    remuxer: &R,
    jobs: &[Job],
    options: &Options,
    quiet: bool,
) -> Result<Summary>
where
    C: Catalog + ?Sized,
    R: Remuxer + ?Sized,
{
    let mut summary = Summary::default();

    for (i, job) in jobs.iter().enumerate() {
        if !quiet {
            println!("[{}/{}] {}", i + 1, jobs.len(), job.input.display());
        }

        match process_file(catalog, remuxer, job, options) {
            Ok(Outcome::Committed {
                matched,
                markers,
                output,
            }) => {
                println!(
                    "  {} {} chapters from \"{}\" -> {}",
                    "✓".green(),
                    markers.len(),
                    matched.name,
                    output.display()
                );
                summary.committed += 1;
            }
            Ok(Outcome::DryRun { matched, markers }) => {
                println!(
                    "  \"{}\" by {} ({})",
                    matched.name.bold(),
                    matched.author,
                    matched.external_url
                );
                print_markers(&markers);
                println!("  (dry-run, nothing written to {})", job.output.display());
                summary.previewed += 1;
            }
            Ok(Outcome::Skipped(reason)) => {
                println!("  {}: {}", "skipped".yellow(), reason);
                summary.skipped += 1;
            }
            Err(e) if e.is_fatal() => {
                return Err(e).context("Catalog authentication failed, aborting batch");
            }
            Err(e) => {
                error!("{}: {}", job.input.display(), e);
                println!("  {}: {}", "error".red(), e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

fn print_markers(markers: &[ChapterMarker]) {
    for (i, marker) in markers.iter().enumerate() {
        println!(
            "  {:>4}  {} - {}  {}",
            i + 1,
            format_timestamp(marker.start_ms),
            format_timestamp(marker.end_ms),
            marker.title
        );
    }
}

/// HH:MM:SS.mmm
fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
