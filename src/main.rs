mod catalog;
mod cli;
mod commands;
mod config;
mod error;
mod identity;
mod inputs;
mod markers;
mod metadata;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::run::Sources;
use config::Config;
use metadata::Ffmpeg;
use pipeline::Options;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ffmpeg = Ffmpeg::new(config.ffmpeg(cli.ffmpeg.as_ref()));

    match cli.command {
        Commands::Run {
            file,
            list,
            dir,
            output,
            output_dir,
            keep_chapters,
            trim_last,
            trim_threshold_ms,
            dry_run,
        } => {
            let options = Options {
                keep_chapters: config.keep_chapters(keep_chapters),
                trim: config.trim_policy(trim_last, trim_threshold_ms),
                search_limit: config.catalog.search_limit,
                dry_run,
            };
            let sources = Sources {
                file: file.as_deref(),
                list: list.as_deref(),
                dir: dir.as_deref(),
                output: output.as_deref(),
                output_dir: output_dir.as_deref(),
            };
            commands::run::run(&config, &ffmpeg, sources, &options, cli.quiet)?;
        }
        Commands::Search { title, author } => {
            commands::search::run(&config, &title, &author)?;
        }
        Commands::Dump {
            file,
            keep_chapters,
        } => {
            commands::dump::run(&ffmpeg, &file, keep_chapters, cli.quiet)?;
        }
    }

    Ok(())
}

/// RUST_LOG wins; otherwise -v / -q pick the level for this crate
fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "warn,chapterize=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
