use crate::config::TrimMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chapterize")]
#[command(about = "Add catalog chapter markers to m4b audiobooks without re-encoding")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file (default: ~/.config/chapterize/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// ffmpeg executable to use
    #[arg(long, global = true, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch chapters for audiobooks and write chapterized copies
    Run {
        /// Input m4b file
        file: Option<PathBuf>,

        /// Text file listing input files, one per line
        #[arg(short = 'i', long, value_name = "LIST")]
        list: Option<PathBuf>,

        /// Directory to search for .m4b files
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output file (only valid with a single input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory to write output files to
        #[arg(short = 'p', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Keep chapters already in the file and append the new ones after them
        #[arg(long)]
        keep_chapters: bool,

        /// How to treat the catalog's last chapter
        #[arg(long, value_enum, value_name = "POLICY")]
        trim_last: Option<TrimMode>,

        /// Threshold for --trim-last shorter-than
        #[arg(long, value_name = "MS")]
        trim_threshold_ms: Option<u64>,

        /// Show the chapters that would be written without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Search the catalog for an audiobook
    Search {
        /// Audiobook title
        #[arg(long)]
        title: String,

        /// Audiobook author
        #[arg(long)]
        author: String,
    },

    /// Print the metadata ffmpeg reads from a file
    Dump {
        /// Path to the m4b file
        file: PathBuf,

        /// Include existing chapter sections
        #[arg(long)]
        keep_chapters: bool,
    },
}
