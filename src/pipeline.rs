//! Per-file chapterizing pipeline
//!
//! extract -> resolve identity -> search -> fetch chapters -> synthesize -> commit.
//! Every early exit is an [`Outcome::Skipped`]; only catalog and commit
//! failures are returned as errors.

use crate::catalog::{fetch_all_chapters, Catalog, CatalogSearchResult};
use crate::error::{Error, Result};
use crate::identity::{self, AudiobookIdentity, IncompleteIdentity};
use crate::markers::{synthesize, ChapterMarker, TrimPolicy};
use crate::metadata::Remuxer;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker appended to output stems; inputs carrying it are never reprocessed
pub const PROCESSED_SUFFIX: &str = "_chapterized";

/// One input file and where its output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Keep chapters already present in the file ahead of the new ones
    pub keep_chapters: bool,
    pub trim: TrimPolicy,
    pub search_limit: u32,
    /// Stop before committing
    pub dry_run: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            keep_chapters: false,
            trim: TrimPolicy::default(),
            search_limit: 1,
            dry_run: false,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Committed {
        matched: CatalogSearchResult,
        markers: Vec<ChapterMarker>,
        output: PathBuf,
    },
    DryRun {
        matched: CatalogSearchResult,
        markers: Vec<ChapterMarker>,
    },
    Skipped(SkipReason),
}

#[derive(Debug)]
pub enum SkipReason {
    AlreadyProcessed,
    ExtractionFailed(Error),
    IdentityIncomplete(IncompleteIdentity),
    NoMatch(AudiobookIdentity),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyProcessed => write!(f, "already chapterized"),
            SkipReason::ExtractionFailed(e) => write!(f, "{}", e),
            SkipReason::IdentityIncomplete(incomplete) => write!(
                f,
                "could not determine author and title from metadata or filename ({})",
                incomplete
            ),
            SkipReason::NoMatch(identity) => write!(
                f,
                "'{}' by '{}' not found in catalog",
                identity.title, identity.author
            ),
        }
    }
}

/// Whether a path's file stem carries the processed suffix
pub fn is_processed(path: &Path) -> bool {
    path.file_stem()
        .map(|s| s.to_string_lossy().contains(PROCESSED_SUFFIX))
        .unwrap_or(false)
}

/// Run the whole pipeline for one file
pub fn process_file<C, R>(
    catalog: &mut C,
    remuxer: &R,
    job: &Job,
    options: &Options,
) -> Result<Outcome>
where
    C: Catalog + ?Sized,
    R: Remuxer + ?Sized,
{
    let input = job.input.as_path();

    if is_processed(input) {
        info!("Skipping already chapterized file: {}", input.display());
        return Ok(Outcome::Skipped(SkipReason::AlreadyProcessed));
    }

    let block = match remuxer.extract(input) {
        Ok(block) => block,
        Err(e) => {
            warn!("Error reading {}, skipping file: {}", input.display(), e);
            return Ok(Outcome::Skipped(SkipReason::ExtractionFailed(e)));
        }
    };
    let block = if options.keep_chapters || !block.has_chapters() {
        block
    } else {
        debug!("discarding existing chapters from {}", input.display());
        block.truncate_chapters()
    };

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let identity = match identity::resolve(&block, &stem) {
        Ok(identity) => identity,
        Err(incomplete) => {
            info!("Skipping {}: {}", input.display(), incomplete);
            return Ok(Outcome::Skipped(SkipReason::IdentityIncomplete(incomplete)));
        }
    };

    let Some(matched) = catalog.search(&identity.title, &identity.author, options.search_limit)?
    else {
        warn!(
            "'{}' by '{}' not found in catalog, skipping {}",
            identity.title,
            identity.author,
            input.display()
        );
        return Ok(Outcome::Skipped(SkipReason::NoMatch(identity)));
    };
    info!(id = %matched.id, name = %matched.name, author = %matched.author, "catalog match");

    let chapters = fetch_all_chapters(catalog, &matched.id)?;
    let markers = synthesize(options.trim.apply(&chapters));
    info!(
        fetched = chapters.len(),
        markers = markers.len(),
        "synthesized chapter markers"
    );

    if options.dry_run {
        return Ok(Outcome::DryRun { matched, markers });
    }

    let block = block.append(&markers);
    remuxer.commit(input, &block, &job.output)?;
    info!("File updated with chapters: {}", job.output.display());

    Ok(Outcome::Committed {
        matched,
        markers,
        output: job.output.clone(),
    })
}
