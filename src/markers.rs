//! Conversion of catalog chapter lists into time-coded chapter markers

use crate::catalog::ChapterRecord;

/// Padding added after every chapter so adjacent markers never share a boundary
pub const CHAPTER_GAP_MS: u64 = 50;

/// A chapter boundary to embed in the output metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMarker {
    pub title: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Build markers from chapters in order, starting at 0 with a fixed gap after each
pub fn synthesize(chapters: &[ChapterRecord]) -> Vec<ChapterMarker> {
    let mut cursor = 0;

    chapters
        .iter()
        .map(|chapter| {
            let end = cursor + chapter.duration_ms + CHAPTER_GAP_MS;
            let marker = ChapterMarker {
                title: chapter.name.clone(),
                start_ms: cursor,
                end_ms: end,
            };
            cursor = end;
            marker
        })
        .collect()
}

/// What to do with the catalog's final chapter before synthesis.
///
/// Catalogs often end with a short trailing entry (credits, a publisher
/// teaser) that has no matching content in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimPolicy {
    /// Drop the last chapter whenever there is more than one
    #[default]
    Always,
    /// Keep every chapter
    Never,
    /// Drop the last chapter only if it is shorter than the threshold
    ShorterThan(u64),
}

impl TrimPolicy {
    /// Apply the policy; a list of zero or one chapters is never trimmed
    pub fn apply(self, chapters: &[ChapterRecord]) -> &[ChapterRecord] {
        let Some((last, rest)) = chapters.split_last() else {
            return chapters;
        };
        if rest.is_empty() {
            return chapters;
        }

        match self {
            TrimPolicy::Always => rest,
            TrimPolicy::Never => chapters,
            TrimPolicy::ShorterThan(threshold_ms) if last.duration_ms < threshold_ms => rest,
            TrimPolicy::ShorterThan(_) => chapters,
        }
    }
}
