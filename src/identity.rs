//! Author/title resolution from tag metadata with a filename fallback
//!
//! Filenames are expected to look like `[Anything] Author Name - Book Title`,
//! where the bracketed prefix is optional.

use crate::metadata::MetadataBlock;
use std::fmt;

/// Search key for the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudiobookIdentity {
    pub author: String,
    pub title: String,
}

/// Whatever could be resolved when author or title is still missing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IncompleteIdentity {
    pub author: Option<String>,
    pub title: Option<String>,
}

impl fmt::Display for IncompleteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.author, &self.title) {
            (None, None) => write!(f, "no author or title"),
            (None, Some(title)) => write!(f, "no author for \"{}\"", title),
            (Some(author), None) => write!(f, "no title for author \"{}\"", author),
            (Some(_), Some(_)) => write!(f, "complete"),
        }
    }
}

/// Resolve author and title, tags first, each field independently.
///
/// The filename is only parsed when a tag is missing.
pub fn resolve(
    block: &MetadataBlock,
    filename_stem: &str,
) -> Result<AudiobookIdentity, IncompleteIdentity> {
    let mut title = block.attribute("title");
    let mut author = block.attribute("artist");

    if title.is_none() || author.is_none() {
        if let Some((file_author, file_title)) = parse_filename(filename_stem) {
            author = author.or(Some(file_author));
            title = title.or(Some(file_title));
        }
    }

    match (author, title) {
        (Some(author), Some(title)) => Ok(AudiobookIdentity { author, title }),
        (author, title) => Err(IncompleteIdentity { author, title }),
    }
}

/// Split `[prefix] AUTHOR - TITLE` into trimmed (author, title)
pub fn parse_filename(stem: &str) -> Option<(String, String)> {
    let rest = strip_bracket_prefix(stem);
    let (author, title) = rest.split_once(" - ")?;

    let author = author.trim();
    let title = title.trim();
    if author.is_empty() || title.is_empty() {
        return None;
    }

    Some((author.to_string(), title.to_string()))
}

/// Remove a leading `[...] ` group, if present
fn strip_bracket_prefix(s: &str) -> &str {
    if !s.starts_with('[') {
        return s;
    }
    match s.find("] ") {
        Some(end) => &s[end + 2..],
        None => s,
    }
}
