//! Catalog records and the wire structs they are decoded from

use serde::Deserialize;

/// Best catalog match for a title/author query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSearchResult {
    pub id: String,
    pub name: String,
    pub author: String,
    pub external_url: String,
}

/// One chapter as listed by the catalog, in playback order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChapterRecord {
    pub name: String,
    pub duration_ms: u64,
}

/// A page of chapters plus the cursor to the next page, if any
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChapterPage {
    #[serde(default)]
    pub items: Vec<ChapterRecord>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Top-level audiobook metadata from the detail endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudiobookDetail {
    pub id: String,
    pub name: String,
    pub authors: Vec<String>,
    pub narrators: Vec<String>,
    pub publisher: Option<String>,
    pub total_chapters: Option<u32>,
}

// ============================================================================
// Spotify Web API Response Structs
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub audiobooks: Option<SearchPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    #[serde(default)]
    pub items: Vec<Option<SimplifiedAudiobook>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SimplifiedAudiobook {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub authors: Vec<Person>,
    #[serde(default)]
    pub narrators: Vec<Person>,
    pub publisher: Option<String>,
    pub total_chapters: Option<u32>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Person {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExternalUrls {
    pub spotify: Option<String>,
}

fn join_names(people: &[Person]) -> String {
    people
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<SimplifiedAudiobook> for CatalogSearchResult {
    fn from(book: SimplifiedAudiobook) -> Self {
        Self {
            author: join_names(&book.authors),
            id: book.id,
            name: book.name,
            external_url: book.external_urls.spotify.unwrap_or_default(),
        }
    }
}

impl From<SimplifiedAudiobook> for AudiobookDetail {
    fn from(book: SimplifiedAudiobook) -> Self {
        Self {
            id: book.id,
            name: book.name,
            authors: book.authors.into_iter().map(|p| p.name).collect(),
            narrators: book.narrators.into_iter().map(|p| p.name).collect(),
            publisher: book.publisher.filter(|p| !p.is_empty()),
            total_chapters: book.total_chapters,
        }
    }
}

impl SearchResponse {
    /// First non-null result, if any
    pub fn first_match(self) -> Option<CatalogSearchResult> {
        self.audiobooks?
            .items
            .into_iter()
            .flatten()
            .next()
            .map(CatalogSearchResult::from)
    }
}
