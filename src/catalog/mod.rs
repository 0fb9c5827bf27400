pub mod chapters;
pub mod client;
mod types;

pub use chapters::fetch_all_chapters;
pub use client::{Catalog, Credentials, Endpoints, SpotifyClient};
pub use types::{AudiobookDetail, CatalogSearchResult, ChapterPage, ChapterRecord};
