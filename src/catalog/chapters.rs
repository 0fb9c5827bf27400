use crate::catalog::{Catalog, ChapterRecord};
use crate::error::Result;
use tracing::debug;

/// Fetch every chapter of an audiobook, following `next` cursors until exhausted.
///
/// Pages are concatenated in retrieval order. Any failed page fails the whole
/// fetch; nothing partial is returned.
pub fn fetch_all_chapters<C: Catalog + ?Sized>(
    catalog: &mut C,
    audiobook_id: &str,
) -> Result<Vec<ChapterRecord>> {
    let mut chapters = Vec::new();
    let mut next = Some(catalog.chapters_url(audiobook_id));
    let mut pages = 0;

    while let Some(url) = next {
        let page = catalog.fetch_page(&url)?;
        pages += 1;
        debug!(page = pages, items = page.items.len(), "fetched chapter page");

        chapters.extend(page.items);
        next = page.next.filter(|n| !n.is_empty());
    }

    Ok(chapters)
}
