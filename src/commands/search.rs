//! Search command - look up one audiobook in the catalog

use crate::catalog::{AudiobookDetail, Catalog, CatalogSearchResult, SpotifyClient};
use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn run(config: &Config, title: &str, author: &str) -> Result<()> {
    let mut catalog = SpotifyClient::connect(config.credentials()?, config.endpoints())
        .context("Error fetching API token")?;

    match lookup(&mut catalog, title, author, config.catalog.search_limit)? {
        Some((found, detail)) => print_match(&found, &detail),
        None => println!("Audiobook '{}' by '{}' not found.", title, author),
    }

    Ok(())
}

/// Best match plus its detail record
pub fn lookup<C: Catalog + ?Sized>(
    catalog: &mut C,
    title: &str,
    author: &str,
    limit: u32,
) -> Result<Option<(CatalogSearchResult, AudiobookDetail)>> {
    let Some(found) = catalog
        .search(title, author, limit)
        .context("Catalog search failed")?
    else {
        return Ok(None);
    };

    let detail = catalog
        .audiobook(&found.id)
        .with_context(|| format!("Failed to fetch audiobook {}", found.id))?;

    Ok(Some((found, detail)))
}

fn print_match(found: &CatalogSearchResult, detail: &AudiobookDetail) {
    println!("{}", detail.name.bold());
    println!("{}", "─".repeat(40));

    if detail.authors.is_empty() {
        print_field("Author", Some(&found.author));
    } else {
        print_field("Author", Some(&detail.authors.join(", ")));
    }
    if !detail.narrators.is_empty() {
        print_field("Narrator", Some(&detail.narrators.join(", ")));
    }
    print_field("Publisher", detail.publisher.as_deref());
    if let Some(total) = detail.total_chapters {
        print_field("Chapters", Some(&total.to_string()));
    }
    print_field("ID", Some(&detail.id));
    print_field(
        "URL",
        Some(found.external_url.as_str()).filter(|u| !u.is_empty()),
    );
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("{:>12}: {}", label.cyan(), v);
    }
}
