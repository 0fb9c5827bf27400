use crate::identity;
use crate::metadata::Remuxer;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Print a file's ffmetadata dump, then the identity it resolves to
pub fn run(remuxer: &dyn Remuxer, file: &Path, keep_chapters: bool, quiet: bool) -> Result<()> {
    let block = remuxer.extract(file)?;
    let block = if keep_chapters {
        block
    } else {
        block.truncate_chapters()
    };

    print!("{}", block);

    if !quiet {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        eprintln!();
        match identity::resolve(&block, &stem) {
            Ok(id) => eprintln!(
                "{} author=\"{}\" title=\"{}\"",
                "Resolved:".cyan(),
                id.author,
                id.title
            ),
            Err(incomplete) => eprintln!("{} {}", "Unresolved:".yellow(), incomplete),
        }
    }

    Ok(())
}
