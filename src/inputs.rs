//! Input discovery and output naming for the run command

use crate::pipeline::{Job, PROCESSED_SUFFIX};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const CONTAINER_EXTENSION: &str = "m4b";

/// Collect input files from a single path, a list file and a directory, in that order
pub fn resolve_inputs(
    file: Option<&Path>,
    list: Option<&Path>,
    dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    if let Some(file) = file {
        inputs.push(file.to_path_buf());
    }

    if let Some(list) = list {
        if !list.is_file() {
            bail!("The file '{}' does not exist", list.display());
        }
        let content = fs::read_to_string(list)
            .with_context(|| format!("Failed to read {}", list.display()))?;
        inputs.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(PathBuf::from),
        );
    }

    if let Some(dir) = dir {
        if !dir.is_dir() {
            bail!("The directory '{}' does not exist", dir.display());
        }
        inputs.extend(scan_directory(dir));
    }

    if inputs.is_empty() {
        bail!("No input files provided. Pass a FILE, --list or --dir.");
    }

    Ok(inputs)
}

/// .m4b files directly inside `dir`, sorted by path
pub fn scan_directory(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_m4b_file(p))
        .collect();

    files.sort();
    files
}

fn is_m4b_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase() == CONTAINER_EXTENSION)
        .unwrap_or(false)
}

/// `<stem>_chapterized.<ext>` next to the input, or in `output_dir`
pub fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| CONTAINER_EXTENSION.to_string());
    let filename = format!("{}{}.{}", stem, PROCESSED_SUFFIX, ext);

    match output_dir {
        Some(dir) => dir.join(filename),
        None => input.with_file_name(filename),
    }
}

/// Pair inputs with outputs; an explicit output only applies to a single input
pub fn plan_jobs(
    inputs: Vec<PathBuf>,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<Vec<Job>> {
    if let Some(output) = output {
        if inputs.len() != 1 {
            bail!("--output can only be used with a single input file");
        }
        return Ok(inputs
            .into_iter()
            .map(|input| Job {
                input,
                output: output.to_path_buf(),
            })
            .collect());
    }

    Ok(inputs
        .into_iter()
        .map(|input| Job {
            output: output_path_for(&input, output_dir),
            input,
        })
        .collect())
}
