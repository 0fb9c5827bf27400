//! ffmpeg invocation for metadata dumps and chapter remuxing

use crate::error::{Error, Result};
use crate::metadata::MetadataBlock;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::NamedTempFile;
use tracing::debug;

/// External tool that reads and rewrites container metadata
pub trait Remuxer {
    /// Dump the file's current metadata
    fn extract(&self, input: &Path) -> Result<MetadataBlock>;

    /// Write `output` from `input` with `block` as its metadata and chapters,
    /// copying every stream unchanged
    fn commit(&self, input: &Path, block: &MetadataBlock, output: &Path) -> Result<()>;
}

/// Fresh ffmetadata file beside `input`, deleted when the handle drops
fn sidecar_for(input: &Path) -> std::io::Result<NamedTempFile> {
    let dir = match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".chapterize-")
        .suffix(".ffmetadata")
        .tempfile_in(dir)
}

/// ffmpeg binary, either on PATH or at an explicit location
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[OsString]) -> std::io::Result<Output> {
        debug!(program = %self.program.display(), ?args, "running ffmpeg");
        Command::new(&self.program).args(args).output()
    }
}

impl Remuxer for Ffmpeg {
    fn extract(&self, input: &Path) -> Result<MetadataBlock> {
        let failed = |status: Option<i32>, stderr: String| Error::Extraction {
            path: input.to_path_buf(),
            status,
            stderr,
        };
        let sidecar = sidecar_for(input).map_err(|e| failed(None, e.to_string()))?;

        let output = self
            .run(&extract_args(input, sidecar.path()))
            .map_err(|e| failed(None, e.to_string()))?;

        if !output.status.success() {
            return Err(failed(
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let text = fs::read_to_string(sidecar.path()).map_err(|e| failed(None, e.to_string()))?;
        Ok(MetadataBlock::new(text))
    }

    fn commit(&self, input: &Path, block: &MetadataBlock, output: &Path) -> Result<()> {
        let failed = |status: Option<i32>, stderr: String| Error::Commit {
            output: output.to_path_buf(),
            status,
            stderr,
        };

        let mut sidecar = sidecar_for(input).map_err(|e| failed(None, e.to_string()))?;
        sidecar
            .write_all(block.as_str().as_bytes())
            .and_then(|_| sidecar.flush())
            .map_err(|e| failed(None, e.to_string()))?;

        let result = self
            .run(&commit_args(input, sidecar.path(), output))
            .map_err(|e| failed(None, e.to_string()))?;

        if !result.status.success() {
            return Err(failed(
                result.status.code(),
                String::from_utf8_lossy(&result.stderr).into_owned(),
            ));
        }

        Ok(())
    }
}

fn extract_args(input: &Path, sidecar: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.into());
    args.extend(["-f", "ffmetadata"].map(OsString::from));
    args.push(sidecar.into());
    args
}

/// Metadata and chapters come from the second input; streams are copied
fn commit_args(input: &Path, sidecar: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.into());
    args.push("-i".into());
    args.push(sidecar.into());
    args.extend(
        ["-map_metadata", "1", "-map_chapters", "1", "-codec", "copy"].map(OsString::from),
    );
    args.push(output.into());
    args
}
