//! Error types shared by the catalog client, metadata engine and pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Client-credential exchange was rejected
    #[error("catalog authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    /// Catalog read call failed with a non-recoverable status
    #[error("catalog request failed ({status}): {body}")]
    Catalog { status: u16, body: String },

    #[error("catalog transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected catalog response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// ffmpeg could not dump the metadata of an input file
    #[error("Failed to extract metadata from {}: {}", path.display(), describe(*status, stderr))]
    Extraction {
        path: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    /// ffmpeg could not write the remuxed output
    #[error("Failed to write {}: {}", output.display(), describe(*status, stderr))]
    Commit {
        output: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error should abort the whole batch rather than one file
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }
}

fn describe(status: Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    match (status, stderr.is_empty()) {
        (Some(code), true) => format!("exit status {}", code),
        (Some(code), false) => format!("exit status {}: {}", code, stderr),
        (None, true) => "terminated without exit status".to_string(),
        (None, false) => stderr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_is_fatal() {
        let auth = Error::Auth {
            status: 400,
            body: "invalid_client".to_string(),
        };
        let catalog = Error::Catalog {
            status: 404,
            body: "not found".to_string(),
        };
        assert!(auth.is_fatal());
        assert!(!catalog.is_fatal());
    }

    #[test]
    fn test_extraction_message_includes_status_and_stderr() {
        let err = Error::Extraction {
            path: PathBuf::from("/books/a.m4b"),
            status: Some(1),
            stderr: "Invalid data found\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to extract metadata from /books/a.m4b: exit status 1: Invalid data found"
        );
    }

    #[test]
    fn test_commit_message_without_stderr() {
        let err = Error::Commit {
            output: PathBuf::from("out.m4b"),
            status: Some(69),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "Failed to write out.m4b: exit status 69");
    }
}
