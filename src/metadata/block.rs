//! In-memory ffmetadata document
//!
//! The format is a `;FFMETADATA1` header, global `key=value` lines, then
//! zero or more `[SECTION]` blocks. `=`, `;`, `#`, `\` and newline inside
//! keys and values are escaped with a backslash.

use crate::markers::ChapterMarker;
use std::collections::BTreeMap;
use std::fmt;

const CHAPTER_HEADER: &str = "[CHAPTER]";

/// A file's container-level metadata as dumped by ffmpeg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlock {
    text: String,
}

impl MetadataBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Key/value pairs preceding the first section header, unescaped
    pub fn global_attributes(&self) -> BTreeMap<String, String> {
        let mut attributes = BTreeMap::new();

        for line in logical_lines(&self.text) {
            if line.starts_with('[') {
                break;
            }
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = split_entry(line) {
                attributes.insert(unescape(key), unescape(value));
            }
        }

        attributes
    }

    /// Global attribute by key, ignoring empty values
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.global_attributes()
            .remove(key)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn has_chapters(&self) -> bool {
        self.chapter_offset().is_some()
    }

    /// Keep only the content before the first `[CHAPTER]` section
    pub fn truncate_chapters(mut self) -> Self {
        if let Some(offset) = self.chapter_offset() {
            self.text.truncate(offset);
        }
        self
    }

    /// Append markers as chapter sections after any existing content
    pub fn append(mut self, markers: &[ChapterMarker]) -> Self {
        for marker in markers {
            self.text.push_str("\n[CHAPTER]\nTIMEBASE=1/1000\n");
            self.text.push_str(&format!("START={}\n", marker.start_ms));
            self.text.push_str(&format!("END={}\n", marker.end_ms));
            self.text.push_str(&format!("title={}\n", escape(&marker.title)));
        }
        self
    }

    /// Byte offset of the first line that opens a chapter section
    fn chapter_offset(&self) -> Option<usize> {
        let mut line_start = true;
        let mut escaped = false;

        for (i, c) in self.text.char_indices() {
            if line_start && self.text[i..].starts_with(CHAPTER_HEADER) {
                return Some(i);
            }
            line_start = c == '\n' && !escaped;
            escaped = c == '\\' && !escaped;
        }

        None
    }
}

impl fmt::Display for MetadataBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Split text into lines, joining lines whose newline is escaped
fn logical_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if c == '\n' && !escaped {
            lines.push(text[start..i].trim_end_matches('\r'));
            start = i + 1;
        }
        escaped = c == '\\' && !escaped;
    }
    if start < text.len() {
        lines.push(text[start..].trim_end_matches('\r'));
    }

    lines
}

/// Split at the first unescaped `=`
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if c == '=' && !escaped {
            return Some((&line[..i], &line[i + 1..]));
        }
        escaped = c == '\\' && !escaped;
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '=' | ';' | '#' | '\\' | '\n') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
