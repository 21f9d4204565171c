//! Core data models for yfind

use serde::{Deserialize, Serialize, Serializer};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A directory-listing entry as seen by the filter pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// File name without path, as the OS returned it
    pub name: OsString,
    /// Directory containing the file
    pub parent: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

impl FileRecord {
    /// Create a record for a regular file
    pub fn file(parent: impl Into<PathBuf>, name: impl Into<OsString>, size: u64) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            size,
            is_dir: false,
        }
    }

    /// Full path of the entry (parent joined with name)
    pub fn full_path(&self) -> PathBuf {
        self.parent.join(&self.name)
    }

    /// Suffix after the last `.` of the name, or the whole name without one
    ///
    /// Works on the raw name bytes so names that are not valid UTF-8 still
    /// have an extension.
    pub fn extension(&self) -> &[u8] {
        let name = self.name.as_encoded_bytes();
        match name.iter().rposition(|&b| b == b'.') {
            Some(idx) => &name[idx + 1..],
            None => name,
        }
    }
}

/// A line of a file that contains the content substring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLine {
    /// 1-based line number
    #[serde(rename = "line")]
    pub line_number: u64,
    /// Raw line text without the trailing newline
    pub content: String,
    /// Always true for reported lines
    pub hit: bool,
}

impl MatchLine {
    /// Create a matched line
    pub fn hit(line_number: u64, content: impl Into<String>) -> Self {
        Self {
            line_number,
            content: content.into(),
            hit: true,
        }
    }
}

/// One file that passed every active filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Full path to the file
    #[serde(serialize_with = "lossy_path")]
    pub file_name: PathBuf,
    /// File size in bytes
    pub file_size: u64,
    /// Matched lines in ascending line order (content filter only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<MatchLine>,
}

impl ResultItem {
    /// Create a result without line excerpts
    pub fn new(file_name: PathBuf, file_size: u64) -> Self {
        Self {
            file_name,
            file_size,
            lines: Vec::new(),
        }
    }

    /// Attach matched lines
    pub fn with_lines(mut self, lines: Vec<MatchLine>) -> Self {
        self.lines = lines;
        self
    }

    /// Full path as a borrowed path
    pub fn path(&self) -> &Path {
        &self.file_name
    }
}

// Paths that are not valid UTF-8 are still reported
fn lossy_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// Totals for a finished scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Directories listed, including the root
    pub dirs_visited: u64,
    /// Regular files handed to the filter pipeline
    pub files_visited: u64,
    /// Files that passed every filter
    pub files_matched: u64,
    /// Matched lines across all results
    pub lines_matched: u64,
    /// Directories skipped because they could not be listed
    pub dir_errors: u64,
    /// Files skipped because they could not be read
    pub file_errors: u64,
    /// Total scan duration in milliseconds
    pub duration_ms: u64,
}

impl ScanSummary {
    /// Create a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of recoverable errors
    pub fn error_count(&self) -> u64 {
        self.dir_errors + self.file_errors
    }

    /// Check if the scan completed without errors
    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }
}
