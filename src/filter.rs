//! Filter pipeline - ordered predicates applied to every regular file
//!
//! Metadata predicates run first and short-circuit on failure. The content
//! scan is always last because it is the only step that opens the file.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::config::FilterConfig;
use crate::error::ScanError;
use crate::models::{FileRecord, MatchLine, ResultItem};

/// A pass/fail check over file metadata
pub trait FilePredicate: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether the file satisfies the predicate
    fn test(&self, file: &FileRecord) -> bool;
}

/// Passes files at least `threshold` bytes long
#[derive(Debug, Clone, Copy)]
pub struct SizeAtLeast {
    pub threshold: u64,
}

impl FilePredicate for SizeAtLeast {
    fn name(&self) -> &'static str {
        "size-greater"
    }

    fn test(&self, file: &FileRecord) -> bool {
        file.size >= self.threshold
    }
}

/// Passes files at most `threshold` bytes long
#[derive(Debug, Clone, Copy)]
pub struct SizeAtMost {
    pub threshold: u64,
}

impl FilePredicate for SizeAtMost {
    fn name(&self) -> &'static str {
        "size-less"
    }

    fn test(&self, file: &FileRecord) -> bool {
        file.size <= self.threshold
    }
}

/// Passes files whose suffix after the last dot is allowed
#[derive(Debug, Clone)]
pub struct ExtensionIn {
    pub allowed: std::collections::BTreeSet<String>,
}

impl FilePredicate for ExtensionIn {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn test(&self, file: &FileRecord) -> bool {
        std::str::from_utf8(file.extension()).is_ok_and(|ext| self.allowed.contains(ext))
    }
}

/// Passes files whose full path contains a literal substring
#[derive(Debug, Clone)]
pub struct PathContains {
    pub needle: String,
}

impl FilePredicate for PathContains {
    fn name(&self) -> &'static str {
        "name"
    }

    fn test(&self, file: &FileRecord) -> bool {
        let path = file.full_path();
        contains(path.as_os_str().as_encoded_bytes(), self.needle.as_bytes())
    }
}

/// The ordered filter chain
pub struct FilterPipeline {
    predicates: Vec<Box<dyn FilePredicate>>,
    content: Option<Vec<u8>>,
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.predicates.iter().map(|p| p.name()).collect();
        f.debug_struct("FilterPipeline")
            .field("predicates", &names)
            .field("content", &self.content.as_ref().map(|c| String::from_utf8_lossy(c)))
            .finish()
    }
}

impl FilterPipeline {
    /// Build the chain for a validated configuration
    ///
    /// Only active filters are registered, in the order size-greater,
    /// size-less, extension, name.
    pub fn new(config: &FilterConfig) -> Self {
        if !config.case_sensitive {
            log::warn!(
                "case-insensitive matching is not supported; \
                 name and content use literal comparison"
            );
        }

        let mut pipeline = Self {
            predicates: Vec::new(),
            content: config.content_substring.as_ref().map(|c| c.as_bytes().to_vec()),
        };

        if let Some(threshold) = config.size_greater.filter(|&t| t > 0) {
            pipeline.push(SizeAtLeast { threshold });
        }
        if let Some(threshold) = config.size_less.filter(|&t| t > 0) {
            pipeline.push(SizeAtMost { threshold });
        }
        if let Some(allowed) = &config.extensions {
            pipeline.push(ExtensionIn {
                allowed: allowed.clone(),
            });
        }
        if let Some(needle) = &config.name_substring {
            pipeline.push(PathContains {
                needle: needle.clone(),
            });
        }

        pipeline
    }

    fn push(&mut self, predicate: impl FilePredicate + 'static) {
        self.predicates.push(Box::new(predicate));
    }

    /// Names of the registered metadata predicates, in evaluation order
    pub fn predicate_names(&self) -> Vec<&'static str> {
        self.predicates.iter().map(|p| p.name()).collect()
    }

    /// Whether the terminal content scan is active
    pub fn filters_content(&self) -> bool {
        self.content.is_some()
    }

    /// Run the chain against a single file
    ///
    /// Returns `Ok(None)` when a filter rejects the file and `Err` when the
    /// content scan could not read it. Callers treat both as a non-match.
    pub fn evaluate(&self, file: &FileRecord) -> Result<Option<ResultItem>, ScanError> {
        if let Some(failed) = self.predicates.iter().find(|p| !p.test(file)) {
            log::trace!("{:?} rejected by {}", file.name, failed.name());
            return Ok(None);
        }

        let path = file.full_path();
        let Some(needle) = &self.content else {
            return Ok(Some(ResultItem::new(path, file.size)));
        };

        let lines = scan_file(&path, needle)?;
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(ResultItem::new(path, file.size).with_lines(lines)))
    }
}

/// Collect every line of a file that contains `needle`
pub fn scan_file(path: &Path, needle: &[u8]) -> Result<Vec<MatchLine>, ScanError> {
    let file = File::open(path).map_err(|e| ScanError::from_io(path.to_path_buf(), &e))?;
    scan_lines(BufReader::new(file), needle)
        .map_err(|e| ScanError::from_io(path.to_path_buf(), &e))
}

/// Collect every newline-delimited line of `reader` that contains `needle`
///
/// Lines have no length cap. A trailing `\n` or `\r\n` is stripped before
/// matching.
pub fn scan_lines<R: Read>(
    mut reader: BufReader<R>,
    needle: &[u8],
) -> std::io::Result<Vec<MatchLine>> {
    let mut matches = Vec::new();
    let mut buf = Vec::new();
    let mut line_number = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;

        let line = strip_line_ending(&buf);
        if contains(line, needle) {
            matches.push(MatchLine::hit(line_number, String::from_utf8_lossy(line)));
        }
    }

    Ok(matches)
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}
