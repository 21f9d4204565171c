//! Presenters for the command line

use serde::Serialize;
use std::io::{self, Write};

use crate::models::{ResultItem, ScanSummary};
use crate::sink::Presenter;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

const SEPARATOR: &str = "=======================================";

/// Human-readable size: bytes below 1K, otherwise two decimals
pub fn format_size(bytes: u64) -> String {
    let b = bytes as f64;
    if bytes < KB {
        format!("{}B", bytes)
    } else if bytes < MB {
        format!("{:.2}K", b / KB as f64)
    } else if bytes < GB {
        format!("{:.2}M", b / MB as f64)
    } else {
        format!("{:.2}G", b / GB as f64)
    }
}

/// Plain text output, one header line per file
pub struct TextPresenter<W: Write> {
    out: W,
    show_lines: bool,
}

impl<W: Write> TextPresenter<W> {
    /// `show_lines` prints matched lines and a separator after each file
    pub fn new(out: W, show_lines: bool) -> Self {
        Self { out, show_lines }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn present(&mut self, item: &ResultItem) -> io::Result<()> {
        writeln!(
            self.out,
            ">>> {} {}",
            format_size(item.file_size),
            item.file_name.display()
        )?;

        if self.show_lines {
            for line in &item.lines {
                writeln!(self.out, "{}: {}", line.line_number, line.content)?;
            }
            writeln!(self.out, "{}", SEPARATOR)?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn finish(&mut self, summary: &ScanSummary) -> io::Result<()> {
        writeln!(
            self.out,
            "Time Cost: {}ms ({} of {} files matched in {} dirs, {} errors)",
            summary.duration_ms,
            summary.files_matched,
            summary.files_visited,
            summary.dirs_visited,
            summary.error_count()
        )?;
        self.out.flush()
    }
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    #[serde(rename = "_t")]
    msg_type: &'static str,
    #[serde(flatten)]
    summary: &'a ScanSummary,
}

/// JSON lines output, one object per file and a final summary object
pub struct JsonPresenter<W: Write> {
    out: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, item: &ResultItem) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, item)?;
        writeln!(self.out)
    }

    fn finish(&mut self, summary: &ScanSummary) -> io::Result<()> {
        let line = SummaryLine {
            msg_type: "done",
            summary,
        };
        serde_json::to_writer(&mut self.out, &line)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
