//! Directory walker - concurrent traversal feeding the filter pipeline
//!
//! Every directory is listed by its own task on a bounded rayon pool. When
//! the content filter is active every file also gets its own task so that
//! I/O-bound scans overlap. All tasks live in a single `rayon::Scope`; once
//! the scope returns the traversal thread drops the last sender, which is
//! what ends the [`ResultStream`].

use crossbeam::channel::{self, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use walkdir::{DirEntry, WalkDir};

use crate::config::{ScanConfig, DEFAULT_CHANNEL_CAPACITY};
use crate::error::{ScanError, ScanErrorKind};
use crate::filter::FilterPipeline;
use crate::models::{FileRecord, ResultItem, ScanSummary};
use crate::progress::ProgressReporter;

/// Resource settings for a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Worker threads in the traversal pool (0 lets rayon decide)
    pub num_threads: usize,
    /// Capacity of the bounded result channel
    pub channel_capacity: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            num_threads: 0,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl From<&ScanConfig> for WalkOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            num_threads: config.effective_threads(),
            channel_capacity: config.effective_channel_capacity(),
        }
    }
}

/// Recursive, concurrent directory walker
pub struct Walker {
    pipeline: Arc<FilterPipeline>,
    options: WalkOptions,
    reporter: Arc<ProgressReporter>,
}

impl Walker {
    /// Create a walker that applies `pipeline` to every regular file
    pub fn new(pipeline: FilterPipeline, options: WalkOptions) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            options,
            reporter: Arc::new(ProgressReporter::disabled()),
        }
    }

    /// Report recoverable errors through `reporter`
    pub fn with_reporter(mut self, reporter: Arc<ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Start walking `root`
    ///
    /// Fails only when the root cannot be used at all. Everything below the
    /// root is best effort: unreadable directories and files are logged,
    /// counted and skipped.
    pub fn walk(&self, root: &Path) -> Result<ResultStream, ScanError> {
        let metadata =
            std::fs::metadata(root).map_err(|e| ScanError::from_io(root.to_path_buf(), &e))?;
        if !metadata.is_dir() {
            return Err(ScanError::not_a_directory(root.to_path_buf()));
        }
        let root = normalize_root(root);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.num_threads)
            .thread_name(|i| format!("yfind-worker-{}", i))
            .build()
            .map_err(|e| ScanError::new(ScanErrorKind::Unknown, None, e.to_string()))?;

        let (sender, receiver) = channel::bounded(self.options.channel_capacity.max(1));
        let state = WalkState::new(self.pipeline.clone(), sender, self.reporter.clone());

        log::info!(
            "walking {} with {} workers",
            root.display(),
            pool.current_num_threads()
        );

        let handle = std::thread::Builder::new()
            .name("yfind-walk".to_string())
            .spawn(move || {
                let start = Instant::now();
                pool.scope(|s| state.spawn_dir(s, root));
                debug_assert_eq!(state.outstanding.load(Ordering::SeqCst), 0);
                // Consuming the state drops the sender and closes the channel
                state.into_summary(start.elapsed().as_millis() as u64)
            })
            .map_err(ScanError::from)?;

        Ok(ResultStream { receiver, handle })
    }
}

/// Stream of results produced by a single walk
///
/// Iterating yields every passing file exactly once, in no particular order.
/// Iteration ends when the traversal has finished and the channel is drained.
pub struct ResultStream {
    receiver: Receiver<ResultItem>,
    handle: JoinHandle<ScanSummary>,
}

impl ResultStream {
    /// Wait for the traversal to finish and return its totals
    ///
    /// Undelivered results are discarded; pending workers see the closed
    /// channel and stop.
    pub fn finish(self) -> Result<ScanSummary, ScanError> {
        let ResultStream { receiver, handle } = self;
        drop(receiver);
        handle
            .join()
            .map_err(|_| ScanError::new(ScanErrorKind::Unknown, None, "traversal thread panicked"))
    }
}

impl Iterator for ResultStream {
    type Item = ResultItem;

    fn next(&mut self) -> Option<ResultItem> {
        self.receiver.recv().ok()
    }
}

/// Shared, read-mostly state of a running walk
struct WalkState {
    pipeline: Arc<FilterPipeline>,
    sender: Sender<ResultItem>,
    reporter: Arc<ProgressReporter>,
    /// Spawned tasks that have not finished yet
    outstanding: AtomicU64,
    /// Set once the receiver is gone
    cancelled: AtomicBool,
    dirs_visited: AtomicU64,
    files_visited: AtomicU64,
    files_matched: AtomicU64,
    lines_matched: AtomicU64,
    dir_errors: AtomicU64,
    file_errors: AtomicU64,
}

/// Decrements the outstanding-task counter when a task ends, even on panic
struct TaskDone<'a>(&'a AtomicU64);

impl Drop for TaskDone<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WalkState {
    fn new(
        pipeline: Arc<FilterPipeline>,
        sender: Sender<ResultItem>,
        reporter: Arc<ProgressReporter>,
    ) -> Self {
        Self {
            pipeline,
            sender,
            reporter,
            outstanding: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            dirs_visited: AtomicU64::new(0),
            files_visited: AtomicU64::new(0),
            files_matched: AtomicU64::new(0),
            lines_matched: AtomicU64::new(0),
            dir_errors: AtomicU64::new(0),
            file_errors: AtomicU64::new(0),
        }
    }

    fn spawn_dir<'s>(&'s self, scope: &rayon::Scope<'s>, dir: PathBuf) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        scope.spawn(move |s| {
            let _done = TaskDone(&self.outstanding);
            self.walk_dir(s, dir);
        });
    }

    fn spawn_file<'s>(&'s self, scope: &rayon::Scope<'s>, record: FileRecord) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        scope.spawn(move |_| {
            let _done = TaskDone(&self.outstanding);
            self.process_file(&record);
        });
    }

    fn walk_dir<'s>(&'s self, scope: &rayon::Scope<'s>, dir: PathBuf) {
        if self.cancelled.load(Ordering::Relaxed) {
            return;
        }
        self.dirs_visited.fetch_add(1, Ordering::Relaxed);
        log::debug!("listing {}", dir.display());

        let entries = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    // The directory itself could not be listed: skip the subtree
                    let err = ScanError::from(err);
                    log::warn!("skipping directory {}: {}", dir.display(), err.message);
                    self.dir_errors.fetch_add(1, Ordering::Relaxed);
                    self.reporter.report_error(&err);
                    return;
                }
                Err(err) => {
                    self.file_error(ScanError::from(err));
                    continue;
                }
            };

            let record = match file_record(&dir, &entry) {
                Ok(record) => record,
                Err(err) => {
                    self.file_error(err);
                    continue;
                }
            };

            if record.is_dir {
                self.spawn_dir(scope, entry.into_path());
            } else if !entry.file_type().is_file() {
                log::debug!("skipping special entry {}", entry.path().display());
            } else if self.pipeline.filters_content() {
                self.spawn_file(scope, record);
            } else {
                self.process_file(&record);
            }
        }
    }

    fn process_file(&self, record: &FileRecord) {
        if self.cancelled.load(Ordering::Relaxed) {
            return;
        }
        self.files_visited.fetch_add(1, Ordering::Relaxed);

        match self.pipeline.evaluate(record) {
            Ok(Some(item)) => self.publish(item),
            Ok(None) => {}
            Err(err) => self.file_error(err),
        }
    }

    fn publish(&self, item: ResultItem) {
        let lines = item.lines.len() as u64;
        if self.sender.send(item).is_err() {
            if !self.cancelled.swap(true, Ordering::Relaxed) {
                log::debug!("result receiver dropped, stopping traversal");
            }
            return;
        }
        self.files_matched.fetch_add(1, Ordering::Relaxed);
        self.lines_matched.fetch_add(lines, Ordering::Relaxed);
    }

    fn file_error(&self, err: ScanError) {
        log::warn!("skipping file {:?}: {}", err.path, err.message);
        self.file_errors.fetch_add(1, Ordering::Relaxed);
        self.reporter.report_error(&err);
    }

    fn into_summary(self, duration_ms: u64) -> ScanSummary {
        ScanSummary {
            dirs_visited: self.dirs_visited.into_inner(),
            files_visited: self.files_visited.into_inner(),
            files_matched: self.files_matched.into_inner(),
            lines_matched: self.lines_matched.into_inner(),
            dir_errors: self.dir_errors.into_inner(),
            file_errors: self.file_errors.into_inner(),
            duration_ms,
        }
    }
}

/// Build the pipeline's view of a listing entry
fn file_record(parent: &Path, entry: &DirEntry) -> Result<FileRecord, ScanError> {
    let metadata = entry.metadata().map_err(ScanError::from)?;

    Ok(FileRecord {
        name: entry.file_name().to_os_string(),
        parent: parent.to_path_buf(),
        size: metadata.len(),
        is_dir: metadata.is_dir(),
    })
}

/// Drop redundant and trailing separators so children join with exactly one
pub fn normalize_root(root: &Path) -> PathBuf {
    root.components().collect()
}
