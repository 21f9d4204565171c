//! Concurrent file finder with size, extension, name and content filters
//!
//! This library walks a directory tree on a bounded rayon pool, runs every
//! regular file through an ordered filter pipeline and streams the matches
//! over a bounded channel to a presenter.

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod sink;
pub mod walker;

pub use config::{
    parse_extensions, parse_size, ConfigLoader, FilterConfig, FilterOptions, FilterOverrides,
    ScanConfig, ScanOverrides,
};
pub use error::{ConfigError, Error, ScanError, ScanErrorKind};
pub use filter::{FilePredicate, FilterPipeline};
pub use models::{FileRecord, MatchLine, ResultItem, ScanSummary};
pub use output::{JsonPresenter, TextPresenter};
pub use progress::{DoneMessage, ErrorProgressMessage, ProgressReporter, StartMessage};
pub use scanner::scan;
pub use sink::{drain, Presenter};
pub use walker::{ResultStream, WalkOptions, Walker};
