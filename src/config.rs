//! Configuration for yfind
//!
//! [`FilterOptions`] holds the raw, human-entered values. [`FilterConfig::new`]
//! validates them once and yields the immutable thresholds shared by every
//! worker.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::{ConfigError, ScanError};

/// Default capacity of the result channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;

/// Prefix of environment variables layered over the config file
pub const ENV_PREFIX: &str = "YFIND_";

/// Config file looked up in the home directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = ".yfind.toml";

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Parse a size threshold such as `10k`, `2M` or `3g`
///
/// The unit is mandatory and case-insensitive. Leading and trailing
/// whitespace is ignored.
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let trimmed = input.trim();
    let Some((split, unit)) = trimmed.char_indices().last() else {
        return Err(ConfigError::InvalidSize {
            input: input.to_string(),
            reason: "empty value".to_string(),
        });
    };

    let multiplier = match unit.to_ascii_lowercase() {
        'k' => KIB,
        'm' => MIB,
        'g' => GIB,
        _ => {
            return Err(ConfigError::InvalidSizeUnit {
                input: input.to_string(),
            })
        }
    };

    let number: u64 = trimmed[..split]
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidSize {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

    number
        .checked_mul(multiplier)
        .ok_or_else(|| ConfigError::SizeOverflow {
            input: input.to_string(),
        })
}

/// Parse a comma-separated extension list such as `go, txt`
///
/// Returns `None` when no extension survives normalization, which disables
/// the extension filter.
pub fn parse_extensions(input: &str) -> Option<BTreeSet<String>> {
    let extensions: BTreeSet<String> = input
        .split(',')
        .map(|ext| ext.replace(' ', ""))
        .filter(|ext| !ext.is_empty())
        .collect();

    if extensions.is_empty() {
        None
    } else {
        Some(extensions)
    }
}

/// Raw filter values as supplied by the command line or a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Lower size bound, e.g. `1k`
    pub size_greater: String,
    /// Upper size bound, e.g. `2m`
    pub size_less: String,
    /// Comma-separated extension list
    pub extensions: String,
    /// Literal substring matched against the full path
    pub name: String,
    /// Literal substring matched against each line of the file
    pub content: String,
    /// Requested case sensitivity (currently always literal)
    pub case_sensitive: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            size_greater: String::new(),
            size_less: String::new(),
            extensions: String::new(),
            name: String::new(),
            content: String::new(),
            case_sensitive: true,
        }
    }
}

/// Validated, immutable filter thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterConfig {
    /// Inclusive lower size bound in bytes
    pub size_greater: Option<u64>,
    /// Inclusive upper size bound in bytes
    pub size_less: Option<u64>,
    /// Allowed extensions (suffix after the last dot)
    pub extensions: Option<BTreeSet<String>>,
    /// Substring the full path must contain
    pub name_substring: Option<String>,
    /// Substring at least one line must contain
    pub content_substring: Option<String>,
    /// Requested case sensitivity; matching is literal regardless
    pub case_sensitive: bool,
}

impl FilterConfig {
    /// Validate raw options into a filter configuration
    pub fn new(options: &FilterOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            size_greater: parse_bound(&options.size_greater)?,
            size_less: parse_bound(&options.size_less)?,
            extensions: parse_extensions(&options.extensions),
            name_substring: non_empty(&options.name),
            content_substring: non_empty(&options.content),
            case_sensitive: options.case_sensitive,
        })
    }

    /// Configuration with every filter disabled
    pub fn match_all() -> Self {
        Self {
            size_greater: None,
            size_less: None,
            extensions: None,
            name_substring: None,
            content_substring: None,
            case_sensitive: true,
        }
    }

    /// Whether the content filter is active
    pub fn filters_content(&self) -> bool {
        self.content_substring.is_some()
    }
}

// A zero threshold disables the bound
fn parse_bound(input: &str) -> Result<Option<u64>, ConfigError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    parse_size(input).map(|bytes| Some(bytes).filter(|&b| b > 0))
}

fn non_empty(input: &str) -> Option<String> {
    if input.is_empty() {
        None
    } else {
        Some(input.to_string())
    }
}

/// Configuration for a single scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory; the current directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Raw filter values
    pub filter: FilterOptions,

    /// Number of worker threads
    /// 0 means auto-detect (available parallelism × 2)
    pub num_threads: usize,

    /// Capacity of the bounded result channel
    pub channel_capacity: usize,

    /// Emit JSON progress events on stderr
    pub show_progress: bool,

    /// Render results as JSON lines
    pub json: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: None,
            filter: FilterOptions::default(),
            num_threads: 0,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            show_progress: false,
            json: false,
        }
    }
}

impl ScanConfig {
    /// Create a config builder
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::new()
    }

    /// Get the effective number of threads
    pub fn effective_threads(&self) -> usize {
        if self.num_threads == 0 {
            // Content scans are I/O bound: CPU cores × 2
            std::thread::available_parallelism()
                .map(|p| p.get() * 2)
                .unwrap_or(4)
        } else {
            self.num_threads
        }
    }

    /// Get the effective channel capacity (never zero)
    pub fn effective_channel_capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }

    /// Resolve the root, falling back to the current directory
    pub fn resolve_root(&self) -> Result<PathBuf, ScanError> {
        match &self.root {
            Some(root) if !root.as_os_str().is_empty() => Ok(root.clone()),
            _ => std::env::current_dir().map_err(ScanError::from),
        }
    }
}

/// Builder for ScanConfig
#[derive(Debug, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root directory
    pub fn root(mut self, root: PathBuf) -> Self {
        self.config.root = Some(root);
        self
    }

    /// Set the raw filter values
    pub fn filter(mut self, filter: FilterOptions) -> Self {
        self.config.filter = filter;
        self
    }

    /// Set the number of threads
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Set the result channel capacity
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// Enable or disable progress events
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.config.show_progress = enabled;
        self
    }

    /// Enable or disable JSON output
    pub fn json(mut self, enabled: bool) -> Self {
        self.config.json = enabled;
        self
    }

    /// Build the config
    pub fn build(self) -> ScanConfig {
        self.config
    }
}

/// Filter values given explicitly on the command line
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_greater: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_less: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

/// Run values given explicitly on the command line
///
/// Unset fields leave the lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_progress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    pub filter: FilterOverrides,
}

/// Loads a [`ScanConfig`] from layered sources
///
/// Priority, lowest first: built-in defaults, the TOML config file,
/// `YFIND_*` environment variables (`__` separates nested keys, e.g.
/// `YFIND_FILTER__CONTENT`), then command line overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Read `config_path` when given, otherwise `~/.yfind.toml` if it exists
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    /// The config file that will be read, if any
    ///
    /// An explicitly requested file must exist.
    pub fn config_file(&self) -> Result<Option<PathBuf>, ConfigError> {
        match &self.config_path {
            Some(path) if path.is_file() => Ok(Some(path.clone())),
            Some(path) => Err(ConfigError::ConfigFileNotFound { path: path.clone() }),
            None => Ok(default_config_path().filter(|path| path.is_file())),
        }
    }

    /// Merge every layer into a run configuration
    pub fn load(&self, overrides: &ScanOverrides) -> Result<ScanConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(ScanConfig::default()));

        if let Some(path) = self.config_file()? {
            log::info!("using config file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides.clone()))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))
    }
}

/// `~/.yfind.toml`, when a home directory is known
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}
