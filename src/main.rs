//! yfind CLI
//!
//! Concurrent file finder with size, extension, name and content filters.

use clap::{ArgAction, Parser};
use env_logger::Env;
use log::info;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use yfind::{ConfigLoader, Error, FilterOverrides, JsonPresenter, ScanOverrides, TextPresenter};

const ABOUT: &str = r#"
yfind - find files by size, type, name and content

Examples:
  yfind --path ./src --type rs,toml              Rust sources and manifests
  yfind --path /var/log --size-greater 10m       Files of at least 10 MiB
  yfind --name test/ --content TODO              TODO lines under test dirs
  yfind --content main --json                    JSON lines output
"#;

/// Concurrent file finder
#[derive(Parser)]
#[command(name = "yfind")]
#[command(author, version, about = ABOUT, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.yfind.toml when present)
    #[arg(long, help = "config file (default is $HOME/.yfind.toml)")]
    config: Option<PathBuf>,

    /// Root directory (defaults to the current directory)
    #[arg(long, help = "root path")]
    path: Option<PathBuf>,

    /// Lower size bound, inclusive
    #[arg(long = "size-greater", help = "limit file size greater: 1k|2m|3g")]
    size_greater: Option<String>,

    /// Upper size bound, inclusive
    #[arg(long = "size-less", help = "limit file size less: 1k|2m|3g")]
    size_less: Option<String>,

    /// Allowed extensions
    #[arg(long = "type", help = "limit file type: txt,go")]
    file_type: Option<String>,

    /// Substring of the full path
    #[arg(long, help = "search file name")]
    name: Option<String>,

    /// Substring of a line
    #[arg(long, help = "search file content")]
    content: Option<String>,

    /// Case sensitivity (matching is currently always literal)
    #[arg(
        long = "no-cc",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        help = "case sensitive [default: true]"
    )]
    case_sensitive: Option<bool>,

    /// Worker threads (0 = auto)
    #[arg(short = 't', long, help = "worker threads, 0 for auto-detect")]
    threads: Option<usize>,

    /// Emit JSON lines instead of text
    #[arg(long, help = "output results as JSON lines")]
    json: bool,

    /// Emit JSON progress events on stderr
    #[arg(long, help = "write progress events to stderr")]
    progress: bool,
}

impl Cli {
    /// Only flags that were actually given override the lower layers
    fn overrides(&self) -> ScanOverrides {
        ScanOverrides {
            root: self.path.clone(),
            num_threads: self.threads,
            show_progress: self.progress.then_some(true),
            json: self.json.then_some(true),
            filter: FilterOverrides {
                size_greater: self.size_greater.clone(),
                size_less: self.size_less.clone(),
                extensions: self.file_type.clone(),
                name: self.name.clone(),
                content: self.content.clone(),
                case_sensitive: self.case_sensitive,
            },
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match ConfigLoader::new(cli.config.clone()).load(&cli.overrides()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("yfind: {}", Error::from(err));
            return ExitCode::from(2);
        }
    };

    info!("Config: {:?}", config);

    let out = BufWriter::new(io::stdout().lock());
    let result = if config.json {
        yfind::scan(&config, &mut JsonPresenter::new(out))
    } else {
        let show_lines = !config.filter.content.is_empty();
        yfind::scan(&config, &mut TextPresenter::new(out, show_lines))
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err @ Error::Config(_)) => {
            eprintln!("yfind: {}", err);
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("yfind: {}", err);
            ExitCode::FAILURE
        }
    }
}
