//! `pickr`: pick the next file to read.
//!
//! ```text
//! pickr ~/Comics ~/Books --keywords batman
//! pickr --no-sequence --json
//! pickr reset ~/Comics/Saga
//! ```
//!
//! Folders and defaults come from the config file and `PICKR_*` environment
//! variables; flags given here win.

use clap::{ArgAction, Parser, Subcommand};
use pickr_cache::DirectoryCache;
use pickr_config::Settings;
use pickr_select::{Picker, Request, Selection};
use pickr_tracker::Tracker;
use std::fmt::Debug;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Pick the next file to read, continuing numbered series where possible")]
struct Opts {
    /// Folders to pick from; defaults to the configured ones.
    folders: Vec<PathBuf>,

    /// Skip file names starting with this prefix (comma-separated for several).
    #[arg(long)]
    exclude_prefix: Option<String>,

    /// Only pick files whose name contains a keyword.
    #[arg(long = "keywords", short = 'k')]
    keywords: Vec<String>,

    /// Require every keyword instead of any one of them.
    #[arg(long)]
    match_all: bool,

    /// Never pick files with this extension.
    #[arg(long = "ignore-ext")]
    ignored_extensions: Vec<String>,

    /// Always pick at random.
    #[arg(long)]
    no_sequence: bool,

    /// Return ZIP archives instead of a file from inside them.
    #[arg(long)]
    no_zip: bool,

    /// Walk the folders even if a cached listing is available.
    #[arg(long)]
    no_cache: bool,

    /// Config file (TOML, YAML or JSON).
    #[arg(long, env = "PICKR_CONFIG")]
    config: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete every cached folder listing.
    ClearCache,
    /// Show what the cache holds.
    CacheInfo,
    /// Forget which files have been read in a folder.
    Reset { folder: PathBuf },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn report(err: impl Debug) -> ExitCode {
    eprintln!("error: {err:?}");
    ExitCode::FAILURE
}

fn request(opts: &Opts, settings: Settings) -> Request {
    Request {
        folders: if opts.folders.is_empty() { settings.folders } else { opts.folders.clone() },
        exclude_prefix: opts.exclude_prefix.clone().unwrap_or(settings.exclude_prefix),
        ignore_folder_prefix: settings.ignore_folder_prefix,
        keywords: if opts.keywords.is_empty() { settings.keywords } else { opts.keywords.clone() },
        keywords_match_all: opts.match_all || settings.keywords_match_all,
        ignored_extensions: if opts.ignored_extensions.is_empty() {
            settings.ignored_extensions
        } else {
            opts.ignored_extensions.clone()
        },
        use_sequence: settings.use_sequence && !opts.no_sequence,
        process_zip: settings.process_zip && !opts.no_zip,
        use_cache: settings.use_cache && !opts.no_cache,
    }
}

fn pick(opts: &Opts, settings: Settings) -> ExitCode {
    let tracker = Tracker::open(settings.tracker_file());
    let cache = DirectoryCache::open(settings.cache_dir());
    let request = request(opts, settings);
    if request.folders.is_empty() {
        eprintln!("no folders given and none configured");
        return ExitCode::FAILURE;
    }

    let mut picker = Picker::new(tracker, Some(cache));
    let (picked, info) = match picker.select(&request) {
        Ok(Selection::Found { picked, info }) => (picked, info),
        Ok(Selection::NotFound(not_found)) => {
            eprintln!("{not_found}");
            return ExitCode::FAILURE;
        },
        Err(err) => return report(err),
    };

    if opts.json {
        let output = serde_json::json!({ "picked": picked, "info": info });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(err) => return report(err),
        }
        return ExitCode::SUCCESS;
    }
    println!("{}", picked.file_path.display());
    if let Some(zip) = &picked.zip_path {
        eprintln!("from archive: {}", zip.display());
    }
    match &info.sequence_info {
        Some(sequence) => eprintln!(
            "{}: {} #{} of {} ({})",
            info.method, sequence.collection, sequence.file_number, sequence.total_files, sequence.scheme
        ),
        None => eprintln!("{}: one of {} files", info.method, info.total_files_found),
    }
    if info.skipped > 0 {
        eprintln!("{} entries could not be read", info.skipped);
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    init_tracing(opts.verbose);

    let settings = match Settings::load(opts.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => return report(err),
    };

    match &opts.command {
        None => pick(&opts, settings),
        Some(Command::ClearCache) => match DirectoryCache::open(settings.cache_dir()).clear() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => report(err),
        },
        Some(Command::CacheInfo) => {
            let info = DirectoryCache::open(settings.cache_dir()).info();
            if opts.json {
                return match serde_json::to_string_pretty(&info) {
                    Ok(json) => {
                        println!("{json}");
                        ExitCode::SUCCESS
                    },
                    Err(err) => report(err),
                };
            }
            println!("directory: {}", info.directory.display());
            println!("folders:   {}", info.folder_count);
            println!("files:     {}", info.file_count);
            println!("size:      {} bytes", info.size_bytes);
            println!("index:     {} tokens", info.indexed_tokens);
            for folder in &info.folders {
                println!("  {} ({} files, cached {})", folder.folder.display(), folder.files, folder.created_at);
            }
            ExitCode::SUCCESS
        },
        Some(Command::Reset { folder }) => {
            let folder = std::fs::canonicalize(folder).unwrap_or_else(|_| folder.clone());
            match Tracker::open(settings.tracker_file()).reset_folder(&folder) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => report(err),
            }
        },
    }
}
