// treesync CLI - sync municipal tree inventories into the tree database

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use treesync_cli::exit_codes::{
    sync_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_LOAD, EXIT_LOCKED, EXIT_STORE, EXIT_SUCCESS,
    EXIT_USAGE,
};
use treesync_cli::lock::{LockError, RunLock};
use treesync_cli::sync::{self, SyncPlan};
use treesync_config::{ConfigError, Settings};
use treesync_core::CoordinateOrder;
use treesync_io::loader::STRATEGY_KEYS;
use treesync_io::locations::{self, OSM_SOURCE};
use treesync_io::{LoadError, LoadingStrategy, SqliteStore};

#[derive(Parser)]
#[command(name = "treesync")]
#[command(about = "Load municipal tree inventories and reconcile them into the tree database")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/treesync/config.toml)
    #[arg(long, global = true, env = "TREESYNC_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database, overrides the config value
    #[arg(long, global = true, env = "TREESYNC_DATABASE")]
    database: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a source and apply its deletions, updates and insertions
    #[command(after_help = "\
Examples:
  treesync sync ls
  treesync sync ls --dry-run --json
  treesync sync sfm --strategy google-sheet --option https://example.org/pub?output=csv
  treesync sync demo --strategy test")]
    Sync {
        /// Source tag; trees are matched by (gmlid, source)
        source: String,

        /// Loading strategy instead of the configured one (magdeburg, google-sheet, spreadsheet, test)
        #[arg(long)]
        strategy: Option<String>,

        /// Strategy option (repeatable, in order)
        #[arg(long = "option", requires = "strategy")]
        options: Vec<String>,

        /// Coordinate order of the source data, overrides the config
        #[arg(long, value_enum)]
        coordinate_order: Option<CoordinateOrderArg>,

        /// Reconcile without touching the database (not even creating it)
        #[arg(long)]
        dry_run: bool,

        /// Print the full report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the full JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Remove a leftover run lock before starting
        #[arg(long)]
        break_lock: bool,
    },

    /// Split a botanical description into genus, species and variety
    #[command(after_help = "\
Examples:
  treesync classify 'Tilia cordata \"Greenspire\", Winter-Linde'")]
    Classify {
        /// Text such as `Acer platanoides, Spitz-Ahorn`
        text: String,
    },

    /// List configured sources
    Sources {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Distance from each OpenStreetMap tree node to the nearest stored tree
    #[command(after_help = "\
Examples:
  treesync check-locations --osm osm-trees.json --output candidates.json")]
    CheckLocations {
        /// Overpass JSON export of tree nodes
        #[arg(long)]
        osm: PathBuf,

        /// Write candidates to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CoordinateOrderArg {
    LatLng,
    Swapped,
}

impl From<CoordinateOrderArg> for CoordinateOrder {
    fn from(arg: CoordinateOrderArg) -> Self {
        match arg {
            CoordinateOrderArg::LatLng => CoordinateOrder::LatLng,
            CoordinateOrderArg::Swapped => CoordinateOrder::Swapped,
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("treesync=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Sync {
            source,
            strategy,
            options,
            coordinate_order,
            dry_run,
            json,
            output,
            break_lock,
        } => cmd_sync(
            cli.config.as_deref(),
            cli.database.as_deref(),
            SyncArgs {
                source,
                strategy,
                options,
                coordinate_order: coordinate_order.map(Into::into),
                dry_run,
                json,
                output,
                break_lock,
            },
        ),
        Commands::Classify { text } => cmd_classify(&text),
        Commands::Sources { json } => cmd_sources(cli.config.as_deref(), json),
        Commands::CheckLocations { osm, output } => {
            cmd_check_locations(cli.config.as_deref(), cli.database.as_deref(), &osm, output)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let code = match err {
            ConfigError::UnknownSource(_) => EXIT_USAGE,
            _ => EXIT_CONFIG,
        };
        Self::new(code, err.to_string())
    }
}

impl From<LockError> for CliError {
    fn from(err: LockError) -> Self {
        match &err {
            LockError::Held { holder, .. } => {
                let hint = match holder {
                    Some(h) => format!(
                        "held by pid {} since {}; if that run is gone, retry with --break-lock",
                        h.pid, h.started_at
                    ),
                    None => "if no other run is active, retry with --break-lock".to_string(),
                };
                Self::new(EXIT_LOCKED, err.to_string()).with_hint(hint)
            }
            LockError::Io { .. } => Self::io(err.to_string()),
        }
    }
}

fn open_store(database: &Path) -> Result<SqliteStore, CliError> {
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            CliError::new(EXIT_STORE, format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    SqliteStore::open(database).map_err(|e| {
        CliError::new(EXIT_STORE, format!("cannot open {}: {e}", database.display()))
    })
}

/// A dry run never creates the database: an existing file is opened
/// read-only, a missing one reads as an empty snapshot.
fn open_store_for_dry_run(database: &Path) -> Result<SqliteStore, CliError> {
    let store = if database.exists() {
        SqliteStore::open_read_only(database)
    } else {
        SqliteStore::open_in_memory()
    };
    store.map_err(|e| CliError::new(EXIT_STORE, format!("cannot open {}: {e}", database.display())))
}

fn write_json(value: &impl serde::Serialize, output: Option<&Path>, to_stdout: bool) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    if let Some(path) = output {
        std::fs::write(path, &json)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    if to_stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json}").map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// sync
// ============================================================================

struct SyncArgs {
    source: String,
    strategy: Option<String>,
    options: Vec<String>,
    coordinate_order: Option<CoordinateOrder>,
    dry_run: bool,
    json: bool,
    output: Option<PathBuf>,
    break_lock: bool,
}

fn resolve_plan(settings: &Settings, args: &SyncArgs) -> Result<SyncPlan, CliError> {
    let (strategy, configured_order) = match &args.strategy {
        Some(key) => (
            LoadingStrategy::from_parts(key, &args.options),
            settings.sources.get(&args.source).map(|c| c.coordinate_order),
        ),
        None => {
            let cfg = settings.source(&args.source).map_err(|e| {
                CliError::from(e).with_hint(format!(
                    "add [sources.{}] to the config or pass --strategy",
                    args.source
                ))
            })?;
            let strategy = LoadingStrategy::from_parts(&cfg.strategy, &cfg.options)
                .map(|s| match settings.base_dir() {
                    Some(base) => s.with_base_dir(base),
                    None => s,
                });
            (strategy, Some(cfg.coordinate_order))
        }
    };
    let strategy = strategy.map_err(|e| {
        let err = CliError::new(EXIT_USAGE, e.to_string());
        match e {
            LoadError::UnknownSource { kind: "strategy", .. } => {
                err.with_hint(format!("known strategies: {}", STRATEGY_KEYS.join(", ")))
            }
            _ => err,
        }
    })?;

    Ok(SyncPlan {
        source: args.source.clone(),
        strategy,
        coordinate_order: args
            .coordinate_order
            .or(configured_order)
            .unwrap_or_default(),
        dry_run: args.dry_run,
    })
}

fn cmd_sync(config: Option<&Path>, database: Option<&Path>, args: SyncArgs) -> Result<(), CliError> {
    let settings = Settings::load(config)?;
    let plan = resolve_plan(&settings, &args)?;
    let database = settings.database_path(database);

    let _lock = if plan.dry_run {
        None
    } else {
        Some(RunLock::acquire(&database, &plan.source, args.break_lock)?)
    };

    let mut store = if plan.dry_run {
        open_store_for_dry_run(&database)?
    } else {
        open_store(&database)?
    };
    let report = sync::run(&plan, &mut store).map_err(|e| {
        let code = sync_exit_code(&e);
        let err = CliError::new(code, e.to_string());
        if code == EXIT_LOAD {
            err.with_hint(format!("check the {} input", plan.strategy))
        } else {
            err
        }
    })?;

    if args.json || args.output.is_some() {
        write_json(&report, args.output.as_deref(), args.json)?;
    }

    if !report.warnings.is_empty() {
        eprintln!("{} trees without genus description", report.warnings.len());
    }
    if report.dry_run {
        eprintln!("dry run: nothing written");
    }
    for line in report.summary_lines() {
        eprintln!("{line}");
    }
    Ok(())
}

// ============================================================================
// classify
// ============================================================================

fn cmd_classify(text: &str) -> Result<(), CliError> {
    let classification = treesync_io::classify(Some(text));
    write_json(&classification, None, true)
}

// ============================================================================
// sources
// ============================================================================

fn cmd_sources(config: Option<&Path>, json: bool) -> Result<(), CliError> {
    let settings = Settings::load(config)?;

    if json {
        return write_json(&settings.sources, None, true);
    }

    if settings.sources.is_empty() {
        eprintln!("no sources configured ({})", Settings::default_path().display());
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for (tag, source) in &settings.sources {
        let order = match source.coordinate_order {
            CoordinateOrder::LatLng => "",
            CoordinateOrder::Swapped => "  (swapped coordinates)",
        };
        writeln!(handle, "{tag}\t{} {}{order}", source.strategy, source.options.join(" "))
            .map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// check-locations
// ============================================================================

fn cmd_check_locations(
    config: Option<&Path>,
    database: Option<&Path>,
    osm: &Path,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let settings = Settings::load(config)?;
    let database = settings.database_path(database);

    let nodes = locations::read_osm_nodes(osm).map_err(|e: LoadError| CliError::new(EXIT_LOAD, e.to_string()))?;
    let store = open_store(&database)?;
    let trees = store
        .read_all_except(OSM_SOURCE)
        .map_err(|e| CliError::new(EXIT_STORE, e.to_string()))?;

    eprintln!("checking {} OSM trees against {} stored trees", nodes.len(), trees.len());
    let candidates = locations::check_locations(&nodes, &trees);

    write_json(&candidates, output.as_deref(), output.is_none())
}
