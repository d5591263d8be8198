//! Command-line driver: renders every world of a mapbash config into a web
//! tile set.

mod progress;
mod summary;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use mapbash_core::{
    ConfigError, FailurePolicy, GlobalConfig, Orchestrator, RenderInvocation, RunSettings,
    WorldSpec, resolve_all,
};
use tracing_subscriber::EnvFilter;

/// Config file looked up next to the executable when none is given.
const DEFAULT_CONFIG: &str = "config.json";

#[derive(Parser)]
#[command(
    name = "mapbash",
    about = "Render Minecraft worlds into web tile sets with cmapbash",
    version
)]
struct Cli {
    /// Configuration file (default: config.json next to the executable)
    config: Option<PathBuf>,

    /// Only render this world (repeatable)
    #[arg(short, long = "world", value_name = "NAME")]
    worlds: Vec<String>,

    /// Directory holding index.html, style.css and script.js
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Kill a renderer run after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Keep rendering other worlds after one fails
    #[arg(short, long)]
    keep_going: bool,

    /// Resolve the config and print the renderer commands without running them
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(report) = run(cli) {
        eprintln!("{report:?}");
        process::exit(1);
    }
}

/// Filter used when `RUST_LOG` is unset. Covers both the binary and the
/// core library targets.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,mapbash=debug,mapbash_core=debug"
    } else {
        "warn,mapbash=info,mapbash_core=info"
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> miette::Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    tracing::debug!(path = %config_path.display(), "loading config");
    let config = GlobalConfig::load(&config_path)?;
    let worlds = select_worlds(resolve_all(&config)?, &cli.worlds)?;

    let config_dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut settings = RunSettings::from_config(&config, config_dir);
    if let Some(dir) = cli.assets {
        settings = settings.with_asset_dir(dir);
    }
    if let Some(secs) = cli.timeout {
        settings = settings.with_timeout(Some(Duration::from_secs(secs)));
    }
    if cli.keep_going {
        settings = settings.with_policy(FailurePolicy::Continue);
    }

    if cli.dry_run {
        print_plan(&config, &worlds);
        return Ok(());
    }

    let orchestrator = Orchestrator::new(&config, settings);
    let mut console = progress::Console::default();
    let report = orchestrator.render_all(&worlds, &mut console);
    summary::print(&report);

    if report.is_success() {
        Ok(())
    } else {
        let failed = report.outcomes.len() - report.succeeded();
        Err(miette::miette!(
            "{failed} of {} world{} failed",
            worlds.len(),
            if worlds.len() == 1 { "" } else { "s" }
        ))
    }
}

fn default_config_path() -> miette::Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| miette::miette!("cannot locate the mapbash executable: {e}"))?;
    let dir = exe.parent().unwrap_or(Path::new("."));
    Ok(dir.join(DEFAULT_CONFIG))
}

/// Keep only the requested worlds, in config order. No filter keeps all.
fn select_worlds(worlds: Vec<WorldSpec>, wanted: &[String]) -> Result<Vec<WorldSpec>, ConfigError> {
    if wanted.is_empty() {
        return Ok(worlds);
    }
    if let Some(unknown) = wanted.iter().find(|w| !worlds.iter().any(|spec| &spec.name == *w)) {
        return Err(ConfigError::UnknownWorld(unknown.clone()));
    }
    Ok(worlds
        .into_iter()
        .filter(|spec| wanted.contains(&spec.name))
        .collect())
}

fn print_plan(config: &GlobalConfig, worlds: &[WorldSpec]) {
    for world in worlds {
        println!("World '{}'", world.name);
        println!("  tile size  {}", world.tile_size);
        println!("  world dir  {}", world.world_dir.display());
        println!("  www dir    {}", world.www_dir.display());
        for map_type in &world.map_types {
            let invocation = RenderInvocation::for_variant(config, world, map_type);
            println!("  {}: {}", map_type.name, invocation.command_line());
        }
        println!();
    }
}
