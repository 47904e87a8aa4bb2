use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::{info, Level};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod shell;

use ridership_core::RidershipQueryService;
use shell::{Shell, ShellOptions};

#[derive(Debug, Parser)]
#[command(name = "ridership")]
#[command(about = "Interactive analysis of CTA L daily ridership")]
struct Args {
    #[arg(short = 'd', long = "database", default_value = "CTA2_L_daily_ridership.db")]
    database: PathBuf,

    /// Directory that receives chart files
    #[arg(long = "plot-dir", alias = "plot_dir", default_value = ".")]
    plot_dir: PathBuf,

    /// Background image for the nearby-stations map
    #[arg(long = "map-image", alias = "map_image")]
    map_image: Option<PathBuf>,

    /// Also write every report as JSON into this directory
    #[arg(long = "json-dir", alias = "json_dir")]
    json_dir: Option<PathBuf>,

    #[arg(short = 'p', long = "pretty")]
    pretty: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_max_level(log_level(args.verbose))
        .init();

    if let Some(dir) = args.json_dir.as_ref() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create json directory {}", dir.display()))?;
    }
    std::fs::create_dir_all(&args.plot_dir)
        .with_context(|| format!("create plot directory {}", args.plot_dir.display()))?;

    let service = RidershipQueryService::open(&args.database)
        .with_context(|| format!("open ridership database {}", args.database.display()))?;
    info!("Using ridership database {}", args.database.display());

    // Chart files live in the plot directory, so the map image is referenced absolutely.
    let map_image = args.map_image.as_ref().map(|path| {
        std::fs::canonicalize(path)
            .unwrap_or_else(|_| path.clone())
            .display()
            .to_string()
    });
    let options = ShellOptions {
        plot_dir: args.plot_dir,
        map_image,
        json_dir: args.json_dir,
        pretty: args.pretty,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    Shell::new(&service, options, stdin.lock(), stdout.lock()).run()
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
