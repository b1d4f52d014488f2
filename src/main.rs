use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use novelcharts::charts::ChartKind;
use novelcharts::config::Config;
use novelcharts::runtime;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "novelcharts")]
#[command(about = "Aggregate novel ranking data into JSON snapshots and ECharts pages", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON config file; every field is optional
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Input sheet (.xlsx, .xls, .ods, .csv or .json), overrides the config
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Worksheet name for workbook input
    #[arg(long, global = true)]
    sheet: Option<String>,

    /// Directory receiving the generated files
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// First-day reward share per primary category (pie)
    Reward,
    /// Listings vs average rank per secondary category (scatter)
    Scatter,
    /// Prolific authors compared on five averages (radar)
    Radar,
    /// Primary and secondary category shares (sunburst)
    Sunburst,
    /// Monthly first listings, last listings and intakes (lines)
    Trend,
    /// Primary categories ranked by month of first listing (timeline bars)
    Race,
    /// Most frequent words in book titles (word cloud)
    Words,
    /// Every chart above
    All,
}

impl Command {
    fn charts(self) -> Vec<ChartKind> {
        match self {
            Command::Reward => vec![ChartKind::Reward],
            Command::Scatter => vec![ChartKind::Scatter],
            Command::Radar => vec![ChartKind::Radar],
            Command::Sunburst => vec![ChartKind::Sunburst],
            Command::Trend => vec![ChartKind::Trend],
            Command::Race => vec![ChartKind::Race],
            Command::Words => vec![ChartKind::Words],
            Command::All => ChartKind::ALL.to_vec(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            // Diagnostics share stdout with the list of written files
            println!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(sheet) = args.sheet {
        config.sheet = sheet;
    }
    if let Some(out_dir) = args.out_dir {
        config.output_dir = out_dir;
    }

    let written = runtime::run(&args.command.charts(), &config)
        .context("Failed to generate charts")?;

    info!(files = written.len(), dir = %config.output_dir.display(), "Done");
    for path in &written {
        println!("{}", path.display());
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
