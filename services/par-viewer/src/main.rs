//! PAR Viewer
//!
//! Command-line front end for phased-array radar scans. Reports go to stdout
//! as JSON; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use radar_common::Product;
use serde::Serialize;
use slice_engine::{SliceEngine, ViewKind};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use volume_loader::VolumeLoader;

use par_viewer::commands::{self, SliceReport, SliceRequest};
use par_viewer::config::ViewerConfig;
use par_viewer::session::{Session, SessionOptions};

/// PAR Viewer
#[derive(Parser, Debug)]
#[command(name = "par-viewer")]
#[command(about = "Browse, slice and play back phased-array radar scans")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "PAR_VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "json", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(clap::Args, Debug)]
struct SliceArgs {
    /// Volume file
    file: PathBuf,

    /// View type (ppi or rhi)
    #[arg(long, default_value = "ppi")]
    view: ViewKind,

    /// Product code (Z, V, W, D, P, R) or name
    #[arg(long, default_value = "Z")]
    product: Product,

    /// Sweep index
    #[arg(long, default_value_t = 0)]
    elevation: usize,

    /// Radial index
    #[arg(long, default_value_t = 0)]
    azimuth: usize,
}

impl SliceArgs {
    fn request(&self) -> SliceRequest {
        SliceRequest {
            kind: self.view,
            product: self.product,
            elevation: self.elevation,
            azimuth: self.azimuth,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List scan folders and their indexed files
    Scans {
        /// Directory holding the scan folders
        base: PathBuf,
    },

    /// Print a volume's metadata and dimensions
    Inspect { file: PathBuf },

    /// Extract one slice and print its geometry and summary
    Slice {
        #[command(flatten)]
        slice: SliceArgs,

        /// Also write the full slice as JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the sample under a range and angle
    Query {
        #[command(flatten)]
        slice: SliceArgs,

        #[arg(long)]
        range_km: f64,

        /// Azimuth for PPI, elevation for RHI
        #[arg(long, allow_hyphen_values = true)]
        angle_deg: f64,
    },

    /// Play a scan's timeline, printing one line per displayed volume
    Play {
        /// Directory holding the scan folders
        #[arg(required_unless_present = "scanset")]
        base: Option<PathBuf>,

        /// Play from a saved scan set instead of discovering folders
        #[arg(long, conflicts_with = "base")]
        scanset: Option<PathBuf>,

        /// Scan name (or position within a scan set); defaults to the first
        #[arg(long)]
        scan: Option<String>,

        /// Stop after this many loads
        #[arg(long)]
        frames: Option<usize>,

        /// Tick interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Views to render
        #[arg(long, value_delimiter = ',', default_value = "ppi,rhi")]
        views: Vec<ViewKind>,

        #[arg(long, default_value = "Z")]
        product: Product,

        #[arg(long, default_value_t = 0)]
        elevation: usize,

        #[arg(long, default_value_t = 0)]
        azimuth: usize,

        /// Parser threads
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Build and edit scan set files
    Scanset {
        #[command(subcommand)]
        command: ScanSetCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ScanSetCommand {
    /// Create a scan set from the scan folders under a directory
    Create {
        /// Output JSON file
        out: PathBuf,

        #[arg(long)]
        name: String,

        #[arg(long)]
        base: PathBuf,
    },

    /// Print a scan set with its indexed files
    Show { file: PathBuf },

    /// Add files to a scan, creating the scan if needed
    AddFiles {
        file: PathBuf,

        /// Scan name or position
        #[arg(long)]
        scan: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    let config = ViewerConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Scans { base } => print_json(&commands::scans(&base, &config.discovery)?),
        Command::Inspect { file } => print_json(&commands::inspect(&file)?),
        Command::Slice { slice, out } => {
            let extracted = commands::slice(&slice.file, &slice.request(), config.color_scales()?)?;
            if let Some(out) = out {
                commands::dump_slice(&extracted, &out)?;
            }
            print_json(&SliceReport::from(&extracted))
        }
        Command::Query {
            slice,
            range_km,
            angle_deg,
        } => {
            let point = commands::query(
                &slice.file,
                &slice.request(),
                config.color_scales()?,
                range_km,
                angle_deg,
            )?;
            if point.is_none() {
                info!(range_km, angle_deg, "No sample at this point");
            }
            print_json(&point)
        }
        Command::Play {
            base,
            scanset,
            scan,
            frames,
            interval_ms,
            views,
            product,
            elevation,
            azimuth,
            workers,
        } => {
            let mut config = config;
            if let Some(interval_ms) = interval_ms {
                config.playback.tick_interval_ms = interval_ms;
            }
            if let Some(workers) = workers {
                config.loader.workers = workers;
            }
            config.validate()?;

            let index = match (&scanset, &base) {
                (Some(path), _) => commands::scanset_index(path, scan.as_deref())?,
                (None, Some(base)) => {
                    commands::discovered_index(base, scan.as_deref(), &config.discovery)?
                }
                (None, None) => anyhow::bail!("Either a base directory or --scanset is required"),
            };
            if !index.excluded().is_empty() {
                warn!(count = index.excluded().len(), "Files without a timestamp were skipped");
            }

            let options = SessionOptions {
                views: views.into_iter().map(|kind| (kind, product)).collect(),
                elevation,
                azimuth,
                frames,
            };
            play(config, index, options)
        }
        Command::Scanset { command } => match command {
            ScanSetCommand::Create { out, name, base } => {
                let set = commands::create_scanset(&out, &name, &base, &config.discovery)?;
                print_json(&commands::describe_scanset(&set)?)
            }
            ScanSetCommand::Show { file } => {
                let set = commands::load_scanset(&file)?;
                info!(name = set.name(), base = %set.base_dir().display(), "Loaded scan set");
                print_json(&commands::describe_scanset(&set)?)
            }
            ScanSetCommand::AddFiles { file, scan, files } => {
                let set = commands::add_files_to_scanset(&file, &scan, &files)?;
                print_json(&commands::describe_scanset(&set)?)
            }
        },
    }
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    match args.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn play(config: ViewerConfig, index: scan_index::ScanIndex, options: SessionOptions) -> Result<()> {
    let scales = Arc::new(config.color_scales()?);
    let loader = VolumeLoader::new(&config.loader).context("Failed to start loader pool")?;
    let engine = SliceEngine::new(scales);
    let mut session = Session::new(loader, engine, config.playback.clone(), options);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let report = runtime.block_on(session.run(index, |frame| {
        println!("{}", serde_json::to_string(frame)?);
        Ok(())
    }))?;

    info!(
        frames = report.frames_rendered,
        failures = report.load_failures,
        "Session complete"
    );
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
