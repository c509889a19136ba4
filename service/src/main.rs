//! pano CLI: stitch two overlapping photographs into one panorama.

use clap::{Args, Parser, Subcommand};
use pano_service::{handle_stitch_with_timeout, ErrorBody, OutputFormat, ServiceConfig, StitchRequest};
use std::path::PathBuf;
use std::sync::Arc;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pano")]
#[command(about = "Stitch two overlapping images into a panorama")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stitch image1 onto image2 and write the panorama.
    Stitch(StitchArgs),

    /// Print the effective service configuration as JSON.
    Config {
        /// JSON config file; defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct StitchArgs {
    /// Image warped into the second image's frame.
    #[arg(long)]
    image1: PathBuf,

    /// Reference image, placed unwarped at the canvas origin.
    #[arg(long)]
    image2: PathBuf,

    /// Output path for the encoded panorama.
    #[arg(long)]
    out: PathBuf,

    /// JSON config file; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed RANSAC seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Skip luma histogram equalization.
    #[arg(long)]
    no_equalize: bool,

    /// Write PNG instead of JPEG.
    #[arg(long)]
    png: bool,
}

fn load_config(path: Option<&PathBuf>) -> CliResult<ServiceConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading config: {}", path.display());
            Ok(ServiceConfig::load(path)?)
        }
        None => Ok(ServiceConfig::default()),
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stitch(args) => run_stitch(&args).await,
        Commands::Config { config } => run_config(config.as_ref()),
    }
}

fn run_config(path: Option<&PathBuf>) -> CliResult<()> {
    let config = load_config(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn run_stitch(args: &StitchArgs) -> CliResult<()> {
    let mut config = load_config(args.config.as_ref())?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.no_equalize {
        config.equalize = false;
    }
    if args.png {
        config.output_format = OutputFormat::Png;
    }
    config.validate()?;

    tracing::info!("Loading images: {} + {}", args.image1.display(), args.image2.display());
    let image1 = std::fs::read(&args.image1)?;
    let image2 = std::fs::read(&args.image2)?;

    let response = handle_stitch_with_timeout(Arc::new(config), StitchRequest::post(image1, image2)).await;
    if !response.is_success() {
        let err: ErrorBody = serde_json::from_slice(&response.body)?;
        return Err(format!("stitch failed ({}): {}", err.code, err.message).into());
    }

    std::fs::write(&args.out, &response.body)?;
    tracing::info!("Panorama written to {}", args.out.display());
    Ok(())
}
