//! mugshot-origin CLI: fingerprint, train, classify, saliency and stego tools.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mugshot_origin::Config;

mod commands;

#[derive(Parser)]
#[command(name = "mugshot-origin")]
#[command(author, version, about = "Identify which jurisdiction a booking photo came from", long_about = None)]
struct Cli {
    /// JSON configuration file; command-line flags override its values
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug events (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or score colour fingerprints
    Fingerprint {
        #[command(subcommand)]
        action: FingerprintAction,
    },

    /// Train the classifier on a directory-per-class image root
    Train {
        /// Root with one subdirectory of images per class
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Model artifact to write (.json for JSON, anything else for binary)
        #[arg(short, long, value_name = "MODEL")]
        output: PathBuf,

        #[arg(long)]
        epochs: Option<usize>,

        #[arg(long)]
        batch_size: Option<usize>,

        #[arg(long)]
        learning_rate: Option<f64>,

        /// Fix weight init, shuffling and augmentation
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Classify one image or every image in a folder
    Classify {
        /// Image file or folder of images
        #[arg(value_name = "PATH")]
        path: PathBuf,

        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,

        /// Minimum top probability in [0, 1]
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Write gradient saliency overlays for a class
    Saliency {
        /// Image file or folder of images
        #[arg(value_name = "PATH")]
        path: PathBuf,

        #[arg(short, long, value_name = "MODEL")]
        model: PathBuf,

        /// Class label to explain
        #[arg(long = "class", value_name = "LABEL")]
        class: String,

        /// Where overlays go (defaults to saliency_maps/<LABEL>)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Hide or recover a message in image LSBs
    Stego {
        #[command(subcommand)]
        action: StegoAction,
    },
}

#[derive(Subcommand)]
enum FingerprintAction {
    /// Build a fingerprint from a folder of reference images
    Build {
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,

        #[arg(long)]
        top_percentage: Option<f64>,
    },

    /// Score every image in a folder against a fingerprint
    Score {
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,

        /// Fingerprint file (defaults to <FOLDER>/location_fingerprint.json)
        #[arg(short, long, value_name = "FILE")]
        fingerprint: Option<PathBuf>,

        #[arg(long)]
        top_percentage: Option<f64>,
    },
}

#[derive(Subcommand)]
enum StegoAction {
    /// Embed a message and write a lossless image
    Encode {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[arg(short, long)]
        message: String,
    },

    /// Print the message hidden in an image
    Decode {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_json(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Fingerprint { action } => match action {
            FingerprintAction::Build { folder, top_percentage } => {
                commands::fingerprint::build(config, folder, top_percentage)
            }
            FingerprintAction::Score { folder, fingerprint, top_percentage } => {
                commands::fingerprint::score(config, folder, fingerprint, top_percentage)
            }
        },
        Commands::Train { root, output, epochs, batch_size, learning_rate, seed } => {
            let overrides = commands::train::Overrides { epochs, batch_size, learning_rate, seed };
            commands::train::execute(config, root, output, overrides)
        }
        Commands::Classify { path, model, threshold } => {
            commands::classify::execute(config, path, model, threshold)
        }
        Commands::Saliency { path, model, class, output_dir } => {
            commands::saliency::execute(config, path, model, class, output_dir)
        }
        Commands::Stego { action } => match action {
            StegoAction::Encode { input, output, message } => commands::stego::encode(input, output, message),
            StegoAction::Decode { input } => commands::stego::decode(input),
        },
    }
}
