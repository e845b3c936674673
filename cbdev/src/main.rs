use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cb_core::{BundleOptions, bundle, debundle};

#[derive(Parser)]
#[command(name = "cbundler", version, about = "Bundle or debundle content bundles", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle a directory
    #[command(alias = "b")]
    Bundle {
        /// The input directory to bundle
        #[arg(long, short)]
        input: PathBuf,

        /// The output bundle file name; suffix `.cb` is fixed
        #[arg(long, short, default_value = "output.cb")]
        output: PathBuf,

        /// The output metadata JSON file name; defaults to the bundle name
        /// with a `.json` suffix
        #[arg(long, short)]
        metadata: Option<PathBuf>,

        /// The history file name for incremental updates, relative to the
        /// input directory; suffix `.oldjson` is fixed
        #[arg(long = "old-metadata", default_value = "metadata")]
        old_metadata: String,

        /// The app version to record in metadata
        #[arg(long = "app-version")]
        app_version: Option<String>,

        /// The bundle version to record in metadata; derived from the
        /// previous one when omitted
        #[arg(long = "bundle-version")]
        bundle_version: Option<String>,

        /// The previous bundle version to diff against, overriding history
        #[arg(long = "previous-bundle-version")]
        previous_bundle_version: Option<String>,
    },

    /// Debundle a file with metadata
    #[command(alias = "d")]
    Debundle {
        /// The input bundle file to debundle
        #[arg(long, short)]
        input: PathBuf,

        /// The metadata JSON file to use
        #[arg(long, short)]
        metadata: PathBuf,

        /// The output directory; it must be empty or absent
        #[arg(long, short, default_value = "output")]
        output: PathBuf,
    },
}

fn run(command: Commands) -> cb_core::Result<()> {
    match command {
        Commands::Bundle {
            input,
            output,
            metadata,
            old_metadata,
            app_version,
            bundle_version,
            previous_bundle_version,
        } => {
            let opts = BundleOptions {
                app_version,
                bundle_version,
                previous_bundle_version,
            };
            bundle(&input, &output, metadata.as_deref(), &old_metadata, &opts)?;
            Ok(())
        }
        Commands::Debundle {
            input,
            metadata,
            output,
        } => {
            debundle(&input, &metadata, &output)?;
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            if verbose {
                debug!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
