mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use tuplestore_core::StoreBackendConfig;

/// Configuration file looked up in the root directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "tuplestore.toml";

/// Tuplestore: string-tuple keyed value store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Backend configuration file (JSON, YAML or TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory relative base directories are resolved against
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the value stored under a key
    Get {
        /// Key segments, in order
        #[arg(required = true)]
        segments: Vec<String>,
    },
    /// Store a value under a key
    Set {
        /// Key segments, in order
        #[arg(required = true)]
        segments: Vec<String>,
        /// Text to store
        #[arg(long)]
        value: String,
    },
    /// Print whether a key is stored
    Has {
        #[arg(required = true)]
        segments: Vec<String>,
    },
    /// Remove the value stored under a key
    Remove {
        #[arg(required = true)]
        segments: Vec<String>,
    },
    /// List every stored key, one per line
    List,
    /// Check that keys survive the trip through file paths
    Verify,
}

fn main() -> ExitCode {
    let _ = env_logger::try_init();

    let args = CliArgs::parse();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| args.root.join(DEFAULT_CONFIG_FILE));

    let result = StoreBackendConfig::load(&config_path)
        .and_then(|config| config.build(&args.root))
        .and_then(|mut backend| cli::run(args.command, backend.as_mut()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed with config {}: {}", config_path.display(), e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
