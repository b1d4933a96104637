//! Skiff CLI - Compose air-gap package definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod error;
mod exit_codes;

use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "skiff")]
#[command(author = "Skiff Contributors")]
#[command(version)]
#[command(about = "Compose air-gap package definitions from local and OCI skeleton components", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", env = "SKIFF_LOG_LEVEL")]
    log_level: String,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

/// Options shared by every command that loads a package
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Package directory or manifest file
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Flavor of components to select
    #[arg(short, long, default_value = "")]
    pub flavor: String,

    /// Target architecture (defaults to the package's, then the host's)
    #[arg(short = 'a', long = "arch")]
    pub architecture: Option<String>,

    /// Set package template values (KEY=value)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Skeleton cache directory
    #[arg(long, env = "SKIFF_CACHE_PATH")]
    pub cache_path: Option<PathBuf>,

    /// Skip version requirement checks of imported skeletons
    #[arg(long)]
    pub skip_version_check: bool,

    /// Talk to registries over plain HTTP
    #[arg(long)]
    pub plain_http: bool,

    /// Accept invalid registry certificates
    #[arg(long)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve all component imports and print the composed definition
    Compose {
        #[command(flatten)]
        load: LoadArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,

        /// Keep the scratch directory holding namespaced copies
        #[arg(long)]
        keep_scratch: bool,
    },

    /// Show a summary of the composed package
    Show {
        #[command(flatten)]
        load: LoadArgs,
    },
}

fn init_logging(level: &str, debug: bool) {
    let level = if debug { "debug" } else { level };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::internal(format!("failed to start runtime: {}", e)))?;

    match cli.command {
        Commands::Compose {
            load,
            output,
            keep_scratch,
        } => runtime.block_on(commands::compose::run(&load, output, keep_scratch)),

        Commands::Show { load } => runtime.block_on(commands::show::run(&load)),
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.debug);

    let code = match run(cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            code
        }
    };

    std::process::exit(code);
}
