use std::{
    path::{Path, PathBuf},
    process,
};

use castpos_core::settings::Settings;
use clap::{Parser, Subcommand};

mod allocate;
mod request;
mod serve;
mod surplus;

#[derive(Clone, Debug)]
pub struct Context {
    pub config_path: PathBuf,
    pub settings: Settings,
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Cast-POS - point-of-sale payment requests and treasury sweeps", long_about = None)]
struct Opts {
    /// Path to the castpos.yaml settings file (default: ./castpos.yaml)
    #[arg(long = "config", short = 'c', global = true, default_value = "./castpos.yaml")]
    config_path: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Build a payment request for an amount
    Request(request::RequestCommand),
    /// Compute the surplus above the operating target
    Surplus(surplus::SurplusCommand),
    /// Run one allocation attempt against a sandbox wallet
    Allocate(allocate::AllocateCommand),
    /// Serve the app discovery manifest
    Serve(serve::ServeCommand),
}

#[tokio::main]
async fn main() {
    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            process::exit(e.exit_code());
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_dir = opts
        .config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    // .env must be loaded before the settings read CASTPOS_* variables
    load_env_file(&config_dir);

    let settings = match Settings::load(&opts.config_path) {
        Ok(settings) => {
            tracing::debug!(
                "Settings loaded for chain {} from {}",
                settings.chain_id,
                opts.config_path.display()
            );
            settings
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let ctx = Context {
        config_path: opts.config_path.clone(),
        settings,
    };

    if let Err(e) = handle_command(opts, &ctx).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Load environment variables from the .env file next to the settings file
fn load_env_file(config_dir: &Path) {
    let env_file_path = config_dir.join(".env");

    match dotenvy::from_path(&env_file_path) {
        Ok(_) => {
            eprintln!("✓ Loaded environment from {}", env_file_path.display());
        }
        Err(e) if e.not_found() => {}
        Err(e) => {
            eprintln!(
                "Warning: Failed to load .env file at {}: {}",
                env_file_path.display(),
                e
            );
        }
    }
}

async fn handle_command(opts: Opts, ctx: &Context) -> Result<(), String> {
    match opts.command {
        Command::Request(cmd) => cmd.execute(ctx).await,
        Command::Surplus(cmd) => cmd.execute(ctx).await,
        Command::Allocate(cmd) => cmd.execute(ctx).await,
        Command::Serve(cmd) => cmd.execute(ctx).await,
    }
}
