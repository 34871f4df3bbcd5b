#![forbid(unsafe_code)]

mod config;
mod constants;
mod host;
mod ipc;
mod menu;
mod renderer;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use host::HostOptions;

#[derive(Parser, Debug)]
#[command(name = "duoshell", version, about = "Two-process desktop application shell")]
struct Cli {
    /// Run as the renderer process (spawned by the host)
    #[arg(long, requires = "socket")]
    renderer: bool,

    /// Host socket to connect to (renderer only)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Directory holding config.json (defaults to the per-user data dir)
    #[arg(long)]
    user_data_dir: Option<PathBuf>,

    /// Show the window even if the renderer never reports ready
    #[arg(long)]
    dev: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    if cli.renderer {
        let socket = cli.socket.context("--renderer requires --socket")?;
        renderer::run_renderer(&socket)?;
        return Ok(());
    }

    let options = HostOptions {
        user_data_path: cli
            .user_data_dir
            .unwrap_or_else(config::default_user_data_path),
        dev_mode: cli.dev || cfg!(debug_assertions),
    };
    info!(user_data_path = %options.user_data_path.display(), dev_mode = options.dev_mode, "Starting host");
    host::run_host(options)?;
    Ok(())
}
