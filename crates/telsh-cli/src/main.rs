//! telsh — TELNET/SSH client with automatic transcript logging.
//!
//! Opens an interactive session to a remote host and mirrors everything
//! the remote prints to a timestamped log file. Port 22 selects SSH
//! (with a credential prompt), any other port plain TELNET.

mod config;
mod prompt;
mod terminal;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{error, info};

use telsh_client::{bootstrap, session, TranscriptSink};
use telsh_core::{resolve_log_path, ConnectionInfo};

/// telsh — remote session client with automatic log saving
#[derive(Parser)]
#[command(
    name = "telsh",
    version = "0.1.0",
    about = "TELNET/SSH client that mirrors the session transcript to a timestamped log file"
)]
struct Cli {
    /// Destination hostname or IP address
    host: String,

    /// Destination port (22 selects SSH, anything else TELNET)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log output directory
    #[arg(short = 'l', long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// Do not write a log file (stdout mirroring still occurs)
    #[arg(short = 'd', long = "disable-log")]
    disable_log: bool,

    /// Config file path
    #[arg(long = "config")]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("telsh=debug,telsh_cli=debug,telsh_client=debug,telsh_core=debug")
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("telsh=warn,telsh_cli=warn")
            .with_target(false)
            .init();
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("telsh: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load config file. CLI flags override config values.
    let config_path = cli.config.clone().unwrap_or_else(|| {
        let home = dirs::home_dir().unwrap_or_default();
        home.join(".telsh")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    });
    let cfg = config::Config::load(&config_path).unwrap_or_default();

    let port = cli.port.unwrap_or(cfg.default.port);
    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.default.log_dir));

    let mut info = ConnectionInfo::new(cli.host.clone(), port);

    // Credentials are prompted only for SSH, in cooked mode, before any
    // connection attempt.
    if info.is_ssh() {
        let (username, password) = prompt::read_credentials()?;
        info.username = username;
        info.password = password;
    }

    // Establish the transport first: a failed connection must never leave
    // an empty log file behind.
    let (cols, rows) = terminal::get_terminal_size();
    let (mut stream, tuning) = bootstrap::establish(&info, cols, rows)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("failed to connect to {}:{}", info.host, info.port))?;

    let mut sink = if cli.disable_log {
        TranscriptSink::stdout_only()
    } else {
        let path = resolve_log_path(&info.host, &log_dir, Local::now())
            .with_context(|| format!("failed to prepare log directory {}", log_dir.display()))?;
        info!(path = %path.display(), "transcript log file");
        TranscriptSink::with_log_file(path.clone(), tuning.strip)
            .with_context(|| format!("failed to open log file {}", path.display()))?
    };

    // Raw mode for the duration of the session; the guard restores the
    // terminal on every exit path.
    let _guard = terminal::RawModeGuard::enter()?;

    let stop = Arc::new(AtomicBool::new(false));
    let (mut input, reader) = terminal::spawn_input_reader(stop.clone());

    let result = session::run_session(stream.as_mut(), &mut input, &mut sink, &tuning).await;

    // Wind down the keyboard thread; it checks the flag every poll interval.
    stop.store(true, Ordering::Relaxed);
    drop(input);
    let _ = reader.join();

    result.map_err(|e| anyhow::anyhow!("{e}"))?;
    eprintln!("\r\nConnection to {} closed.", info.host);
    Ok(())
}
