use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, LevelFilter};

use gdbmock::debugger::{GdbServer, ServerConfig, DEFAULT_PORT};
use gdbmock::Script;

/// Serve a scripted GDB remote session over TCP
#[derive(Debug, Parser)]
#[command(name = "gdbmock", version, about)]
struct Cli {
    /// JSON script with the scripted stops and memory blobs
    #[arg(short, long)]
    script: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Exit after the first session
    #[arg(long)]
    once: bool,

    /// Accept connections from non-loopback addresses
    #[arg(long)]
    allow_remote: bool,

    /// Log every packet
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let script = Script::load(&cli.script)
        .with_context(|| format!("failed to load script {}", cli.script.display()))?;

    let server = GdbServer::bind(ServerConfig {
        host: cli.host,
        port: cli.port,
        allow_remote: cli.allow_remote,
    })?;

    if let Err(e) = server.serve(&script, cli.once) {
        error!("{}", e);
        let context = if e.is_fixture_error() {
            "script does not match the session the client drove"
        } else {
            "listener failed"
        };
        return Err(e).context(context);
    }

    Ok(())
}
