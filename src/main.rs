//! Joins the game server as a throwaway client and then leaves, so the
//! server sees a player disconnect.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

use raknet_autopause::{
    Session, SessionConfig,
    config::{self, DEFAULT_GAME_PORT, DEFAULT_LOG_FILE},
};

#[derive(Parser, Debug)]
#[command(name = "raknet-autopause")]
#[command(version)]
#[command(about = "Connect to the game server as a fake client, then disconnect", long_about = None)]
struct Args {
    /// Server password
    #[arg(env = "SERVER_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Game version string (read from the server log when omitted)
    version: Option<String>,

    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Server port
    #[arg(long, env = "GAME_PORT", default_value_t = DEFAULT_GAME_PORT)]
    port: u16,

    /// Server log used to detect the game version
    #[arg(long, env = "LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Seconds to stay connected before disconnecting
    #[arg(long, default_value_t = 10)]
    hold: u64,

    /// Player name presented to the server
    #[arg(long, default_value = raknet_autopause::protocol::constants::DEFAULT_PLAYER_NAME)]
    name: String,
}

fn resolve_version(args: &Args) -> Result<String> {
    if let Some(v) = args.version.as_deref().filter(|v| !v.trim().is_empty()) {
        return Ok(v.to_string());
    }
    match config::detect_version(&args.log_file) {
        Ok(Some(v)) => Ok(v),
        Ok(None) => bail!("could not detect game version in {}", args.log_file.display()),
        Err(e) => {
            warn!(path = %args.log_file.display(), error = %e, "server log unreadable");
            bail!("could not detect game version: {e}")
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let version = resolve_version(&args)?;
    let server = SocketAddr::new(args.host, args.port);

    info!(%server, %version, "connecting as fake client");

    let mut config = SessionConfig::new(server, version);
    config.password = args.password.clone();
    config.player_name = args.name.clone();
    config.hold_duration = Duration::from_secs(args.hold);

    let summary = Session::connect(config)
        .await
        .with_context(|| format!("session with {server} failed"))?;

    info!(
        frames_sent = summary.frames_sent,
        owner_connection_id = ?summary.owner_connection_id,
        "disconnected"
    );
    Ok(())
}
