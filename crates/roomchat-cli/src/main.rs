//! roomchat entry point.

use clap::Parser;
use roomchat_cli::{Runtime, SystemEnv, TerminalDriver};
use roomchat_client::ClientConfig;
use roomchat_core::{ConnectionConfig, ReconnectPolicy, connection::DEFAULT_MAX_ATTEMPTS};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Room-based chat client
#[derive(Parser, Debug)]
#[command(name = "roomchat")]
#[command(about = "Line-oriented client for room-based chat servers")]
#[command(version)]
struct Args {
    /// WebSocket URL of the chat server
    #[arg(short, long, default_value = "ws://127.0.0.1:4000/ws")]
    server: String,

    /// Log filter, used when `RUST_LOG` is unset
    #[arg(long, default_value = "warn")]
    log_filter: String,

    /// Reconnect attempts after an unplanned drop (0 disables reconnects)
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_reconnect_attempts: u32,

    /// Do not rejoin the last room after reconnecting
    #[arg(long)]
    no_resume: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so they never interleave with chat lines on stdout
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let reconnect =
        ReconnectPolicy { max_attempts: args.max_reconnect_attempts, ..ReconnectPolicy::default() };
    let config = ClientConfig {
        connection: ConnectionConfig::with_reconnect(reconnect),
        resume_on_reconnect: !args.no_resume,
        ..ClientConfig::default()
    };

    tracing::info!(server = %args.server, "roomchat starting");

    let driver = TerminalDriver::new().with_connect_timeout(config.connection.connect_timeout);
    let runtime = Runtime::new(driver, SystemEnv::new(), config, args.server);
    Ok(runtime.run().await?)
}
