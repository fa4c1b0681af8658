//! chanlog Binary
//!
//! Connects to an IRC server, joins channels and archives their activity.

use std::path::{Path, PathBuf};

use chanlog::listener::{open_log, ChannelLogger, Listener};
use chanlog::{Command, Config, Connection, Disconnect};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// chanlog IRC archiver
#[derive(Parser, Debug)]
#[command(name = "chanlog")]
#[command(about = "Archive IRC channel activity to log files")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    server: String,

    /// Nickname to register with
    nick: String,

    /// Channels to join and log (the leading # may be omitted)
    #[arg(required = true)]
    channels: Vec<String>,

    /// Directory the channel logs are written to
    #[arg(short, long, default_value = ".")]
    log_dir: PathBuf,

    /// Real name sent with USER
    #[arg(short, long, default_value = "chanlog IRC archiver")]
    realname: String,

    /// Per-listener mailbox capacity
    #[arg(short, long, default_value = "16")]
    capacity: usize,
}

/// Logs every inbound command with its arguments
struct TraceListener;

impl Listener for TraceListener {
    fn name(&self) -> &str {
        "trace"
    }

    fn handle(&mut self, command: &Command) -> chanlog::Result<()> {
        tracing::debug!("{}", command);
        for (index, arg) in command.args.iter().enumerate() {
            tracing::debug!("  {}. {}", index, arg);
        }
        Ok(())
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chanlog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("chanlog v{}", chanlog::VERSION);
    tracing::info!("Server: {}", args.server);
    tracing::info!("Log directory: {}", args.log_dir.display());

    let config = Config::builder()
        .server_addr(&args.server)
        .nick(&args.nick)
        .username(local_username())
        .realname(&args.realname)
        .mailbox_capacity(args.capacity)
        .build();

    let connection = Connection::new(config);

    if let Err(e) = connection.attach(TraceListener) {
        tracing::warn!("Failed to start trace listener: {}", e);
    }

    if let Err(e) = connection.connect() {
        tracing::error!("Failed to connect: {}", e);
        std::process::exit(1);
    }

    for channel in args.channels.iter().map(|c| normalize_channel(c)) {
        if let Err(e) = join_and_log(&connection, &channel, &args.log_dir) {
            tracing::error!("Failed to set up {}: {}", channel, e);
        }
    }

    match connection.wait() {
        Disconnect::ReadFailed { message, .. } => {
            tracing::error!("Connection lost: {}", message);
            std::process::exit(1);
        }
        reason => tracing::info!("Connection closed: {:?}", reason),
    }
}

/// Attach a logger for `channel`, then join it
///
/// The logger goes first so our own JOIN echo is recorded.
fn join_and_log(connection: &Connection, channel: &str, log_dir: &Path) -> chanlog::Result<()> {
    let path = log_dir.join(format!("{}.log", channel.trim_start_matches('#')));
    let file = open_log(&path)?;

    connection.attach(ChannelLogger::new(channel, file))?;
    tracing::info!("Logging {} to {}", channel, path.display());

    connection.send(&Command::join(channel))
}

/// Channels given without a prefix get one, since `#` needs quoting in most shells
fn normalize_channel(channel: &str) -> String {
    if channel.starts_with('#') {
        channel.to_string()
    } else {
        format!("#{}", channel)
    }
}

fn local_username() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.is_empty() && !name.contains(' '))
        .unwrap_or_else(|| {
            tracing::warn!("Could not determine local username, using \"unknown\"");
            "unknown".to_string()
        })
}
