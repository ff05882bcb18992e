//! Veil Player (veil-player) - stdio bridge
//!
//! Runs one player session and speaks newline-delimited JSON, so any host
//! (a browser extension's native-messaging shim, a WebView, a test script)
//! can drive it.
//!
//! stdin, one object per line:
//! - `{"origin": "...", "data": ...}` message received from the widget frame
//! - `{"input": {...}}` DOM-derived input event
//! - `{"next": {"source": "...", "label": "..."}}` item to chain after the
//!   current one
//!
//! stdout, one object per line:
//! - messages to post into the widget frame (`"event": "command" | "listening"`)
//! - host callbacks (`"callback": ...`)
//! - `{"disposition": ...}` for every input line
//! - `{"view": ...}` frames when `--emit-view` is set

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veil_common::config::PlayerConfig;
use veil_player::channel::ChannelSink;
use veil_player::controls::HostManagedFullscreen;
use veil_player::host::ChannelHost;
use veil_player::input::InputEvent;
use veil_player::source::NextSource;
use veil_player::{mount, Mount, MountOptions, PlayerIo};

/// Command-line arguments for veil-player
#[derive(Parser, Debug)]
#[command(name = "veil-player")]
#[command(about = "Embedded video control layer (stdio bridge)")]
#[command(version)]
struct Args {
    /// Video id or URL to play
    #[arg(short, long)]
    source: String,

    /// Video id or URL to offer on the end screen
    #[arg(long)]
    next: Option<String>,

    /// End-screen label for the next item
    #[arg(long, requires = "next")]
    next_label: Option<String>,

    /// Config file (TOML)
    #[arg(short, long, env = "VEIL_CONFIG")]
    config: Option<PathBuf>,

    /// Viewer id or email rendered (masked) into the watermark
    #[arg(long, env = "VEIL_VIEWER")]
    viewer: Option<String>,

    /// Additional accepted widget origin (repeatable)
    #[arg(long = "origin")]
    origins: Vec<String>,

    /// Write a view frame to stdout whenever it changes
    #[arg(long)]
    emit_view: bool,

    /// Fixed watermark seed
    #[arg(long)]
    seed: Option<u64>,
}

/// One stdin line
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BridgeLine {
    Widget { origin: String, data: Value },
    Input { input: InputEvent },
    Next { next: NextLine },
}

#[derive(Debug, Deserialize)]
struct NextLine {
    source: String,
    #[serde(default)]
    label: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        PlayerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing (stderr; stdout carries the protocol)
    let default_filter = format!(
        "veil_player={0},veil_common={0}",
        config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Veil Player bridge for {}", args.source);
    match &args.config {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: default search path"),
    }

    config.allowed_origins.extend(args.origins.iter().cloned());

    let (sink, mut outbound_rx) = ChannelSink::new();
    let (host, mut host_rx) = ChannelHost::new();
    let options = MountOptions {
        source: args.source.clone(),
        next_source: args.next.clone(),
        next_label: args.next_label.clone(),
        viewer: args.viewer.clone(),
        config,
        seed: args.seed,
    };
    let io = PlayerIo {
        sink: Box::new(sink),
        host: Box::new(host),
        fullscreen: Box::new(HostManagedFullscreen),
    };

    let mut stdout = tokio::io::stdout();

    let mut session = match mount(options, io) {
        Mount::Player(session) => session,
        Mount::Unavailable(placeholder) => {
            emit(&mut stdout, &json!({ "placeholder": placeholder })).await?;
            return Ok(());
        }
    };
    info!("Session {} mounted", session.id());

    let mut views = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("stdin closed, shutting down");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<BridgeLine>(&line) {
                    Ok(BridgeLine::Widget { origin, data }) => {
                        session.deliver(origin, data).context("Session closed")?;
                    }
                    Ok(BridgeLine::Input { input }) => {
                        let disposition = session.input(input).await.context("Session closed")?;
                        emit(&mut stdout, &json!({ "disposition": disposition })).await?;
                    }
                    Ok(BridgeLine::Next { next }) => match NextSource::parse(&next.source, next.label) {
                        Ok(next) => session.set_next(Some(next)).context("Session closed")?,
                        Err(e) => warn!("Ignoring next source: {}", e),
                    },
                    Err(e) => warn!("Ignoring unreadable line: {}", e),
                }
            }
            Some(message) = outbound_rx.recv() => {
                emit(&mut stdout, &message).await?;
            }
            Some(event) = host_rx.recv() => {
                emit(&mut stdout, &event).await?;
            }
            changed = views.changed(), if args.emit_view => {
                if changed.is_err() {
                    debug!("View channel closed");
                    break;
                }
                let view = views.borrow_and_update().clone();
                emit(&mut stdout, &json!({ "view": view })).await?;
            }
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    session.teardown().await;

    // Flush whatever the session produced before it stopped
    while let Ok(message) = outbound_rx.try_recv() {
        emit(&mut stdout, &message).await?;
    }
    while let Ok(event) = host_rx.try_recv() {
        emit(&mut stdout, &event).await?;
    }

    info!("Bridge shutdown complete");
    Ok(())
}

/// Write one JSON line to stdout
async fn emit<T: Serialize>(stdout: &mut Stdout, value: &T) -> Result<()> {
    let mut line = serde_json::to_vec(value).context("Failed to encode output")?;
    line.push(b'\n');
    stdout
        .write_all(&line)
        .await
        .context("Failed to write stdout")?;
    stdout.flush().await.context("Failed to flush stdout")?;
    Ok(())
}
