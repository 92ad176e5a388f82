use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use periscope::model::IceServerConfig;
use periscope::utils::DEFAULT_SIGNALING_ENDPOINT;
use periscope::viewer::{ReconnectPolicy, ViewerConfig, ViewerEvent, ViewerSession};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "periscope", version, about = "Watch live broadcasts from the terminal")]
struct Cli {
    /// Signaling server (http, https, ws or wss URL).
    #[arg(long, env = "PERISCOPE_WS_URL", default_value = DEFAULT_SIGNALING_ENDPOINT)]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a stream and report what arrives until Ctrl-C.
    Watch {
        /// Stream id; prompted for when omitted.
        #[arg(short, long)]
        stream: Option<String>,

        /// STUN/TURN URLs replacing the default public STUN servers.
        #[arg(long)]
        stun: Vec<String>,

        /// Seconds to wait for media after joining; 0 waits forever.
        #[arg(long, default_value_t = 30)]
        negotiation_timeout: u64,

        #[arg(long, default_value_t = 5)]
        reconnect_attempts: u32,

        /// Join the stream again after the signaling connection recovers.
        #[arg(long)]
        rejoin: bool,
    },

    /// Check that the signaling server accepts connections.
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            stream,
            stun,
            negotiation_timeout,
            reconnect_attempts,
            rejoin,
        } => {
            let mut config = ViewerConfig::new(cli.endpoint)
                .with_reconnect(ReconnectPolicy {
                    max_attempts: reconnect_attempts,
                    ..ReconnectPolicy::default()
                })
                .with_negotiation_timeout(
                    (negotiation_timeout > 0).then(|| Duration::from_secs(negotiation_timeout)),
                )
                .with_rejoin_on_reconnect(rejoin);
            if !stun.is_empty() {
                config = config.with_ice_servers(vec![IceServerConfig::stun(stun)]);
            }

            let stream_id = match stream {
                Some(id) => id,
                None => Input::<String>::new()
                    .with_prompt("Stream id")
                    .interact_text()
                    .context("No stream id given")?,
            };

            watch(config, stream_id).await?;
        }
        Commands::Ping => {
            let config = ViewerConfig::new(cli.endpoint);
            let url = config.websocket_url()?;
            let viewer = ViewerSession::new(config);

            println!("{}", format!("📡 Connecting to {}...", url).cyan());
            viewer
                .initialize()
                .await
                .context("Signaling server unreachable")?;
            viewer.disconnect().await;
            println!("{}", "✔ Signaling server is reachable".green().bold());
        }
    }

    Ok(())
}

async fn watch(config: ViewerConfig, stream_id: String) -> Result<()> {
    let rejoin = config.rejoin_on_reconnect;
    let url = config.websocket_url()?;
    let viewer = ViewerSession::new(config);
    let mut events = viewer.subscribe();

    println!("{}", format!("📡 Connecting to {}...", url).cyan());
    viewer
        .initialize()
        .await
        .context("Failed to connect to the signaling server")?;

    viewer.join_stream(stream_id.as_str()).await?;
    println!("{}", format!("🎬 Joining stream '{}'", stream_id).cyan());

    let mut failure = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "👋 Leaving stream".yellow());
                break;
            }

            event = events.recv() => match event {
                Ok(ViewerEvent::Stream { stream_id, stream }) => {
                    let tracks = stream.tracks().await;
                    println!(
                        "{}",
                        format!("▶ Receiving '{}' ({} track(s))", stream_id, tracks.len())
                            .green()
                            .bold()
                    );
                    for track in tracks {
                        println!("   {} {}", track.kind(), track.id());
                    }
                }
                Ok(ViewerEvent::ViewerCount { count, .. }) => {
                    println!("👀 {} watching", count);
                }
                Ok(ViewerEvent::Disconnected { stream_id }) => {
                    println!("{}", format!("⏹ Stream '{}' disconnected", stream_id).yellow());
                    if !(rejoin && !viewer.snapshot().transport_ready) {
                        break;
                    }
                    println!("{}", "⏳ Waiting for the signaling server...".cyan());
                }
                Ok(ViewerEvent::Error { message, .. }) => {
                    eprintln!("{}", format!("✖ {}", message).red().bold());
                    failure = Some(message);
                    break;
                }
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} viewer events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    }

    viewer.disconnect().await;

    match failure {
        Some(message) => anyhow::bail!(message),
        None => Ok(()),
    }
}
