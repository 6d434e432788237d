//! Gridfront RTS - Dedicated Server
//!
//! Bridges one local peer over stdin/stdout: each input line is one JSON
//! action, each output line is one action routed to that peer.

use std::path::PathBuf;

use clap::Parser;
use rts_core::protocol::Action;
use rts_server::{Hub, ServerConfig, ServerError, ServerGame, SharedServer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rts_server", about = "Gridfront RTS authoritative server", version)]
struct Args {
    /// Server config file (RON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the terrain seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Override the tick rate (Hz).
    #[arg(long)]
    tick_rate: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Logs go to stderr; stdout carries actions.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world_seed = seed;
    }
    if let Some(tick_rate) = args.tick_rate {
        config.tick_rate = tick_rate;
    }
    config.validate()?;

    tracing::info!(
        seed = config.world_seed,
        tick_rate = config.tick_rate,
        max_players = config.max_players,
        "Starting Gridfront RTS Dedicated Server"
    );

    let tick_rate = config.tick_rate;
    let server = SharedServer::new(ServerGame::with_procedural_world(config));
    let hub = Hub::start(server, tick_rate);
    let (sender, mut outbound) = hub.connect().into_split();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(action) = outbound.recv().await {
            let line = action.to_json_line()?;
            stdout.write_all(line.as_bytes()).await?;
            stdout.flush().await?;
        }
        Ok::<(), ServerError>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Action::from_json(&line) {
            Ok(action) => sender.send(action)?,
            Err(err) => {
                // Fatal to this connection only.
                tracing::error!(%err, "undecodable action, closing bridge");
                break;
            }
        }
    }

    tracing::info!("input closed, shutting down");
    hub.shutdown();
    match writer.await {
        Ok(result) => result,
        Err(err) if err.is_cancelled() => Ok(()),
        Err(err) => Err(std::io::Error::other(err).into()),
    }
}
