//! CLI for holorelay
//!
//! Subcommands:
//! - `server`: run the relay with the console application
//! - `watch`: connect and print every frame the relay sends
//! - `send`: send one command frame (useful for smoke tests)

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use futures_util::{SinkExt, StreamExt};
use holorelay::application::ConsoleApplication;
use holorelay::config::load_config;
use holorelay::transport::ClientMessage;
use holorelay::transport::websocket::start_websocket_server;
use holorelay::{Relay, utils};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "holorelay")]
enum Command {
    /// Start the WebSocket relay
    Server,
    /// Print every frame received from a running relay
    Watch {
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
    },
    /// Send a single command to a running relay
    Send {
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
        command: CommandKind,
        /// Node name, required for `start-node`
        #[arg(long)]
        node: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CommandKind {
    Calibrate,
    StartNode,
    Quit,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    let result = match cmd {
        Command::Server => run_server().await,
        Command::Watch { url } => {
            utils::logging::init("info");
            run_watch(&url).await
        }
        Command::Send { url, command, node } => {
            utils::logging::init("info");
            run_send(&url, command, node).await
        }
    };

    if let Err(e) = result {
        // config may have failed before the subscriber was installed
        utils::logging::init("info");
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    utils::logging::init(&config.logging.level);

    let app = Arc::new(ConsoleApplication::new());
    let relay = Arc::new(Relay::with_application(app.clone()));

    let heartbeat = (config.application.heartbeat_secs > 0).then(|| {
        app.clone()
            .spawn_heartbeat(Duration::from_secs(config.application.heartbeat_secs))
    });

    let addr = config.server.addr();
    tokio::select! {
        result = start_websocket_server(&addr, relay.clone()) => {
            if let Err(e) = result {
                error!("WebSocket server stopped: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
        _ = app.quit_requested() => {
            info!("Application requested quit.");
        }
    }

    if let Some(heartbeat) = heartbeat {
        heartbeat.abort();
    }
    relay.close();
    if let Some(stats) = relay.join().await {
        info!(
            events = stats.events,
            broadcasts = stats.broadcasts,
            clients = stats.clients_at_shutdown,
            "relay stopped"
        );
    }

    Ok(())
}

async fn run_watch(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (mut ws_stream, _response) = connect_async(url).await?;
    info!("connected to {url}");

    while let Some(msg) = ws_stream.next().await {
        match msg? {
            WsMessage::Text(text) => println!("{text}"),
            WsMessage::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

async fn run_send(
    url: &str,
    command: CommandKind,
    node: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let message = match command {
        CommandKind::Calibrate => ClientMessage::CalibrateHoloLens,
        CommandKind::StartNode => ClientMessage::StartNode {
            name: node.ok_or("--node is required for start-node")?,
        },
        CommandKind::Quit => ClientMessage::QuitApplication,
    };

    let (mut ws_stream, _response) = connect_async(url).await?;

    // The relay greets every connection first.
    if let Some(Ok(WsMessage::Text(greeting))) = ws_stream.next().await {
        println!("{greeting}");
    }

    let text = serde_json::to_string(&message)?;
    ws_stream.send(WsMessage::Text(text.into())).await?;
    ws_stream.close(None).await?;
    Ok(())
}
