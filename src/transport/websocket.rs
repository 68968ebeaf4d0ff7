//! WebSocket transport
//!
//! Accepts TCP connections, upgrades them, and wires each one to the
//! [`Relay`]:
//! - a writer task drains the connection's outbound channel into the socket
//! - the reader loop feeds every text frame to [`Relay::on_message`]
//! - open and close are reported through [`Relay::on_open`] and
//!   [`Relay::on_close`]
//!
//! The strong [`ClientHandle`] lives in the connection task. When the reader
//! loop ends the handle is dropped, which closes the channel and lets the
//! writer task finish.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::Relay;
use crate::client::ClientHandle;
use crate::utils::RelayError;

/// Bind `addr` and serve connections until the listener fails.
pub async fn start_websocket_server(addr: &str, relay: Arc<Relay>) -> Result<(), RelayError> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, relay).await
}

/// Serve connections from an already bound listener.
pub async fn serve(listener: TcpListener, relay: Arc<Relay>) -> Result<(), RelayError> {
    info!(addr = %listener.local_addr()?, "WebSocket server listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let relay = relay.clone();
        tokio::spawn(async move {
            handle_connection(stream, peer, relay).await;
        });
    }
}

/// Run one connection from handshake to close.
pub async fn handle_connection<S>(stream: S, peer: SocketAddr, relay: Arc<Relay>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake error");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = ClientHandle::new(tx);
    let client_id = client.id();

    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                warn!(%client_id, error = %e, "failed to write to socket");
                break;
            }
        }
        let _ = ws_sender.close().await;
        debug!(%client_id, "send loop closed");
    });

    debug!(%client_id, %peer, "connection upgraded");
    relay.on_open(&client);

    let reason = loop {
        match ws_receiver.next().await {
            Some(Ok(WsMessage::Text(text))) => relay.on_message(&client, Some(text.as_str())),
            Some(Ok(WsMessage::Close(frame))) => {
                break frame
                    .map(|f| format!("{} {}", u16::from(f.code), f.reason.as_str()))
                    .unwrap_or_else(|| "closed by peer".to_string());
            }
            Some(Ok(WsMessage::Binary(_))) => {
                debug!(%client_id, "ignoring binary frame");
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => break e.to_string(),
            None => break "stream ended".to_string(),
        }
    };

    relay.on_close(&client, &reason);
}
