//! WebSocket transport.
//!
//! Each connection runs in its own tokio task. The task only moves bytes: it
//! writes queued frames to the socket and forwards everything it observes as
//! [`TransportEvent`]s on a shared channel. State lives in the
//! [`crate::ConnectionManager`], which is fed from that channel by the caller.

use std::collections::HashMap;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::transport::{ConnectionId, Transport, TransportError, TransportEvent};

/// Receiving half of a [`WsTransport`]'s event channel.
pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;

/// tokio-tungstenite backed [`Transport`].
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct WsTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    /// Outbound queues of live connection tasks. Dropping a queue ends its task.
    connections: HashMap<ConnectionId, mpsc::UnboundedSender<String>>,
}

impl WsTransport {
    /// Create a transport and the channel its events arrive on.
    pub fn new() -> (Self, TransportEvents) {
        if rustls::crypto::ring::default_provider().install_default().is_err() {
            tracing::trace!("crypto provider already installed");
        }

        let (events, rx) = mpsc::unbounded_channel();
        (Self { events, connections: HashMap::new() }, rx)
    }

    /// Number of connection tasks this transport still tracks.
    pub fn active_connections(&self) -> usize {
        self.connections.len()
    }
}

impl Transport for WsTransport {
    fn open(&mut self, connection: ConnectionId, url: &Url) -> Result<(), TransportError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Connection(format!("no async runtime: {e}")))?;

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        handle.spawn(run_connection(connection, url.clone(), outgoing_rx, self.events.clone()));
        self.connections.insert(connection, outgoing_tx);
        Ok(())
    }

    fn send_text(&mut self, connection: ConnectionId, frame: String) -> Result<(), TransportError> {
        let outgoing = self
            .connections
            .get(&connection)
            .ok_or_else(|| TransportError::Send(format!("unknown connection {connection}")))?;

        outgoing
            .send(frame)
            .map_err(|_| TransportError::Send(format!("connection {connection} has ended")))
    }

    fn close(&mut self, connection: ConnectionId) {
        if self.connections.remove(&connection).is_some() {
            tracing::debug!(%connection, "closing websocket");
        }
    }
}

fn emit(events: &mpsc::UnboundedSender<TransportEvent>, event: TransportEvent) {
    if events.send(event).is_err() {
        tracing::trace!("transport event receiver dropped");
    }
}

/// Drive one socket until it closes or its outbound queue is dropped.
async fn run_connection(
    connection: ConnectionId,
    url: Url,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let result = tokio::select! {
        result = connect_async(url.as_str()) => result,
        None = outgoing.recv() => {
            tracing::debug!(%connection, "connect cancelled");
            return;
        }
    };

    let stream = match result {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::warn!(%connection, %url, error = %e, "websocket connect failed");
            emit(&events, TransportEvent::Error { connection, message: e.to_string() });
            emit(&events, TransportEvent::Closed { connection, reason: None });
            return;
        },
    };

    tracing::debug!(%connection, "websocket handshake complete");
    emit(&events, TransportEvent::Opened { connection });

    let (mut write, mut read) = stream.split();

    let reason = loop {
        tokio::select! {
            frame = outgoing.recv() => {
                let Some(frame) = frame else {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        tracing::debug!(%connection, error = %e, "close frame not delivered");
                    }
                    return;
                };

                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    tracing::warn!(%connection, error = %e, "websocket write failed");
                    emit(&events, TransportEvent::Error { connection, message: e.to_string() });
                    break None;
                }
            }
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    emit(&events, TransportEvent::Text { connection, frame: text.as_str().to_owned() });
                },
                Some(Ok(Message::Close(frame))) => {
                    break frame
                        .map(|f| f.reason.as_str().to_owned())
                        .filter(|reason| !reason.is_empty());
                },
                Some(Ok(other)) => {
                    tracing::trace!(%connection, ?other, "ignoring non-text frame");
                },
                Some(Err(e)) => {
                    tracing::warn!(%connection, error = %e, "websocket read failed");
                    emit(&events, TransportEvent::Error { connection, message: e.to_string() });
                    break None;
                },
                None => break None,
            }
        }
    };

    tracing::debug!(%connection, ?reason, "websocket closed");
    emit(&events, TransportEvent::Closed { connection, reason });
}
