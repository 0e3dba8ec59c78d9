// SPDX-License-Identifier: MIT

//! Publish endpoint: each connection first sends the topic prefix it wants,
//! then receives every `Envelope` whose topic matches that prefix as two
//! length-prefixed frames, `(topic, json-payload)`, for as long as the
//! connection stays open.

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use warden_core::Envelope;

use crate::event_bus::EventBus;
use crate::protocol::{self, ProtocolError};

pub struct PublishListener {
    socket: UnixListener,
    bus: EventBus,
}

impl PublishListener {
    pub fn new(socket: UnixListener, bus: EventBus) -> Self {
        Self { socket, bus }
    }

    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let rx = self.bus.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = handle_subscriber(stream, rx).await {
                            match e {
                                ProtocolError::ConnectionClosed => debug!("subscriber disconnected"),
                                other => error!("publish connection error: {}", other),
                            }
                        }
                    });
                }
                Err(e) => error!("publish accept error: {}", e),
            }
        }
    }
}

async fn handle_subscriber(stream: UnixStream, mut rx: broadcast::Receiver<Envelope>) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    let prefix_bytes = protocol::read_message(&mut reader).await?;
    let prefix = String::from_utf8_lossy(&prefix_bytes).into_owned();
    debug!(%prefix, "subscriber registered");

    loop {
        let envelope = match rx.recv().await {
            Ok(envelope) => envelope,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "publish subscriber fell behind, dropping buffered events");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        };

        if !envelope.topic.matches_prefix(&prefix) {
            continue;
        }

        let topic_frame = envelope.topic.to_string().into_bytes();
        let payload_frame = protocol::encode(&envelope)?;
        protocol::write_message(&mut writer, &topic_frame).await?;
        protocol::write_message(&mut writer, &payload_frame).await?;
    }
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
