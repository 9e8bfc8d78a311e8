// SPDX-License-Identifier: MIT

//! Unix-socket accept loop: each connection reads one length-prefixed
//! request, dispatches it through [`Handler`], and writes back one response.

use crate::handler::Handler;
use crate::wire::{self, DEFAULT_TIMEOUT};
use aac_core::{Clock, IdGen};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

pub struct Server<C: Clock, G: IdGen> {
    socket: UnixListener,
    handler: Arc<Handler<C, G>>,
}

impl<C: Clock, G: IdGen> Server<C, G> {
    pub fn new(socket: UnixListener, handler: Arc<Handler<C, G>>) -> Self {
        Self { socket, handler }
    }

    /// Accept connections forever, spawning a task per connection so one
    /// slow client never blocks the others.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _addr)) => {
                    let handler = Arc::clone(&self.handler);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, &handler).await {
                            match err {
                                wire::WireError::ConnectionClosed => debug!("client disconnected"),
                                wire::WireError::Timeout => warn!("connection timed out"),
                                other => error!(error = %other, "connection error"),
                            }
                        }
                    });
                }
                Err(err) => error!(error = %err, "accept error"),
            }
        }
    }
}

async fn handle_connection<C: Clock, G: IdGen>(stream: UnixStream, handler: &Handler<C, G>) -> Result<(), wire::WireError> {
    let (mut reader, mut writer) = stream.into_split();
    let request = wire::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
    let response = handler.handle(request);
    wire::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await
}
