use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::{SharedState, game::PlayerId},
};

/// Identifies the target SSE stream so the forwarder knows which events to pass on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    /// Leaderboard changes and closure notices only.
    Public,
    /// Public events plus the effects addressed to one player.
    Player(PlayerId),
}

impl StreamKind {
    fn audience(self) -> Option<PlayerId> {
        match self {
            StreamKind::Public => None,
            StreamKind::Player(player_id) => Some(player_id),
        }
    }

    fn label(self) -> &'static str {
        match self {
            StreamKind::Public => "public",
            StreamKind::Player(_) => "player",
        }
    }
}

/// Subscribe to the shared event hub.
pub fn subscribe(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.events().subscribe()
}

/// First event sent to a freshly connected client.
pub fn handshake(state: &SharedState, kind: StreamKind) -> Option<ServerEvent> {
    let payload = Handshake {
        stream: kind.label().to_string(),
        message: format!("{} stream connected", kind.label()),
        closed: state.gate().is_closed(),
    };
    ServerEvent::json(kind.audience(), Some("handshake".to_string()), &payload)
        .inspect_err(|err| warn!(error = %err, "failed to serialize handshake"))
        .ok()
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a broadcast receiver into an SSE response, forwarding the events visible to `kind`
/// until the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
    greeting: Option<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);
    let audience = kind.audience();

    tokio::spawn(async move {
        if let Some(greeting) = greeting
            && tx.send(Ok(to_event(greeting))).await.is_err()
        {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if !payload.is_visible_to(audience) {
                                continue;
                            }
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, stream = kind.label(), "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        match kind {
            StreamKind::Public => info!("public SSE stream disconnected"),
            StreamKind::Player(player_id) => info!(player_id, "player SSE stream disconnected"),
        }
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
