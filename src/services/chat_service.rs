//! Chat transport over WebSocket: one connection per player, commands processed one at a time.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::{ChatCommand, ChatInboundMessage, ChatOutboundMessage},
    error::ServiceError,
    services::{admin_service, leaderboard_service, public_service, session_service},
    state::{SharedState, game::PlayerId},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Writer channel closed; the connection should be torn down.
#[derive(Debug, Error)]
#[error("connection closed")]
struct ConnectionClosed;

/// Identity established by the first message of a connection.
struct ChatPlayer {
    player_id: PlayerId,
    display_name: String,
    admin: bool,
}

/// Handle the full lifecycle of one chat WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let player = match ChatInboundMessage::from_json_str(&initial_message) {
        Ok(ChatInboundMessage::Identification {
            player_id,
            display_name,
            admin_token,
        }) => ChatPlayer {
            player_id,
            display_name,
            admin: admin_service::authorize(&state, admin_token.as_deref()).is_ok(),
        },
        Ok(_) => {
            warn!("first chat message was not identification");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Err(err) => {
            warn!(error = %err, "failed to parse or validate chat message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let player_id = player.player_id;
    info!(player_id, admin = player.admin, "chat player connected");

    let events_task = spawn_event_forwarder(&state, player_id, outbound_tx.clone());
    let welcome = ChatOutboundMessage::Welcome {
        player_id,
        admin: player.admin,
    };

    if send_message(&outbound_tx, &welcome).is_ok() {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    debug!(player_id, payload = %text, "received chat message");
                    let reply = handle_text(&state, &player, text.as_str()).await;
                    if let Some(reply) = reply
                        && send_message(&outbound_tx, &reply).is_err()
                    {
                        info!(player_id, "connection closed while replying, terminating");
                        break;
                    }
                }
                Ok(Message::Ping(payload)) => {
                    let _ = outbound_tx.send(Message::Pong(payload));
                }
                Ok(Message::Close(frame)) => {
                    let _ = outbound_tx.send(Message::Close(frame));
                    break;
                }
                Ok(Message::Binary(_)) => {}
                Ok(Message::Pong(_)) => {}
                Err(err) => {
                    warn!(player_id, error = %err, "websocket error");
                    break;
                }
            }
        }
    }

    events_task.abort();
    let _ = events_task.await;
    info!(player_id, "chat player disconnected");

    finalize(writer_task, outbound_tx).await;
}

async fn handle_text(
    state: &SharedState,
    player: &ChatPlayer,
    text: &str,
) -> Option<ChatOutboundMessage> {
    match ChatInboundMessage::from_json_str(text) {
        Ok(ChatInboundMessage::Command { text }) => match text.parse::<ChatCommand>() {
            Ok(command) => handle_command(state, player, command).await,
            Err(err) => Some(error_message("unknown_command", err.to_string())),
        },
        Ok(ChatInboundMessage::Pick { symbol }) => {
            handle_command(state, player, ChatCommand::Pick(symbol)).await
        }
        Ok(ChatInboundMessage::Identification { .. }) => {
            warn!(
                player_id = player.player_id,
                "ignoring duplicate identification message"
            );
            None
        }
        Ok(ChatInboundMessage::Unknown) => {
            warn!(player_id = player.player_id, "ignoring unknown chat message type");
            None
        }
        Err(err) => Some(error_message("malformed", err.to_string())),
    }
}

/// Run one chat command and build the direct reply. Effects that arrive later, like the prompt
/// after a reveal, come through the event forwarder instead.
async fn handle_command(
    state: &SharedState,
    player: &ChatPlayer,
    command: ChatCommand,
) -> Option<ChatOutboundMessage> {
    match command {
        ChatCommand::Start => Some(ChatOutboundMessage::Rules {
            rules: public_service::rules(state),
        }),
        ChatCommand::Play => Some(
            match session_service::start_session(state, player.player_id, &player.display_name)
                .await
            {
                Ok(play) => ChatOutboundMessage::Effects {
                    effects: play.effects,
                },
                Err(err) => report_error(err),
            },
        ),
        ChatCommand::Pick(symbol) => Some(
            match session_service::submit_choice(state, player.player_id, &symbol).await {
                Ok(choice) => ChatOutboundMessage::Effects {
                    effects: choice.effects,
                },
                Err(err) => report_error(err),
            },
        ),
        ChatCommand::Leaderboard => Some(ChatOutboundMessage::Leaderboard {
            leaderboard: leaderboard_service::top_n(state, None).await,
        }),
        ChatCommand::MyStats => Some(ChatOutboundMessage::Stats {
            stats: leaderboard_service::player_stats(
                state,
                player.player_id,
                Some(&player.display_name),
            )
            .await,
        }),
        ChatCommand::Results => Some(ChatOutboundMessage::Results {
            results: leaderboard_service::results(state).await,
        }),
        ChatCommand::Close if player.admin => Some(ChatOutboundMessage::Closed {
            close: admin_service::close_game(state),
        }),
        ChatCommand::Close => {
            warn!(player_id = player.player_id, "close refused: not an administrator");
            Some(report_error(ServiceError::Unauthorized(
                "only administrators may close the game".into(),
            )))
        }
    }
}

fn report_error(err: ServiceError) -> ChatOutboundMessage {
    error_message(err.kind(), err.to_string())
}

fn error_message(kind: &str, message: String) -> ChatOutboundMessage {
    ChatOutboundMessage::Error {
        kind: kind.to_string(),
        message,
    }
}

/// Relay hub events visible to `player_id` onto the socket.
fn spawn_event_forwarder(
    state: &SharedState,
    player_id: PlayerId,
    tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    let mut receiver = state.events().subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if event.replied || !event.is_visible_to(Some(player_id)) {
                        continue;
                    }
                    let Some(name) = event.event else {
                        continue;
                    };
                    let data = match serde_json::from_str(&event.data) {
                        Ok(data) => data,
                        Err(err) => {
                            warn!(player_id, error = %err, "hub event is not valid JSON");
                            continue;
                        }
                    };
                    let message = ChatOutboundMessage::Event { event: name, data };
                    if send_message(&tx, &message).is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(player_id, skipped, "chat event forwarder lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Serialize a payload and push it onto the writer channel.
///
/// Serialization failures are logged and swallowed; only a closed writer is reported.
fn send_message(
    tx: &mpsc::UnboundedSender<Message>,
    value: &ChatOutboundMessage,
) -> Result<(), ConnectionClosed> {
    let payload = match serde_json::to_string(value) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize chat message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| ConnectionClosed)
}

async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::game::{GameEffect, OutcomeReport},
        state::AppState,
    };

    fn player(admin: bool) -> ChatPlayer {
        ChatPlayer {
            player_id: 5,
            display_name: "Zoe".into(),
            admin,
        }
    }

    #[tokio::test]
    async fn start_command_replies_with_rules() {
        let state = AppState::new(AppConfig::default());
        let reply = handle_text(&state, &player(false), r#"{"type":"command","text":"/start"}"#)
            .await;
        assert!(matches!(reply, Some(ChatOutboundMessage::Rules { .. })));
    }

    #[tokio::test]
    async fn close_requires_admin() {
        let state = AppState::new(AppConfig::default());
        let reply = handle_command(&state, &player(false), ChatCommand::Close).await;
        assert!(matches!(
            reply,
            Some(ChatOutboundMessage::Error { ref kind, .. }) if kind == "unauthorized"
        ));
        assert!(!state.gate().is_closed());

        let reply = handle_command(&state, &player(true), ChatCommand::Close).await;
        assert!(matches!(reply, Some(ChatOutboundMessage::Closed { .. })));
        assert!(state.gate().is_closed());
    }

    #[tokio::test]
    async fn pick_without_session_reports_error() {
        let state = AppState::new(AppConfig::default());
        let reply = handle_text(&state, &player(false), r#"{"type":"pick","symbol":"🔴"}"#).await;
        assert!(matches!(
            reply,
            Some(ChatOutboundMessage::Error { ref kind, .. }) if kind == "no_active_session"
        ));
    }

    #[tokio::test]
    async fn refused_play_is_answered_directly() {
        let state = AppState::new(AppConfig::default());
        state.gate().close();
        let mut events = state.events().subscribe();

        let reply = handle_command(&state, &player(false), ChatCommand::Play).await;
        assert!(matches!(
            reply,
            Some(ChatOutboundMessage::Error { ref kind, .. }) if kind == "game_closed"
        ));

        let event = events.recv().await.unwrap();
        assert_eq!(event.player, Some(5));
        assert!(event.replied);
        assert!(event.data.contains("game_closed"));
    }

    #[tokio::test(start_paused = true)]
    async fn picks_are_answered_directly_and_prompts_forwarded() {
        let state = AppState::new(AppConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let forwarder = spawn_event_forwarder(&state, 5, tx);

        let reply = handle_command(&state, &player(false), ChatCommand::Play).await;
        let Some(ChatOutboundMessage::Effects { effects }) = reply else {
            panic!("expected play effects");
        };
        let [GameEffect::RenderSequence { symbols, .. }] = &effects[..] else {
            panic!("expected the sequence");
        };
        let first = symbols[0].clone();

        sleep(state.rules().reveal_duration + Duration::from_millis(10)).await;
        let Some(Message::Text(text)) = rx.recv().await else {
            panic!("expected a forwarded prompt");
        };
        assert!(text.as_str().contains("render_prompt"));

        let reply = handle_command(&state, &player(false), ChatCommand::Pick(first)).await;
        let Some(ChatOutboundMessage::Effects { effects }) = reply else {
            panic!("expected pick effects");
        };
        assert_eq!(
            effects[0],
            GameEffect::outcome(OutcomeReport::Correct {
                position: 1,
                total: 3
            })
        );
        assert!(matches!(effects[1], GameEffect::RenderPrompt { position: 2, .. }));

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        forwarder.abort();
    }

    #[tokio::test]
    async fn unknown_command_is_reported() {
        let state = AppState::new(AppConfig::default());
        let reply = handle_text(&state, &player(false), r#"{"type":"command","text":"/dance"}"#)
            .await;
        assert!(matches!(
            reply,
            Some(ChatOutboundMessage::Error { ref kind, .. }) if kind == "unknown_command"
        ));
    }
}
